//! The game state aggregate root.
//!
//! Everything the simulation mutates lives here: the resource ledger, the
//! people world, the runtime building and qualification catalogs, the station
//! layout, event progress, quest flags and timers and the transient message
//! log. Systems take `&mut GameState` and mutate it in place.

use std::collections::BTreeMap;
use std::sync::Arc;

use hecs::World;
use indexmap::IndexMap;
use rand::Rng;

use crate::components::*;
use crate::config::{BuildingType, GameConfig, Qualification, POPULATION};
use crate::generation::generate_people;
use crate::systems::{recalc_maximums, ActiveEventPopup, GameEventState, ResourceLedger};

pub struct GameState {
    /// Static definitions this state was created from
    pub config: Arc<GameConfig>,
    pub resources: ResourceLedger,
    /// People, one entity each
    pub world: World,
    /// Runtime qualification catalog, keyed by code
    pub qualifications: IndexMap<String, Qualification>,
    /// Runtime building catalog, keyed by id. Unlocks flip `enabled` here.
    pub building_types: IndexMap<String, BuildingType>,
    pub grid: Grid,
    pub modules: Vec<Module>,
    /// Event catalog in priority order with trigger progress
    pub events: Vec<GameEventState>,
    pub quest_flags: BTreeMap<String, i64>,
    pub quest_timers: BTreeMap<String, i64>,
    pub active_event: Option<ActiveEventPopup>,
    pub selected_building_type: Option<String>,
    pub paused: bool,
    pub ticks: u64,
    pub days: u64,
    /// Transient log, drained by the presentation layer
    pub messages: Vec<String>,
    pub module_ids: IdSequence,
    pub person_ids: IdSequence,
}

impl GameState {
    /// Fresh game with the configured number of starting residents.
    pub fn new(config: Arc<GameConfig>, rng: &mut impl Rng) -> Self {
        let mut state = Self::empty(config);
        let pool = state.enabled_qualification_codes();
        let config = Arc::clone(&state.config);
        generate_people(
            &mut state.world,
            &mut state.person_ids,
            config.starting_people,
            &config.person_template,
            &pool,
            rng,
        );
        state.sync_population();
        state
    }

    /// A state with no people and no modules.
    pub fn empty(config: Arc<GameConfig>) -> Self {
        let resources = ResourceLedger::from_config(&config.resources);
        let qualifications = config
            .qualifications
            .iter()
            .map(|q| (q.code.clone(), q.clone()))
            .collect();
        let building_types = config
            .buildings
            .iter()
            .map(|b| (b.id.clone(), b.clone()))
            .collect();
        let events = config
            .events
            .iter()
            .map(|e| GameEventState::new(e.clone()))
            .collect();
        let grid = Grid::new(config.grid.width, config.grid.height);

        Self {
            config,
            resources,
            world: World::new(),
            qualifications,
            building_types,
            grid,
            modules: Vec::new(),
            events,
            quest_flags: BTreeMap::new(),
            quest_timers: BTreeMap::new(),
            active_event: None,
            selected_building_type: None,
            paused: false,
            ticks: 0,
            days: 0,
            messages: Vec::new(),
            module_ids: IdSequence::new("m_"),
            person_ids: IdSequence::new("p_"),
        }
    }

    /// Append to the message log and mirror it to the log facade.
    pub fn notify(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::info!("{}", message);
        self.messages.push(message);
    }

    pub fn drain_messages(&mut self) -> Vec<String> {
        std::mem::take(&mut self.messages)
    }

    /// All residents, ordered by id
    pub fn people(&self) -> Vec<PersonRecord> {
        person_records(&self.world)
    }

    pub fn person(&self, id: &str) -> Option<PersonRecord> {
        find_person(&self.world, id).and_then(|e| person_record(&self.world, e))
    }

    pub fn person_count(&self) -> usize {
        person_count(&self.world)
    }

    pub fn module(&self, id: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.id == id)
    }

    pub fn module_mut(&mut self, id: &str) -> Option<&mut Module> {
        self.modules.iter_mut().find(|m| m.id == id)
    }

    /// Display name of a building type, falling back to the id.
    pub fn building_name(&self, type_id: &str) -> String {
        self.building_types
            .get(type_id)
            .map(|b| b.name.clone())
            .unwrap_or_else(|| type_id.to_string())
    }

    pub fn enabled_qualification_codes(&self) -> Vec<String> {
        self.qualifications
            .values()
            .filter(|q| q.enabled)
            .map(|q| q.code.clone())
            .collect()
    }

    pub fn recalc_maximums(&mut self) {
        recalc_maximums(
            &mut self.resources,
            &self.config.resources,
            &self.modules,
            &self.building_types,
        );
    }

    /// Population is derived: current = head count, never accumulated.
    pub fn sync_population(&mut self) {
        let count = self.person_count() as f64;
        if let Some(population) = self.resources.get_mut(POPULATION) {
            population.current = count;
            population.delta_per_tick = 0.0;
        }
    }

    /// The host loop only advances time when not paused and no event is waiting.
    pub fn can_tick(&self) -> bool {
        !self.paused && self.active_event.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_new_game_starts_with_residents() {
        let config = GameConfig::builtin().unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let state = GameState::new(config.clone(), &mut rng);

        assert_eq!(state.person_count(), config.starting_people as usize);
        assert_eq!(
            state.resources.current(POPULATION),
            config.starting_people as f64
        );
        assert_eq!(state.grid.width, 16);
        assert_eq!(state.grid.height, 10);
        assert!(state.modules.is_empty());
        assert_eq!(state.events.len(), config.events.len());
        assert!(state.can_tick());

        // Starting qualifications come from the enabled pool only
        let enabled = state.enabled_qualification_codes();
        assert!(!enabled.contains(&"scientist".to_string()));
        for person in state.people() {
            assert!(person.qualifications.iter().all(|q| enabled.contains(q)));
        }
    }

    #[test]
    fn test_notify_and_drain() {
        let mut state = GameState::empty(GameConfig::builtin().unwrap());
        state.notify("hello");
        state.notify(String::from("world"));
        assert_eq!(state.drain_messages(), vec!["hello", "world"]);
        assert!(state.messages.is_empty());
    }

    #[test]
    fn test_building_name_falls_back_to_id() {
        let state = GameState::empty(GameConfig::builtin().unwrap());
        assert_eq!(state.building_name("generator"), "Generator");
        assert_eq!(state.building_name("mystery"), "mystery");
    }
}
