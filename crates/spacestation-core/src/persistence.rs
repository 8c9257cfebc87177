//! Save/Load functionality for persisting the game state
//!
//! The state is flattened into a [`StateSnapshot`]: people become plain
//! records, event progress is stored by id and re-joined onto the event
//! catalog of the config on load. Snapshots can be written as compact binary
//! (bincode) or as JSON, which is what the save slots use.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::components::*;
use crate::config::{BuildingType, GameConfig, Qualification, POPULATION};
use crate::error::SaveError;
use crate::state::GameState;
use crate::systems::{ActiveEventPopup, ResourceLedger, ResourceState};

/// Version number for save file format (increment when format changes)
pub const SAVE_VERSION: u32 = 1;

/// File name prefix of a save slot
pub const SAVE_SLOT_PREFIX: &str = "spacestation-save-slot-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    Binary,
    Json,
}

/// Versioned envelope around a snapshot
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    pub state: Option<StateSnapshot>,
}

/// Trigger progress of one event, keyed by event id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventProgress {
    pub id: String,
    pub has_triggered: bool,
}

/// Serializable snapshot of a [`GameState`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub resources: Vec<ResourceState>,
    pub people: Vec<PersonRecord>,
    pub qualifications: Vec<Qualification>,
    pub building_types: Vec<BuildingType>,
    pub grid: Grid,
    pub modules: Vec<Module>,
    pub events: Vec<EventProgress>,
    pub quest_flags: BTreeMap<String, i64>,
    pub quest_timers: BTreeMap<String, i64>,
    pub active_event_id: Option<String>,
    pub selected_building_type: Option<String>,
    pub paused: bool,
    pub ticks: u64,
    pub days: u64,
    pub messages: Vec<String>,
}

impl StateSnapshot {
    pub fn capture(state: &GameState) -> Self {
        let mut snapshot = Self {
            resources: state.resources.iter().cloned().collect(),
            people: state.people(),
            qualifications: state.qualifications.values().cloned().collect(),
            building_types: state.building_types.values().cloned().collect(),
            grid: state.grid.clone(),
            modules: state.modules.clone(),
            events: state
                .events
                .iter()
                .map(|e| EventProgress {
                    id: e.config.id.clone(),
                    has_triggered: e.has_triggered,
                })
                .collect(),
            quest_flags: state.quest_flags.clone(),
            quest_timers: state.quest_timers.clone(),
            active_event_id: state.active_event.as_ref().map(|p| p.id.clone()),
            selected_building_type: state.selected_building_type.clone(),
            paused: state.paused,
            ticks: state.ticks,
            days: state.days,
            messages: state.messages.clone(),
        };
        snapshot.sanitize();
        snapshot
    }

    /// Replace every non-finite number with zero; a non-finite cap means no cap.
    pub fn sanitize(&mut self) {
        for resource in &mut self.resources {
            resource.current = finite_or_zero(resource.current).max(0.0);
            resource.delta_per_tick = finite_or_zero(resource.delta_per_tick);
            resource.max = resource.max.filter(|m| m.is_finite());
        }
        for person in &mut self.people {
            sanitize_deltas(&mut person.income_per_tick);
            sanitize_deltas(&mut person.needs_per_tick);
        }
        for qualification in &mut self.qualifications {
            sanitize_deltas(&mut qualification.costs);
        }
        for building in &mut self.building_types {
            sanitize_deltas(&mut building.cost);
            sanitize_deltas(&mut building.per_tick);
            sanitize_deltas(&mut building.max_bonus);
        }
    }

    /// Rebuild a live game state from this snapshot.
    pub fn restore(mut self, config: Arc<GameConfig>) -> Result<GameState, SaveError> {
        let grid = &self.grid;
        if grid.width == 0
            || grid.height == 0
            || grid.cells.len() != (grid.width as usize) * (grid.height as usize)
        {
            return Err(SaveError::CorruptGrid {
                width: grid.width,
                height: grid.height,
                cells: grid.cells.len(),
            });
        }

        self.sanitize();
        repair_assignments(&mut self.people, &mut self.modules);

        let mut state = GameState::empty(config);
        state.resources = ResourceLedger::from_states(self.resources);
        state.qualifications = self
            .qualifications
            .into_iter()
            .map(|q| (q.code.clone(), q))
            .collect();
        state.building_types = self
            .building_types
            .into_iter()
            .map(|b| (b.id.clone(), b))
            .collect();

        let triggered: HashMap<String, bool> = self
            .events
            .into_iter()
            .map(|e| (e.id, e.has_triggered))
            .collect();
        for event in &mut state.events {
            event.has_triggered = triggered.get(&event.config.id).copied().unwrap_or(false);
        }
        state.active_event = self.active_event_id.and_then(|id| {
            let popup = state
                .events
                .iter()
                .find(|e| e.config.id == id)
                .map(|e| ActiveEventPopup::from_config(&e.config));
            if popup.is_none() {
                log::warn!("saved popup refers to unknown event {}, dropped", id);
            }
            popup
        });

        for person in self.people {
            spawn_person(&mut state.world, person);
        }

        state.modules = self.modules;
        state.grid = self.grid;
        state.grid.rebuild(&state.modules);

        state
            .module_ids
            .sync_from(state.modules.iter().map(|m| m.id.as_str()));
        let person_ids: Vec<String> = state.people().into_iter().map(|p| p.id).collect();
        state
            .person_ids
            .sync_from(person_ids.iter().map(String::as_str));

        state.quest_flags = self.quest_flags;
        state.quest_timers = self.quest_timers;
        state.selected_building_type = self.selected_building_type;
        state.paused = self.paused;
        state.ticks = self.ticks;
        state.days = self.days;
        state.messages = self.messages;

        state.recalc_maximums();
        for resource in state.resources.iter_mut() {
            if resource.name != POPULATION {
                resource.apply(0.0);
            }
        }
        state.sync_population();
        Ok(state)
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn sanitize_deltas(deltas: &mut [ResourceDelta]) {
    for delta in deltas {
        delta.amount = finite_or_zero(delta.amount);
    }
}

/// Drop references that do not point both ways.
///
/// A person keeps `work` only if that module exists and lists them; a module
/// keeps a worker only if that person's `work` points back at it.
fn repair_assignments(people: &mut [PersonRecord], modules: &mut [Module]) {
    for person in people.iter_mut() {
        let Some(work) = person.work.as_deref() else {
            continue;
        };
        let linked = modules
            .iter()
            .any(|m| m.id == work && m.has_worker(&person.id));
        if !linked {
            log::warn!("person {} lost dangling assignment to {}", person.id, work);
            person.work = None;
        }
    }

    let assignments: HashMap<&str, &str> = people
        .iter()
        .filter_map(|p| p.work.as_deref().map(|w| (p.id.as_str(), w)))
        .collect();
    for module in modules.iter_mut() {
        let before = module.workers.len();
        let module_id = module.id.clone();
        let mut seen = HashSet::new();
        module.workers.retain(|w| {
            assignments.get(w.as_str()) == Some(&module_id.as_str()) && seen.insert(w.clone())
        });
        if module.workers.len() != before {
            log::warn!(
                "module {} dropped {} dangling worker(s)",
                module.id,
                before - module.workers.len()
            );
        }
    }
}

/// Save the complete game state to a writer
pub fn save_state<W: Write>(writer: W, state: &GameState, format: SaveFormat) -> Result<(), SaveError> {
    let save_data = SaveData {
        version: SAVE_VERSION,
        state: Some(StateSnapshot::capture(state)),
    };

    match format {
        SaveFormat::Binary => bincode::serialize_into(writer, &save_data)?,
        SaveFormat::Json => serde_json::to_writer(writer, &save_data)?,
    }
    Ok(())
}

/// Load a game state from a reader
pub fn load_state<R: Read>(
    reader: R,
    config: Arc<GameConfig>,
    format: SaveFormat,
) -> Result<GameState, SaveError> {
    let save_data: SaveData = match format {
        SaveFormat::Binary => bincode::deserialize_from(reader)?,
        SaveFormat::Json => serde_json::from_reader(reader)?,
    };
    unpack(save_data, config)
}

/// JSON text of the complete game state
pub fn serialize_state(state: &GameState) -> Result<String, SaveError> {
    let save_data = SaveData {
        version: SAVE_VERSION,
        state: Some(StateSnapshot::capture(state)),
    };
    Ok(serde_json::to_string(&save_data)?)
}

pub fn deserialize_state(json: &str, config: Arc<GameConfig>) -> Result<GameState, SaveError> {
    let save_data: SaveData = serde_json::from_str(json)?;
    unpack(save_data, config)
}

fn unpack(save_data: SaveData, config: Arc<GameConfig>) -> Result<GameState, SaveError> {
    if save_data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }
    save_data
        .state
        .ok_or(SaveError::MissingState)?
        .restore(config)
}

/// Numbered JSON save slots inside a directory
#[derive(Debug, Clone)]
pub struct SaveSlots {
    dir: PathBuf,
}

impl SaveSlots {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, slot: u32) -> PathBuf {
        self.dir.join(format!("{}{}.json", SAVE_SLOT_PREFIX, slot))
    }

    pub fn exists(&self, slot: u32) -> bool {
        self.path(slot).is_file()
    }

    pub fn save(&self, slot: u32, state: &GameState) -> Result<(), SaveError> {
        fs::create_dir_all(&self.dir)?;
        let json = serialize_state(state)?;
        fs::write(self.path(slot), json)?;
        log::info!("saved slot {}", slot);
        Ok(())
    }

    /// Load a slot. Missing slots are `None`; corrupt ones are logged and `None`.
    pub fn load(&self, slot: u32, config: Arc<GameConfig>) -> Option<GameState> {
        let path = self.path(slot);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                log::error!("failed to read save slot {}: {}", slot, e);
                return None;
            }
        };

        match deserialize_state(&json, config) {
            Ok(state) => Some(state),
            Err(e) => {
                log::error!("save slot {} is corrupt: {}", slot, e);
                None
            }
        }
    }

    pub fn delete(&self, slot: u32) -> Result<(), SaveError> {
        match fs::remove_file(self.path(slot)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
