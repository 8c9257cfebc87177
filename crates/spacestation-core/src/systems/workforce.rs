//! Workforce - work assignment, training and resident arrivals

use hecs::{Entity, World};
use rand::Rng;

use crate::components::*;
use crate::config::POPULATION;
use crate::error::{AssignError, TrainingError};
use crate::generation::create_random_person;
use crate::state::GameState;

/// Put a person to work in a module.
///
/// Checks, in order: both exist, the person is available, holds every
/// required qualification, and a slot is free. A person already working
/// elsewhere is detached from the old module first.
pub fn assign_person_to_module(
    state: &mut GameState,
    person_id: &str,
    module_id: &str,
) -> Result<(), AssignError> {
    let entity = find_person(&state.world, person_id)
        .ok_or_else(|| AssignError::UnknownPerson(person_id.to_string()))?;
    let module = state
        .module(module_id)
        .ok_or_else(|| AssignError::UnknownModule(module_id.to_string()))?;

    let name = person_name(&state.world, entity);
    let unavailable_for = state
        .world
        .get::<&Availability>(entity)
        .map(|a| a.unavailable_for)
        .unwrap_or(0);
    if unavailable_for > 0 {
        return Err(AssignError::Unavailable {
            name,
            ticks: unavailable_for,
        });
    }

    let qualified = state
        .world
        .get::<&Qualifications>(entity)
        .map(|q| q.has_all(&module.required_qualifications))
        .unwrap_or(false);
    if !qualified {
        return Err(AssignError::MissingQualifications {
            name,
            module: state.building_name(&module.type_id),
        });
    }

    // Re-assigning to the same module never needs a new slot
    if !module.has_worker(person_id) && !module.has_free_slot() {
        return Err(AssignError::SlotsFull(state.building_name(&module.type_id)));
    }
    let building = state.building_name(&module.type_id);

    let current = current_work(&state.world, entity);
    if let Some(old) = current.as_deref() {
        if old != module_id {
            remove_person_from_module(state, person_id, Some(old));
        }
    }

    if let Some(module) = state.module_mut(module_id) {
        if !module.has_worker(person_id) {
            module.workers.push(person_id.to_string());
        }
    }
    if let Ok(mut assignment) = state.world.get::<&mut Assignment>(entity) {
        assignment.work = Some(module_id.to_string());
    }

    state.notify(format!("{} now works in {}.", name, building));
    Ok(())
}

/// Detach a person from a module. Without a module id, the person's current
/// workplace is used. Doing nothing is not an error.
pub fn remove_person_from_module(state: &mut GameState, person_id: &str, module_id: Option<&str>) {
    let Some(entity) = find_person(&state.world, person_id) else {
        return;
    };
    let current = current_work(&state.world, entity);
    let Some(target) = module_id.map(str::to_string).or_else(|| current.clone()) else {
        return;
    };

    if let Some(module) = state.module_mut(&target) {
        module.workers.retain(|w| w != person_id);
    }
    if current.as_deref() == Some(target.as_str()) {
        if let Ok(mut assignment) = state.world.get::<&mut Assignment>(entity) {
            assignment.work = None;
        }
    }
}

fn current_work(world: &World, entity: Entity) -> Option<String> {
    world
        .get::<&Assignment>(entity)
        .ok()
        .and_then(|a| a.work.clone())
}

/// Start a training course: pays the cost and blocks the person for its duration.
pub fn start_training(
    state: &mut GameState,
    person_id: &str,
    qualification_code: &str,
) -> Result<(), TrainingError> {
    let entity = find_person(&state.world, person_id)
        .ok_or_else(|| TrainingError::UnknownPerson(person_id.to_string()))?;
    let name = person_name(&state.world, entity);

    if state.world.get::<&Training>(entity).is_ok() {
        return Err(TrainingError::AlreadyTraining(name));
    }

    let already = state
        .world
        .get::<&Qualifications>(entity)
        .map(|q| q.has(qualification_code))
        .unwrap_or(false);
    if already {
        let qualification = state
            .qualifications
            .get(qualification_code)
            .map(|q| q.title.clone())
            .unwrap_or_else(|| qualification_code.to_string());
        return Err(TrainingError::AlreadyQualified {
            name,
            qualification,
        });
    }

    let qualification = state
        .qualifications
        .get(qualification_code)
        .filter(|q| q.enabled)
        .cloned()
        .ok_or_else(|| TrainingError::QualificationUnavailable(qualification_code.to_string()))?;

    if !state.resources.can_afford(&qualification.costs) {
        return Err(TrainingError::CannotAfford(qualification.title));
    }

    state
        .resources
        .apply_deltas(&qualification.costs, Sign::Minus);
    let _ = state.world.insert_one(
        entity,
        Training {
            qualification_code: qualification.code.clone(),
            remaining_ticks: qualification.learning_duration,
        },
    );
    if let Ok(mut availability) = state.world.get::<&mut Availability>(entity) {
        availability.unavailable_for = availability
            .unavailable_for
            .max(qualification.learning_duration);
    }

    state.notify(format!("{} started training: {}.", name, qualification.title));
    Ok(())
}

/// Per-tick workforce update: count down availability and training, grant
/// qualifications whose course has finished.
pub fn progress_people(state: &mut GameState) {
    let mut completed: Vec<(String, Entity, String)> = Vec::new();

    for (entity, (id, availability, training)) in
        state
            .world
            .query_mut::<(&PersonId, &mut Availability, Option<&mut Training>)>()
    {
        availability.unavailable_for = availability.unavailable_for.saturating_sub(1);

        if let Some(training) = training {
            training.remaining_ticks = training.remaining_ticks.saturating_sub(1);
            if training.remaining_ticks == 0 {
                completed.push((id.0.clone(), entity, training.qualification_code.clone()));
            }
        }
    }

    // Stable message order regardless of archetype layout
    completed.sort_by(|a, b| a.0.cmp(&b.0));

    for (_, entity, code) in completed {
        let _ = state.world.remove_one::<Training>(entity);
        if let Ok(mut qualifications) = state.world.get::<&mut Qualifications>(entity) {
            qualifications.grant(&code);
        }

        let name = person_name(&state.world, entity);
        let title = state
            .qualifications
            .get(&code)
            .map(|q| q.title.clone())
            .unwrap_or(code);
        state.notify(format!("{} completed training: {}.", name, title));
    }
}

/// Workers of a module that count this tick: they exist, their own
/// assignment points back at the module, and they are available.
pub fn module_active_workers(world: &World, module: &Module) -> Vec<Entity> {
    module
        .workers
        .iter()
        .filter_map(|id| find_person(world, id))
        .filter(|&entity| {
            let works_here = world
                .get::<&Assignment>(entity)
                .map(|a| a.work.as_deref() == Some(module.id.as_str()))
                .unwrap_or(false);
            let available = world
                .get::<&Availability>(entity)
                .map(|a| a.is_available())
                .unwrap_or(false);
            works_here && available
        })
        .collect()
}

/// Maybe welcome a new resident.
///
/// Requires a population cap with room left and at least one arrival module.
/// Chance per tick is `chance_per_building x arrival module count`.
/// Returns the new person's id.
pub fn try_spawn_new_person(state: &mut GameState, rng: &mut impl Rng) -> Option<String> {
    let max = state.resources.get(POPULATION)?.max?;
    if state.person_count() as f64 >= max {
        return None;
    }

    let spawn = &state.config.spawn;
    let arrival_modules = state
        .modules
        .iter()
        .filter(|m| m.type_id == spawn.building_type)
        .count();
    if arrival_modules == 0 {
        return None;
    }

    let chance = spawn.chance_per_building * arrival_modules as f64;
    if rng.gen::<f64>() >= chance {
        return None;
    }

    let pool = state.enabled_qualification_codes();
    let id = state.person_ids.allocate();
    let record = create_random_person(id.clone(), &state.config.person_template, &pool, rng);
    let name = record.name.full_name();
    spawn_person(&mut state.world, record);

    state.notify(format!("New resident arrived: {}", name));
    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::systems::{place_building_at, select_building_type};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn person(id: &str, qualifications: &[&str]) -> PersonRecord {
        PersonRecord {
            id: id.to_string(),
            name: Name::new("Rin", "Okafor"),
            tags: vec!["citizen".into()],
            income_per_tick: vec![],
            needs_per_tick: vec![],
            work: None,
            unavailable_for: 0,
            qualifications: qualifications.iter().map(|q| q.to_string()).collect(),
            training: None,
        }
    }

    /// Empty state with a generator and a dock, plus three residents.
    fn staffed_state() -> (GameState, String, String) {
        let mut state = GameState::empty(GameConfig::builtin().unwrap());
        select_building_type(&mut state, Some("generator"));
        let generator = place_building_at(&mut state, 7, 4).unwrap();
        select_building_type(&mut state, Some("dock"));
        let dock = place_building_at(&mut state, 8, 4).unwrap();

        spawn_person(&mut state.world, person("p_001", &["tech_basic"]));
        spawn_person(&mut state.world, person("p_002", &["tech_basic", "engineer"]));
        spawn_person(&mut state.world, person("p_003", &["life_support"]));
        state.person_ids.sync_from(["p_003"]);
        state.drain_messages();
        (state, generator, dock)
    }

    fn work_of(state: &GameState, id: &str) -> Option<String> {
        state.person(id).and_then(|p| p.work)
    }

    #[test]
    fn test_assign_and_move_between_modules() {
        let (mut state, generator, dock) = staffed_state();

        assign_person_to_module(&mut state, "p_001", &generator).unwrap();
        assert_eq!(work_of(&state, "p_001"), Some(generator.clone()));
        assert_eq!(state.module(&generator).unwrap().workers, vec!["p_001"]);

        // Idempotent
        assign_person_to_module(&mut state, "p_001", &generator).unwrap();
        assert_eq!(state.module(&generator).unwrap().workers.len(), 1);

        assign_person_to_module(&mut state, "p_001", &dock).unwrap();
        assert!(state.module(&generator).unwrap().workers.is_empty());
        assert_eq!(state.module(&dock).unwrap().workers, vec!["p_001"]);
        assert_eq!(work_of(&state, "p_001"), Some(dock));
    }

    #[test]
    fn test_assign_failures() {
        let (mut state, generator, dock) = staffed_state();

        assert_eq!(
            assign_person_to_module(&mut state, "p_404", &generator),
            Err(AssignError::UnknownPerson("p_404".into()))
        );
        assert_eq!(
            assign_person_to_module(&mut state, "p_001", "m_404"),
            Err(AssignError::UnknownModule("m_404".into()))
        );
        assert!(matches!(
            assign_person_to_module(&mut state, "p_003", &generator),
            Err(AssignError::MissingQualifications { .. })
        ));

        assign_person_to_module(&mut state, "p_003", &dock).unwrap();
        assert_eq!(
            assign_person_to_module(&mut state, "p_001", &dock),
            Err(AssignError::SlotsFull("Dock".into()))
        );

        let entity = find_person(&state.world, "p_002").unwrap();
        state.world.get::<&mut Availability>(entity).unwrap().unavailable_for = 3;
        assert!(matches!(
            assign_person_to_module(&mut state, "p_002", &generator),
            Err(AssignError::Unavailable { ticks: 3, .. })
        ));
        assert!(work_of(&state, "p_002").is_none());
    }

    #[test]
    fn test_remove_person_from_module() {
        let (mut state, generator, dock) = staffed_state();
        assign_person_to_module(&mut state, "p_001", &generator).unwrap();

        // Removing from a module they don't work in keeps the real link
        remove_person_from_module(&mut state, "p_001", Some(dock.as_str()));
        assert_eq!(work_of(&state, "p_001"), Some(generator.clone()));

        remove_person_from_module(&mut state, "p_001", None);
        assert!(work_of(&state, "p_001").is_none());
        assert!(state.module(&generator).unwrap().workers.is_empty());

        // No-op when idle or unknown
        remove_person_from_module(&mut state, "p_001", None);
        remove_person_from_module(&mut state, "p_404", None);
    }

    #[test]
    fn test_training_lifecycle() {
        let (mut state, generator, _) = staffed_state();
        assign_person_to_module(&mut state, "p_001", &generator).unwrap();
        let money = state.resources.current("money");

        start_training(&mut state, "p_001", "engineer").unwrap();
        assert_eq!(state.resources.current("money"), money - 150.0);
        assert_eq!(state.resources.current("energy"), 30.0);

        let record = state.person("p_001").unwrap();
        assert_eq!(record.unavailable_for, 30);
        assert_eq!(record.training.unwrap().remaining_ticks, 30);
        // Training does not detach from work
        assert_eq!(record.work, Some(generator.clone()));

        for _ in 0..29 {
            progress_people(&mut state);
        }
        assert!(state.person("p_001").unwrap().training.is_some());
        assert!(module_active_workers(&state.world, state.module(&generator).unwrap()).is_empty());

        progress_people(&mut state);
        let record = state.person("p_001").unwrap();
        assert!(record.training.is_none());
        assert_eq!(record.unavailable_for, 0);
        assert!(record.qualifications.contains(&"engineer".to_string()));
        assert_eq!(
            state.messages.last().map(String::as_str),
            Some("Rin Okafor completed training: Engineer.")
        );
        assert_eq!(
            module_active_workers(&state.world, state.module(&generator).unwrap()).len(),
            1
        );
    }

    #[test]
    fn test_training_failures() {
        let (mut state, _, _) = staffed_state();

        assert!(matches!(
            start_training(&mut state, "p_002", "engineer"),
            Err(TrainingError::AlreadyQualified { .. })
        ));
        assert_eq!(
            start_training(&mut state, "p_001", "scientist"),
            Err(TrainingError::QualificationUnavailable("scientist".into()))
        );
        assert_eq!(
            start_training(&mut state, "p_001", "astrology"),
            Err(TrainingError::QualificationUnavailable("astrology".into()))
        );

        start_training(&mut state, "p_001", "life_support").unwrap();
        assert!(matches!(
            start_training(&mut state, "p_001", "engineer"),
            Err(TrainingError::AlreadyTraining(_))
        ));

        state.resources.get_mut("money").unwrap().current = 10.0;
        assert_eq!(
            start_training(&mut state, "p_003", "tech_basic"),
            Err(TrainingError::CannotAfford("Basic Technician".into()))
        );
    }

    #[test]
    fn test_training_never_shortens_unavailability() {
        let (mut state, _, _) = staffed_state();
        let entity = find_person(&state.world, "p_003").unwrap();
        state.world.get::<&mut Availability>(entity).unwrap().unavailable_for = 50;

        start_training(&mut state, "p_003", "tech_basic").unwrap();
        assert_eq!(state.person("p_003").unwrap().unavailable_for, 50);
    }

    #[test]
    fn test_spawn_requires_room_and_docks() {
        let (mut state, _, _) = staffed_state();
        let mut rng = StdRng::seed_from_u64(11);

        // Cap is zero without housing
        for _ in 0..500 {
            assert!(try_spawn_new_person(&mut state, &mut rng).is_none());
        }

        state.resources.get_mut(POPULATION).unwrap().max = Some(4.0);
        let mut arrived = None;
        for _ in 0..2_000 {
            arrived = try_spawn_new_person(&mut state, &mut rng);
            if arrived.is_some() {
                break;
            }
        }
        assert_eq!(arrived.as_deref(), Some("p_004"));
        assert_eq!(state.person_count(), 4);

        // Full again
        for _ in 0..500 {
            assert!(try_spawn_new_person(&mut state, &mut rng).is_none());
        }
    }

    /// Roomy state with `docks` arrival modules and the given per-dock chance.
    fn arrivals_state(chance: f64, docks: usize) -> GameState {
        let mut config = (*GameConfig::builtin().unwrap()).clone();
        config.spawn.chance_per_building = chance;
        let mut state = GameState::empty(std::sync::Arc::new(config));
        state.resources.get_mut("money").unwrap().current = 10_000.0;

        select_building_type(&mut state, Some("dock"));
        for i in 0..docks {
            place_building_at(&mut state, 5 + 2 * i as i64, 4).unwrap();
        }
        state.resources.get_mut(POPULATION).unwrap().max = Some(1_000_000.0);
        state
    }

    #[test]
    fn test_spawn_chance_scales_with_dock_count() {
        // Two docks at one half each make arrival certain
        let mut state = arrivals_state(0.5, 2);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            assert!(try_spawn_new_person(&mut state, &mut rng).is_some());
        }
        assert_eq!(state.person_count(), 50);

        // One dock lands near half the draws
        let mut state = arrivals_state(0.5, 1);
        let mut rng = StdRng::seed_from_u64(3);
        let arrivals = (0..2_000)
            .filter(|_| try_spawn_new_person(&mut state, &mut rng).is_some())
            .count();
        assert!((850..1_150).contains(&arrivals), "{} arrivals", arrivals);

        // No docks, no arrivals
        let mut state = arrivals_state(0.5, 0);
        for _ in 0..200 {
            assert!(try_spawn_new_person(&mut state, &mut rng).is_none());
        }
    }
}
