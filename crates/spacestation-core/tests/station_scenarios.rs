//! Integration tests for whole play sessions.
//!
//! Exercises: placement → workforce → tick → events → save/load, through the
//! public API only.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use spacestation_core::components::{find_person, Qualifications, ResourceDelta, Sign};
use spacestation_core::config::{GameConfig, POPULATION};
use spacestation_core::persistence::{deserialize_state, serialize_state};
use spacestation_core::state::GameState;
use spacestation_core::systems::*;

// ── Helpers ────────────────────────────────────────────────────────────

fn fresh_game(seed: u64) -> (GameState, StdRng) {
    let config = GameConfig::builtin().expect("built-in config");
    let mut rng = StdRng::seed_from_u64(seed);
    let state = GameState::new(config, &mut rng);
    (state, rng)
}

fn place(state: &mut GameState, type_id: &str, x: i64, y: i64) -> String {
    select_building_type(state, Some(type_id));
    place_building_at(state, x, y).expect("placement should succeed")
}

/// Every resident's `work` and the module worker lists agree.
fn assert_worker_links_consistent(state: &GameState) {
    let people = state.people();
    let works: HashMap<&str, Option<&str>> = people
        .iter()
        .map(|p| (p.id.as_str(), p.work.as_deref()))
        .collect();

    for module in &state.modules {
        for worker in &module.workers {
            assert_eq!(
                works.get(worker.as_str()).copied().flatten(),
                Some(module.id.as_str()),
                "{} listed in {} but works elsewhere",
                worker,
                module.id
            );
        }
    }
    for person in &people {
        if let Some(work) = &person.work {
            let listed = state
                .modules
                .iter()
                .filter(|m| m.has_worker(&person.id))
                .count();
            assert_eq!(listed, 1, "{} works at {} but is listed {} times", person.id, work, listed);
            assert!(state.module(work).unwrap().has_worker(&person.id));
        }
    }
}

// ── Scenarios ──────────────────────────────────────────────────────────

#[test]
fn generator_scenario() {
    let (mut state, mut rng) = fresh_game(1);
    let people = state.person_count() as f64;

    let id = place(&mut state, "generator", 7, 4);
    assert_eq!(state.resources.current("money"), 800.0);
    assert!(state.module(&id).unwrap().active);

    advance_tick(&mut state, &mut rng);
    let energy = state.resources.get("energy").unwrap().clone();
    // Base output minus resident energy upkeep
    let expected = 12.0 - 0.1 * people;
    assert!((energy.delta_per_tick - expected).abs() < 1e-9);
    assert!(energy.current > 40.0);
    assert!(energy.current <= energy.max.unwrap());

    // A qualified worker adds a second helping of output
    let worker = state.people()[0].id.clone();
    let entity = find_person(&state.world, &worker).unwrap();
    state
        .world
        .get::<&mut Qualifications>(entity)
        .unwrap()
        .grant("tech_basic");
    let has_bonus = state.person(&worker).unwrap().qualifications.contains(&"engineer".to_string());
    assign_person_to_module(&mut state, &worker, &id).unwrap();

    advance_tick(&mut state, &mut rng);
    let per_worker = if has_bonus { 24.0 } else { 12.0 };
    let expected = 12.0 + per_worker - 0.1 * people;
    let energy = state.resources.get("energy").unwrap();
    assert!((energy.delta_per_tick - expected).abs() < 1e-9);
    assert!(energy.current <= energy.max.unwrap());
}

#[test]
fn oxygen_event_scenario() {
    let (mut state, _) = fresh_game(2);
    state.ticks = 60;
    state.resources.get_mut("oxygen").unwrap().current = 20.0;

    check_events(&mut state);
    let popup = state.active_event.clone().expect("event should trigger");
    assert_eq!(popup.id, "low_oxygen_warning");

    apply_event_option_and_close(&mut state, &popup.options[0]);
    assert!(state.active_event.is_none());
    assert_eq!(state.resources.current("money"), 900.0);
    assert_eq!(state.resources.current("oxygen"), 50.0);

    // Once-only events never come back, even when eligible again
    state.resources.get_mut("oxygen").unwrap().current = 0.0;
    check_events(&mut state);
    assert!(state
        .active_event
        .as_ref()
        .map_or(true, |p| p.id != "low_oxygen_warning"));
    assert_eq!(state.resources.current("money"), 900.0);
}

#[test]
fn growing_colony_session() {
    let (mut state, mut rng) = fresh_game(3);
    state.resources.get_mut("money").unwrap().current = 5_000.0;

    place(&mut state, "habitat", 6, 4);
    place(&mut state, "habitat", 8, 4);
    let dock = place(&mut state, "dock", 10, 4);
    let life_support = place(&mut state, "life_support", 6, 6);
    place(&mut state, "generator", 8, 6);
    assert_eq!(state.resources.get(POPULATION).unwrap().max, Some(10.0));

    let people = state.people();
    let _ = assign_person_to_module(&mut state, &people[0].id, &dock);
    let _ = assign_person_to_module(&mut state, &people[1].id, &life_support);

    let mut seen_events = Vec::new();
    for _ in 0..600 {
        advance_tick(&mut state, &mut rng);

        assert_eq!(state.resources.current(POPULATION), state.person_count() as f64);
        for resource in state.resources.iter() {
            assert!(resource.current >= 0.0, "{} went negative", resource.name);
            if let (Some(max), true) = (resource.max, resource.name != POPULATION) {
                assert!(resource.current <= max, "{} above cap", resource.name);
            }
        }

        if let Some(popup) = state.active_event.clone() {
            seen_events.push(popup.id.clone());
            apply_event_option_and_close(&mut state, &popup.options[0]);
        }
    }

    assert_eq!(state.days, 15);
    assert!(state.person_count() <= 10);
    assert!(seen_events.contains(&"first_day".to_string()));
    assert_eq!(
        seen_events.iter().filter(|id| *id == "first_day").count(),
        1
    );
    assert_worker_links_consistent(&state);
}

// ── Properties ─────────────────────────────────────────────────────────

#[test]
fn clamping_holds_for_any_delta() {
    let (mut state, mut rng) = fresh_game(4);
    let names = ["energy", "oxygen", "money", "science", "nothing"];

    for _ in 0..2_000 {
        let name = names[rng.gen_range(0..names.len())];
        let amount = rng.gen_range(-1e6..1e6);
        let sign = if rng.gen_bool(0.5) { Sign::Plus } else { Sign::Minus };
        state
            .resources
            .apply_deltas(&[ResourceDelta::new(name, amount)], sign);

        for resource in state.resources.iter() {
            assert!(resource.current >= 0.0);
            if let Some(max) = resource.max {
                if resource.name != POPULATION {
                    assert!(resource.current <= max);
                }
            }
        }
    }
}

#[test]
fn affordability_matches_holdings() {
    let (state, mut rng) = fresh_game(5);
    for _ in 0..500 {
        let amount = rng.gen_range(0.0..2_000.0);
        let cost = [ResourceDelta::new("money", amount)];
        assert_eq!(
            state.resources.can_afford(&cost),
            state.resources.current("money") >= amount
        );
    }
    assert!(!state
        .resources
        .can_afford(&[ResourceDelta::new("credits", 0.0)]));
}

#[test]
fn module_ids_survive_reload() {
    let (mut state, _) = fresh_game(6);
    state.resources.get_mut("money").unwrap().current = 10_000.0;
    place(&mut state, "generator", 7, 4);
    place(&mut state, "generator", 8, 4);
    state.modules[1].id = "m_010".into();

    let json = serialize_state(&state).unwrap();
    let mut loaded = deserialize_state(&json, state.config.clone()).unwrap();
    assert_eq!(place(&mut loaded, "generator", 9, 4), "m_011");
    assert_eq!(place(&mut loaded, "generator", 10, 4), "m_012");
}

#[test]
fn worker_exclusivity_under_random_assignments() {
    let (mut state, mut rng) = fresh_game(7);
    state.resources.get_mut("money").unwrap().current = 10_000.0;
    let modules = vec![
        place(&mut state, "dock", 6, 4),
        place(&mut state, "dock", 8, 4),
        place(&mut state, "habitat", 10, 4),
        place(&mut state, "generator", 12, 4),
    ];
    let people: Vec<String> = state.people().into_iter().map(|p| p.id).collect();

    for step in 0..1_000 {
        let person = &people[rng.gen_range(0..people.len())];
        match rng.gen_range(0..4) {
            0 => remove_person_from_module(&mut state, person, None),
            1 => {
                let module = &modules[rng.gen_range(0..modules.len())];
                remove_person_from_module(&mut state, person, Some(module.as_str()));
            }
            _ => {
                let module = &modules[rng.gen_range(0..modules.len())];
                let _ = assign_person_to_module(&mut state, person, module);
            }
        }
        if step % 10 == 0 {
            advance_tick(&mut state, &mut rng);
        }
        assert_worker_links_consistent(&state);
    }
}

#[test]
fn only_one_event_opens_at_a_time() {
    let (mut state, _) = fresh_game(8);
    state.ticks = 120;
    state.days = 3;
    state.resources.get_mut("oxygen").unwrap().current = 5.0;

    assert_eq!(check_events(&mut state).as_deref(), Some("low_oxygen_warning"));
    for _ in 0..5 {
        assert_eq!(check_events(&mut state), None);
    }
    let popup = state.active_event.clone().unwrap();
    apply_event_option_and_close(&mut state, &popup.options[1]);

    // Next in catalog order
    assert_eq!(check_events(&mut state).as_deref(), Some("first_day"));
}
