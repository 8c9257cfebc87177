//! Tick orchestration - one discrete step of station time

use rand::Rng;

use super::events::{check_events, tick_quest_timers};
use super::resources::DeltaMap;
use super::workforce::{module_active_workers, progress_people, try_spawn_new_person};
use crate::components::*;
use crate::state::GameState;

/// Advance the simulation by one tick.
///
/// Order: clock, quest timers, workforce, aggregated resource deltas, caps,
/// clamped apply, derived population, arrivals, event check. Never fails.
pub fn advance_tick(state: &mut GameState, rng: &mut impl Rng) {
    state.ticks += 1;
    let ticks_per_day = state.config.ticks_per_day.max(1);
    if state.ticks % ticks_per_day == 0 {
        state.days += 1;
        log::debug!("day {} begins", state.days);
    }

    tick_quest_timers(state);
    progress_people(state);

    let deltas = aggregate_deltas(state);
    state.recalc_maximums();
    state.resources.apply_delta_map(&deltas);
    state.sync_population();

    if try_spawn_new_person(state, rng).is_some() {
        state.sync_population();
    }
    check_events(state);

    log::debug!(
        "tick {}: {}",
        state.ticks,
        state
            .resources
            .iter()
            .map(|r| format!("{}={:.1}({:+.2})", r.name, r.current, r.delta_per_tick))
            .collect::<Vec<_>>()
            .join(" ")
    );
}

/// Sum module output and resident upkeep into one per-resource map.
///
/// Every module adds its base output once, active or not. An active module
/// adds it again per qualified active worker, and once more for each of those
/// holding an enabled bonus qualification of the module.
pub fn aggregate_deltas(state: &GameState) -> DeltaMap {
    let mut deltas = DeltaMap::zeroed(&state.resources);

    for module in &state.modules {
        let Some(building) = state.building_types.get(&module.type_id) else {
            continue;
        };
        deltas.add(&building.per_tick, Sign::Plus);

        if !module.active {
            continue;
        }

        let enabled_bonus: Vec<String> = module
            .bonus_qualifications
            .iter()
            .filter(|code| {
                state
                    .qualifications
                    .get(code.as_str())
                    .map(|q| q.enabled)
                    .unwrap_or(false)
            })
            .cloned()
            .collect();

        for entity in module_active_workers(&state.world, module) {
            let Ok(qualifications) = state.world.get::<&Qualifications>(entity) else {
                continue;
            };
            if !qualifications.has_all(&module.required_qualifications) {
                continue;
            }
            deltas.add(&building.per_tick, Sign::Plus);
            if qualifications.has_any(&enabled_bonus) {
                deltas.add(&building.per_tick, Sign::Plus);
            }
        }
    }

    for (_, upkeep) in state.world.query::<&Upkeep>().iter() {
        deltas.add(&upkeep.income_per_tick, Sign::Plus);
        deltas.add(&upkeep.needs_per_tick, Sign::Minus);
    }

    deltas
}
