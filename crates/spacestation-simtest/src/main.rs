//! Spacestation Headless Simulation Harness
//!
//! Drives a scripted play session through the engine and validates the
//! simulation invariants after every tick. No rendering, no host timer.
//!
//! Usage:
//!   cargo run -p spacestation-simtest
//!   cargo run -p spacestation-simtest -- --ticks 2000 --seed 7 --verbose
//!   RUST_LOG=debug cargo run -p spacestation-simtest

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use spacestation_core::config::GameConfig;
use spacestation_core::persistence::{deserialize_state, serialize_state};
use spacestation_core::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless station simulation harness", long_about = None)]
struct Args {
    /// Number of ticks to simulate
    #[arg(long, default_value_t = 1_200)]
    ticks: u32,

    /// Seed for the engine and the scripted intents
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Station config JSON (defaults to the built-in one)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print passing checks too
    #[arg(long)]
    verbose: bool,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn check(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

fn main() {
    let args = Args::parse();
    let default_level = if args.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    println!("=== Spacestation Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Config
    let config = match load_config(&args) {
        Ok(config) => {
            results.push(TestResult::check(
                "config_valid",
                true,
                format!(
                    "{} resources, {} buildings, {} qualifications, {} events",
                    config.resources.len(),
                    config.buildings.len(),
                    config.qualifications.len(),
                    config.events.len()
                ),
            ));
            config
        }
        Err(e) => {
            results.push(TestResult::check("config_valid", false, e.to_string()));
            report(&results, args.verbose);
            std::process::exit(1);
        }
    };

    // 2. Scripted build-out
    let mut engine = SimulationEngine::new(config.clone(), args.seed);
    results.extend(build_station(&mut engine));

    // 3. Long run with per-tick invariants
    results.extend(run_session(&mut engine, &args));

    // 4. Save/load
    results.extend(validate_persistence(&engine));

    // 5. Determinism
    results.extend(validate_determinism(config, args.seed));

    let failed = report(&results, args.verbose);
    if failed > 0 {
        std::process::exit(1);
    }
}

fn load_config(args: &Args) -> Result<Arc<GameConfig>, ConfigError> {
    match &args.config {
        Some(path) => GameConfig::from_file(path).map(Arc::new),
        None => GameConfig::builtin(),
    }
}

fn report(results: &[TestResult], verbose: bool) -> usize {
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.len() - passed;

    for r in results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed,
        results.len(),
        failed
    );
    failed
}

// ── 2. Build-out ────────────────────────────────────────────────────────

/// Ring of modules around the grid centre. Placements that the config
/// cannot afford are reported, not fatal.
fn build_station(engine: &mut SimulationEngine) -> Vec<TestResult> {
    println!("--- Build-out ---");
    let mut results = Vec::new();
    let cx = (engine.state.grid.width / 2) as i64;
    let cy = (engine.state.grid.height / 2) as i64;

    let plan: [(&str, i64, i64); 5] = [
        ("habitat", cx - 2, cy - 1),
        ("dock", cx, cy - 1),
        ("generator", cx, cy),
        ("life_support", cx - 2, cy + 1),
        ("habitat", cx + 1, cy),
    ];

    let mut built = 0;
    for (type_id, x, y) in plan {
        engine.select_building_type(Some(type_id));
        match engine.place_building_at(x, y) {
            Ok(id) => {
                built += 1;
                log::info!("placed {} as {}", type_id, id);
            }
            Err(e) => log::warn!("could not place {} at ({}, {}): {}", type_id, x, y, e),
        }
    }
    results.push(TestResult::check(
        "build_first_modules",
        built >= 3,
        format!("{} of {} planned modules placed", built, plan.len()),
    ));

    let ids: Vec<&str> = engine.state.modules.iter().map(|m| m.id.as_str()).collect();
    let ordered = ids.windows(2).all(|w| w[0] < w[1]);
    results.push(TestResult::check(
        "module_ids_monotonic",
        ordered,
        ids.join(", "),
    ));
    results.push(TestResult::check(
        "grid_consistent_after_build",
        engine.state.grid.is_consistent(),
        format!("{}x{}", engine.state.grid.width, engine.state.grid.height),
    ));

    // Staff every module a resident qualifies for
    let modules: Vec<String> = engine.state.modules.iter().map(|m| m.id.clone()).collect();
    let mut staffed = 0;
    for person in engine.people() {
        for module in &modules {
            if engine.assign_person_to_module(&person.id, module).is_ok() {
                staffed += 1;
                break;
            }
        }
    }
    results.push(TestResult::check(
        "staffing",
        true,
        format!("{} residents assigned", staffed),
    ));
    results
}

// ── 3. Session ──────────────────────────────────────────────────────────

fn run_session(engine: &mut SimulationEngine, args: &Args) -> Vec<TestResult> {
    println!("--- Session ({} ticks) ---", args.ticks);
    let mut rng = StdRng::seed_from_u64(args.seed ^ 0x5eed);
    let mut violations: HashMap<&'static str, (u32, String)> = HashMap::new();
    let mut events_seen = 0;
    let start_ticks = engine.state.ticks;

    let mut note = |name: &'static str, detail: String| {
        let entry = violations.entry(name).or_insert((0, detail));
        entry.0 += 1;
    };

    while engine.state.ticks - start_ticks < args.ticks as u64 {
        if engine.state.active_event.is_some() {
            events_seen += 1;
            let options = engine
                .state
                .active_event
                .as_ref()
                .map(|p| p.options.iter().map(|o| o.id.clone()).collect::<Vec<_>>())
                .unwrap_or_default();
            match options.get(rng.gen_range(0..options.len().max(1))) {
                Some(choice) if engine.choose_event_option(choice) => {}
                Some(choice) => note("event_option_applies", format!("option {} rejected", choice)),
                None => {
                    note("event_option_applies", "popup without options".into());
                    break;
                }
            }
        }

        random_intent(engine, &mut rng);
        let ran = engine.update(0.5);
        if ran == 0 && engine.state.active_event.is_none() {
            note("engine_advances", format!("stalled at tick {}", engine.state.ticks));
            break;
        }

        let state = &engine.state;
        if state.resources.current(POPULATION) != state.person_count() as f64 {
            note(
                "population_derived",
                format!(
                    "tick {}: population {} vs {} people",
                    state.ticks,
                    state.resources.current(POPULATION),
                    state.person_count()
                ),
            );
        }
        for resource in state.resources.iter() {
            let above_cap = resource.name != POPULATION
                && resource.max.map_or(false, |max| resource.current > max);
            if resource.current < 0.0 || above_cap {
                note(
                    "resources_clamped",
                    format!("tick {}: {} = {}", state.ticks, resource.name, resource.current),
                );
            }
        }
        if let Some(detail) = worker_link_violation(state) {
            note("worker_exclusivity", format!("tick {}: {}", state.ticks, detail));
        }
        if !state.grid.is_consistent() {
            note("grid_consistent", format!("tick {}", state.ticks));
        }
    }

    let mut results = Vec::new();
    for name in [
        "engine_advances",
        "event_option_applies",
        "population_derived",
        "resources_clamped",
        "worker_exclusivity",
        "grid_consistent",
    ] {
        let result = match violations.get(name) {
            Some((count, first)) => TestResult::check(
                name,
                false,
                format!("{} violation(s), first: {}", count, first),
            ),
            None => TestResult::check(name, true, "held every tick"),
        };
        results.push(result);
    }

    let messages = engine.drain_messages();
    results.push(TestResult::check(
        "session_summary",
        true,
        format!(
            "day {}, {} residents, {} modules, {} events resolved, {} messages",
            engine.state.days,
            engine.state.person_count(),
            engine.state.modules.len(),
            events_seen,
            messages.len()
        ),
    ));
    results
}

/// One random player intent: assign, unassign, train, toggle or build.
fn random_intent(engine: &mut SimulationEngine, rng: &mut StdRng) {
    if !rng.gen_bool(0.1) {
        return;
    }
    let people = engine.people();
    if people.is_empty() {
        return;
    }
    let person = &people[rng.gen_range(0..people.len())].id;
    let modules: Vec<String> = engine.state.modules.iter().map(|m| m.id.clone()).collect();

    match rng.gen_range(0..5) {
        0 if !modules.is_empty() => {
            let module = &modules[rng.gen_range(0..modules.len())];
            let _ = engine.assign_person_to_module(person, module);
        }
        1 => engine.remove_person_from_module(person),
        2 => {
            let codes = engine.state.enabled_qualification_codes();
            if !codes.is_empty() {
                let code = &codes[rng.gen_range(0..codes.len())];
                let _ = engine.start_training(person, code);
            }
        }
        3 if !modules.is_empty() => {
            let module = &modules[rng.gen_range(0..modules.len())];
            engine.toggle_module_active(module);
        }
        _ => {
            let types: Vec<String> = engine
                .state
                .building_types
                .values()
                .filter(|b| b.enabled)
                .map(|b| b.id.clone())
                .collect();
            if types.is_empty() {
                return;
            }
            let type_id = &types[rng.gen_range(0..types.len())];
            engine.select_building_type(Some(type_id.as_str()));
            let x = rng.gen_range(0..engine.state.grid.width) as i64;
            let y = rng.gen_range(0..engine.state.grid.height) as i64;
            let _ = engine.place_building_at(x, y);
        }
    }
}

fn worker_link_violation(state: &GameState) -> Option<String> {
    let people = state.people();
    let works: HashMap<&str, Option<&str>> = people
        .iter()
        .map(|p| (p.id.as_str(), p.work.as_deref()))
        .collect();

    for module in &state.modules {
        for worker in &module.workers {
            if works.get(worker.as_str()).copied().flatten() != Some(module.id.as_str()) {
                return Some(format!("{} listed in {} but works elsewhere", worker, module.id));
            }
        }
    }
    for person in &people {
        if let Some(work) = &person.work {
            let listed = state
                .modules
                .iter()
                .filter(|m| m.has_worker(&person.id))
                .count();
            if listed != 1 || state.module(work).is_none() {
                return Some(format!("{} works at {} but is listed {} times", person.id, work, listed));
            }
        }
    }
    None
}

// ── 4. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(engine: &SimulationEngine) -> Vec<TestResult> {
    println!("--- Persistence ---");
    let mut results = Vec::new();

    let mut buffer = Vec::new();
    let binary = engine
        .save(&mut buffer)
        .map_err(|e| e.to_string())
        .and_then(|_| {
            let mut loaded = SimulationEngine::new(engine.state.config.clone(), 0);
            loaded.load(&buffer[..]).map_err(|e| e.to_string())?;
            Ok(loaded)
        });
    match binary {
        Ok(loaded) => {
            let same = loaded.state.ticks == engine.state.ticks
                && loaded.state.modules == engine.state.modules
                && loaded.people() == engine.people();
            results.push(TestResult::check(
                "binary_roundtrip",
                same,
                format!("{} bytes", buffer.len()),
            ));
        }
        Err(e) => results.push(TestResult::check("binary_roundtrip", false, e)),
    }

    let json = serialize_state(&engine.state).and_then(|json| {
        let loaded = deserialize_state(&json, engine.state.config.clone())?;
        Ok((json, loaded))
    });
    match json {
        Ok((json, loaded)) => {
            let expected_next = engine.state.module_ids.peek();
            results.push(TestResult::check(
                "json_roundtrip",
                loaded.modules.len() == engine.state.modules.len()
                    && loaded.person_count() == engine.state.person_count(),
                format!("{} bytes", json.len()),
            ));
            results.push(TestResult::check(
                "module_ids_resynced",
                loaded.module_ids.peek() >= expected_next,
                format!("next id number {}", loaded.module_ids.peek()),
            ));
        }
        Err(e) => results.push(TestResult::check("json_roundtrip", false, e.to_string())),
    }

    results
}

// ── 5. Determinism ──────────────────────────────────────────────────────

fn validate_determinism(config: Arc<GameConfig>, seed: u64) -> Vec<TestResult> {
    println!("--- Determinism ---");
    let run = || {
        let mut engine = SimulationEngine::new(config.clone(), seed);
        engine.select_building_type(Some("habitat"));
        let _ = engine.place_building_at(6, 4);
        engine.select_building_type(Some("dock"));
        let _ = engine.place_building_at(8, 4);
        for _ in 0..400 {
            engine.step();
            if let Some(option) = engine
                .state
                .active_event
                .as_ref()
                .and_then(|p| p.options.first())
                .map(|o| o.id.clone())
            {
                engine.choose_event_option(&option);
            }
        }
        let levels: Vec<String> = engine
            .state
            .resources
            .iter()
            .map(|r| format!("{}={:.3}", r.name, r.current))
            .collect();
        (engine.people(), levels)
    };

    let (people_a, levels_a) = run();
    let (people_b, levels_b) = run();
    vec![TestResult::check(
        "same_seed_same_run",
        people_a == people_b && levels_a == levels_b,
        format!("{} residents, {}", people_a.len(), levels_a.join(" ")),
    )]
}
