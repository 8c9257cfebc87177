//! Simulation engine - main entry point for hosting a station
//!
//! Owns the game state and the seeded random source. The host calls
//! [`SimulationEngine::update`] with wall-clock deltas; the engine turns them
//! into whole ticks. Player intents go through the delegating methods, which
//! all run to completion between ticks.

use std::io::{Read, Write};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::components::PersonRecord;
use crate::config::GameConfig;
use crate::error::{AssignError, PlacementError, SaveError, TrainingError};
use crate::persistence::{load_state, save_state, SaveFormat};
use crate::state::GameState;
use crate::systems::*;

/// Seconds of real time per tick at time scale 1
pub const DEFAULT_TICK_INTERVAL: f32 = 0.5;

/// Main simulation engine
pub struct SimulationEngine {
    pub state: GameState,
    rng: StdRng,
    time_scale: f32,
    tick_interval: f32,
    accumulator: f32,
}

impl SimulationEngine {
    /// Start a new game from `config`, with all randomness drawn from `seed`.
    pub fn new(config: Arc<GameConfig>, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let state = GameState::new(config, &mut rng);
        Self::with_state(state, rng)
    }

    /// Wrap an existing state, e.g. one loaded from a save slot.
    pub fn with_state(state: GameState, rng: StdRng) -> Self {
        Self {
            state,
            rng,
            time_scale: 1.0,
            tick_interval: DEFAULT_TICK_INTERVAL,
            accumulator: 0.0,
        }
    }

    /// Advance by `delta_seconds` of wall time. Returns the number of ticks run.
    ///
    /// Time only accumulates while the state can tick: not paused and no
    /// event popup waiting for a decision. Negative or non-finite deltas are
    /// ignored.
    pub fn update(&mut self, delta_seconds: f32) -> u32 {
        if !self.state.can_tick() || !delta_seconds.is_finite() || delta_seconds < 0.0 {
            return 0;
        }

        self.accumulator += delta_seconds * self.time_scale;
        let mut ticks = 0;
        while self.accumulator >= self.tick_interval {
            self.accumulator -= self.tick_interval;
            advance_tick(&mut self.state, &mut self.rng);
            ticks += 1;

            // An event may have opened mid-frame
            if !self.state.can_tick() {
                self.accumulator = 0.0;
                break;
            }
        }
        ticks
    }

    /// Run exactly one tick, regardless of pause or popup.
    pub fn step(&mut self) {
        advance_tick(&mut self.state, &mut self.rng);
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Negative scales are treated as zero.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    pub fn set_tick_interval(&mut self, seconds: f32) {
        if seconds > 0.0 {
            self.tick_interval = seconds;
        }
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.state.paused = paused;
        if paused {
            self.accumulator = 0.0;
        }
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    pub fn select_building_type(&mut self, type_id: Option<&str>) {
        select_building_type(&mut self.state, type_id);
    }

    pub fn place_building_at(&mut self, x: i64, y: i64) -> Result<String, PlacementError> {
        place_building_at(&mut self.state, x, y)
    }

    pub fn toggle_module_active(&mut self, module_id: &str) -> bool {
        toggle_module_active(&mut self.state, module_id)
    }

    pub fn assign_person_to_module(&mut self, person_id: &str, module_id: &str) -> Result<(), AssignError> {
        assign_person_to_module(&mut self.state, person_id, module_id)
    }

    pub fn remove_person_from_module(&mut self, person_id: &str) {
        remove_person_from_module(&mut self.state, person_id, None);
    }

    pub fn start_training(&mut self, person_id: &str, qualification_code: &str) -> Result<(), TrainingError> {
        start_training(&mut self.state, person_id, qualification_code)
    }

    /// Resolve the open popup with the option of the given id.
    ///
    /// Returns `false` if no popup is open or it has no such option.
    pub fn choose_event_option(&mut self, option_id: &str) -> bool {
        let Some(option) = self
            .state
            .active_event
            .as_ref()
            .and_then(|popup| popup.option(option_id))
            .cloned()
        else {
            return false;
        };
        apply_event_option_and_close(&mut self.state, &option);
        true
    }

    pub fn people(&self) -> Vec<PersonRecord> {
        self.state.people()
    }

    /// Hand the pending messages to the presentation layer.
    pub fn drain_messages(&mut self) -> Vec<String> {
        self.state.drain_messages()
    }

    /// Save the game state to a writer
    pub fn save<W: Write>(&self, writer: W) -> Result<(), SaveError> {
        save_state(writer, &self.state, SaveFormat::Binary)
    }

    /// Load a game state from a reader, replacing the current one
    pub fn load<R: Read>(&mut self, reader: R) -> Result<(), SaveError> {
        let config = Arc::clone(&self.state.config);
        self.state = load_state(reader, config, SaveFormat::Binary)?;
        self.accumulator = 0.0;
        Ok(())
    }
}
