//! Spacestation Core - Tick-based Station Colony Simulation
//!
//! A grid of buildable modules, residents with qualifications, a clamped
//! resource economy and scripted events that react to thresholds, advanced in
//! discrete ticks.
//!
//! # Architecture
//!
//! - **Components**: pure data. Residents are `hecs` entities; the station
//!   grid and its modules are plain structs owned by the game state.
//! - **Systems**: functions over `&mut GameState` (resources, placement,
//!   workforce, events, tick).
//! - **Config**: immutable definitions loaded from JSON.
//! - **Persistence**: versioned snapshots in binary or JSON, plus save slots.
//!
//! # Example
//!
//! ```rust,no_run
//! use spacestation_core::prelude::*;
//!
//! let config = GameConfig::builtin().expect("built-in config");
//! let mut engine = SimulationEngine::new(config, 42);
//!
//! engine.select_building_type(Some("generator"));
//! engine.place_building_at(7, 4).expect("first module");
//!
//! loop {
//!     engine.update(1.0 / 60.0); // 60 FPS
//!     for message in engine.drain_messages() {
//!         println!("{message}");
//!     }
//! }
//! ```

pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod generation;
pub mod persistence;
pub mod state;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::{GameConfig, POPULATION};
    pub use crate::engine::SimulationEngine;
    pub use crate::error::*;
    pub use crate::state::GameState;
}
