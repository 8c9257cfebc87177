//! Error types for spacestation-core
//!
//! Rule violations raised by player intents (placement, assignment, training)
//! display as the human-readable reason shown to the player. Save and config
//! errors are structural and stop the load.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigIssue;

/// Why a module could not be placed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("No building type selected")]
    NoSelection,

    #[error("Unknown building type: {0}")]
    UnknownType(String),

    #[error("{0} is not available yet")]
    Locked(String),

    #[error("{0} does not fit inside the station grid")]
    OutOfBounds(String),

    #[error("The area for {0} is already occupied")]
    Occupied(String),

    #[error("{0} must be placed next to an existing module")]
    NotAdjacent(String),

    #[error("Not enough resources to build {0}")]
    CannotAfford(String),
}

/// Why a person could not be assigned to a module
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignError {
    #[error("Unknown person: {0}")]
    UnknownPerson(String),

    #[error("Unknown module: {0}")]
    UnknownModule(String),

    #[error("{name} is unavailable for {ticks} more ticks")]
    Unavailable { name: String, ticks: u32 },

    #[error("{name} lacks the qualifications required by {module}")]
    MissingQualifications { name: String, module: String },

    #[error("All worker slots of {0} are taken")]
    SlotsFull(String),
}

/// Why a training course could not be started
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrainingError {
    #[error("Unknown person: {0}")]
    UnknownPerson(String),

    #[error("{0} is already in training")]
    AlreadyTraining(String),

    #[error("{name} already holds {qualification}")]
    AlreadyQualified { name: String, qualification: String },

    #[error("Qualification {0} cannot be trained yet")]
    QualificationUnavailable(String),

    #[error("Not enough resources to train {0}")]
    CannotAfford(String),
}

/// Errors that can occur during save/load
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Binary(#[from] Box<bincode::ErrorKind>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("Save data contains no game state")]
    MissingState,

    #[error("Corrupt grid in save data: {width}x{height} with {cells} cells")]
    CorruptGrid { width: u32, height: u32, cells: usize },
}

/// Errors raised while loading static configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Config failed validation with {} issue(s)", .0.len())]
    Invalid(Vec<ConfigIssue>),
}
