//! Error types for the fitcal_core library.

use crate::store::EntityKind;
use crate::session::SessionPhase;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for fitcal_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workout library validation error
    #[error("Catalog validation error: {0}")]
    Catalog(String),

    /// Input rejected before any work was done
    #[error("Validation error: {0}")]
    Validation(String),

    /// A session transition was attempted from a phase that does not allow it.
    /// The session state is left untouched.
    #[error("cannot {action} a session that is {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: SessionPhase,
    },

    /// No record with this id exists in the collection
    #[error("{kind} record {id} not found")]
    NotFound { kind: EntityKind, id: String },

    /// A conditional update lost a race with another writer
    #[error("{kind} record {id} changed underneath us (expected version {expected}, found {actual})")]
    VersionConflict {
        kind: EntityKind,
        id: String,
        expected: u64,
        actual: u64,
    },

    /// No signed-in user
    #[error("not signed in")]
    Unauthenticated,

    /// The session record was saved but the profile could not be credited
    #[error("session {session_id} was saved but the profile was not credited: {source}")]
    ProfileNotCredited {
        session_id: String,
        #[source]
        source: Box<Error>,
    },

    /// Generic error
    #[error("{0}")]
    Other(String),
}
