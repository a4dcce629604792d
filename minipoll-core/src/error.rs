//! Error types for the minipoll core library.
//!
//! Simulation methods absorb these at the model boundary (returning a
//! default or doing nothing) and log instead of propagating. The `Result`
//! alias is reserved for configuration, name parsing, construction and
//! persistence.

use thiserror::Error;

/// Top-level error type for all minipoll operations.
#[derive(Error, Debug)]
pub enum MinipollError {
    /// A model was used before it was initialised, or is disabled for this creature.
    /// Logged where the call is absorbed, never returned.
    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    /// A numeric input fell outside its permitted range. Logged where the
    /// input is clamped, never returned.
    #[error("Value out of range for {field}: {value} (expected {min}..={max})")]
    OutOfRange {
        /// Which field or parameter was out of range.
        field: String,
        /// The offending value.
        value: f64,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
    },

    /// A stat, need or emotion name that the model does not know.
    #[error("Unknown {kind}: {key}")]
    UnknownKey {
        /// The key family ("stat", "need", "emotion", ...).
        kind: &'static str,
        /// The key that was not found.
        key: String,
    },

    /// An operation that makes no sense in the current state (acting on a dead creature).
    /// Logged where the call is ignored, never returned.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Creature not found in the world.
    #[error("Creature not found: {0}")]
    CreatureNotFound(crate::CreatureId),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// SQLite persistence error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, MinipollError>;
