//! Error types for Vigil
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

use crate::domain::SessionState;

/// All error types that can occur in Vigil
#[derive(Debug, Error)]
pub enum VigilError {
    /// Malformed or missing game/difficulty parameters
    #[error("Config error: {0}")]
    Config(String),

    /// Illegal state machine transition; the session keeps its prior state
    #[error("Invalid transition: cannot {action} a {from} session")]
    InvalidTransition {
        from: SessionState,
        action: &'static str,
    },

    /// Game id not in the catalog
    #[error("Unknown game: {0}")]
    UnknownGame(String),

    /// Difficulty name not recognized
    #[error("Unknown difficulty: {0}")]
    UnknownDifficulty(String),

    /// Session ended or its runner went away before a result was produced
    #[error("Session closed: {0}")]
    SessionClosed(String),

    /// Result store error
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML config parse error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for Vigil operations
pub type Result<T> = std::result::Result<T, VigilError>;
