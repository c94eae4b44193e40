//! Session state machine states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// State of a game session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Created, clock not armed
    Ready,
    /// Clock running, accepting responses
    Playing,
    /// Clock and deadlines suspended
    Paused,
    /// Result produced; terminal
    Finished,
}

impl SessionState {
    /// Returns true if the session is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Finished)
    }

    /// Returns true if the session can be resumed
    pub fn is_resumable(&self) -> bool {
        matches!(self, SessionState::Paused)
    }

    /// Returns true if the session can be stopped early
    pub fn is_stoppable(&self) -> bool {
        matches!(self, SessionState::Playing | SessionState::Paused)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Ready => "ready",
            SessionState::Playing => "playing",
            SessionState::Paused => "paused",
            SessionState::Finished => "finished",
        };
        f.write_str(name)
    }
}
