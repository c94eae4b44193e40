//! Response inputs.

use serde::{Deserialize, Serialize};

use super::stimulus::{Stimulus, StimulusId};

/// What the participant aimed at
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseTarget {
    /// Input layer already resolved the stimulus
    Stimulus(StimulusId),
    /// Raw pointer position in unit coordinates; hit-tested against the grid
    Point { x: f32, y: f32 },
}

/// A user input event in session-logical time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponseEvent {
    pub timestamp_ms: u64,
    pub target: ResponseTarget,
}

impl UserResponseEvent {
    /// A response aimed at a known stimulus
    pub fn on_stimulus(stimulus_id: StimulusId, timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            target: ResponseTarget::Stimulus(stimulus_id),
        }
    }

    /// A response at a pointer position
    pub fn at_point(x: f32, y: f32, timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            target: ResponseTarget::Point { x, y },
        }
    }
}

/// A response matched to its stimulus. Exists only as classifier input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    pub stimulus_id: StimulusId,
    pub received_at_ms: u64,
    pub latency_ms: u64,
}

impl Response {
    pub fn new(stimulus: &Stimulus, received_at_ms: u64) -> Self {
        Self {
            stimulus_id: stimulus.id,
            received_at_ms,
            latency_ms: received_at_ms.saturating_sub(stimulus.spawn_ms),
        }
    }
}
