//! Terminal session result.
//!
//! The serialized field names are the contract the result store and the history view read.

use serde::{Deserialize, Serialize};

/// Immutable snapshot produced once when a session finishes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    pub game_id: String,
    #[serde(rename = "duration")]
    pub duration_sec: u64,
    pub total_stimuli: u32,
    pub total_targets: u32,
    pub total_non_targets: u32,
    pub hits: u32,
    pub misses: u32,
    pub false_alarms: u32,
    pub correct_rejections: u32,
    #[serde(rename = "averageReactionTime")]
    pub average_reaction_time_ms: u64,
    #[serde(rename = "accuracy")]
    pub accuracy_pct: u32,
    #[serde(rename = "sensitivity")]
    pub sensitivity_pct: u32,
    pub score: i64,
}

impl GameResult {
    /// Number of stimuli accounted for by the four signal-detection counters
    pub fn classified(&self) -> u32 {
        self.hits + self.misses + self.false_alarms + self.correct_rejections
    }
}
