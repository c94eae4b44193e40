//! Running session statistics.

use serde::Serialize;

use crate::domain::{Outcome, StimulusCategory};

/// Counters folded from every resolved stimulus
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub spawned: u32,
    pub targets: u32,
    pub non_targets: u32,
    pub hits: u32,
    pub misses: u32,
    pub false_alarms: u32,
    pub correct_rejections: u32,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub lapsed_targets: u32,
    pub lapsed_non_targets: u32,
    /// Stimuli still active when the session finished
    pub force_resolved: u32,
    pub reaction_times_ms: Vec<u64>,
    pub rule_changes: u32,
    pub adaptation_events: u32,
    pub level: u32,
}

impl SessionStats {
    /// Mean of recorded reaction times, rounded; 0 when none were recorded
    pub fn average_reaction_time_ms(&self) -> u64 {
        if self.reaction_times_ms.is_empty() {
            return 0;
        }
        let total: u64 = self.reaction_times_ms.iter().sum();
        let count = self.reaction_times_ms.len() as u64;
        (total + count / 2) / count
    }

    /// Number of stimuli that have been resolved so far
    pub fn resolved(&self) -> u32 {
        self.hits
            + self.misses
            + self.false_alarms
            + self.correct_rejections
            + self.correct_count
            + self.incorrect_count
            + self.lapsed_targets
            + self.lapsed_non_targets
    }

    pub fn lapsed(&self) -> u32 {
        self.lapsed_targets + self.lapsed_non_targets
    }
}

/// O(1) folding of outcomes into `SessionStats`.
#[derive(Debug, Clone)]
pub struct StatsAccumulator {
    stats: SessionStats,
}

impl Default for StatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsAccumulator {
    pub fn new() -> Self {
        Self {
            stats: SessionStats {
                level: 1,
                ..SessionStats::default()
            },
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn record_spawn(&mut self, category: StimulusCategory) {
        self.stats.spawned += 1;
        match category {
            StimulusCategory::Target => self.stats.targets += 1,
            StimulusCategory::NonTarget => self.stats.non_targets += 1,
        }
    }

    /// Fold one outcome. Latency is kept only for outcomes that carry a meaningful one.
    pub fn apply(&mut self, outcome: Outcome, latency_ms: Option<u64>) {
        let stats = &mut self.stats;
        match outcome {
            Outcome::Hit => stats.hits += 1,
            Outcome::Miss => stats.misses += 1,
            Outcome::FalseAlarm => stats.false_alarms += 1,
            Outcome::CorrectRejection => stats.correct_rejections += 1,
            Outcome::Correct | Outcome::StepCorrect => stats.correct_count += 1,
            Outcome::Incorrect | Outcome::StepIncorrect => stats.incorrect_count += 1,
            Outcome::Lapsed { target: true } => stats.lapsed_targets += 1,
            Outcome::Lapsed { target: false } => stats.lapsed_non_targets += 1,
        }
        if outcome.records_latency()
            && let Some(latency) = latency_ms
        {
            stats.reaction_times_ms.push(latency);
        }
    }

    pub fn record_force_resolved(&mut self) {
        self.stats.force_resolved += 1;
    }

    pub fn record_rule_change(&mut self) {
        self.stats.rule_changes += 1;
    }

    pub fn record_adaptation(&mut self) {
        self.stats.adaptation_events += 1;
    }

    pub fn set_level(&mut self, level: u32) {
        self.stats.level = level;
    }

    /// Owned copy of the current statistics
    pub fn snapshot(&self) -> SessionStats {
        self.stats.clone()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }
}
