//! Difficulty policy: named levels to timing parameters.
//!
//! The policy is a plain table. Family adjustments and per-level escalation are derived from
//! it and never mutate it.

use serde::{Deserialize, Serialize};

use crate::domain::{DifficultyConfig, DifficultyLevel, GameConfig, GameKind, ScoringFamily};

/// Steps in the first sequence-memory round.
pub const SEQUENCE_BASE_LENGTH: usize = 3;
/// Longest sequence-memory round.
pub const SEQUENCE_MAX_LENGTH: usize = 9;
/// Fastest spawn pace escalation can reach.
pub const MIN_SPAWN_INTERVAL_MS: u64 = 300;
/// Spawn interval multiplier per escalation level.
pub const ESCALATION_FACTOR: f64 = 0.9;
/// Upper bound on concurrent stimuli after escalation.
pub const MAX_CONCURRENT_STIMULI: usize = 9;

/// Difficulty table, one row per level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyPolicy {
    pub easy: DifficultyConfig,
    pub medium: DifficultyConfig,
    pub hard: DifficultyConfig,
}

impl Default for DifficultyPolicy {
    fn default() -> Self {
        Self {
            easy: DifficultyConfig {
                spawn_interval_ms: 2000,
                max_concurrent_stimuli: 3,
                response_deadline_ms: 2000,
                target_probability: 0.6,
                rule_change_interval_ms: Some(15_000),
            },
            medium: DifficultyConfig {
                spawn_interval_ms: 1500,
                max_concurrent_stimuli: 4,
                response_deadline_ms: 1500,
                target_probability: 0.5,
                rule_change_interval_ms: Some(10_000),
            },
            hard: DifficultyConfig {
                spawn_interval_ms: 1000,
                max_concurrent_stimuli: 5,
                response_deadline_ms: 1000,
                target_probability: 0.4,
                rule_change_interval_ms: Some(7_000),
            },
        }
    }
}

impl DifficultyPolicy {
    /// Raw table row for a level
    pub fn params(&self, level: DifficultyLevel) -> DifficultyConfig {
        match level {
            DifficultyLevel::Easy => self.easy,
            DifficultyLevel::Medium => self.medium,
            DifficultyLevel::Hard => self.hard,
        }
    }

    /// Table row adjusted to a scoring family.
    ///
    /// Rule changes only exist for flexibility families. Sequence memory presents every step
    /// as a target at twice the normal pace, starts with the base round length, and keeps each
    /// step answerable until a full-length round could have been presented.
    pub fn for_family(&self, level: DifficultyLevel, family: ScoringFamily) -> DifficultyConfig {
        let mut params = self.params(level);
        if !family.has_rule_changes() {
            params.rule_change_interval_ms = None;
        }
        if family == ScoringFamily::SequenceMemory {
            let pace = (params.spawn_interval_ms / 2).max(MIN_SPAWN_INTERVAL_MS);
            params.spawn_interval_ms = pace;
            params.max_concurrent_stimuli = SEQUENCE_BASE_LENGTH;
            params.target_probability = 1.0;
            params.response_deadline_ms += pace * SEQUENCE_MAX_LENGTH as u64;
        }
        params
    }

    /// Full game config for a game at a level
    pub fn game_config(&self, kind: GameKind, level: DifficultyLevel) -> GameConfig {
        GameConfig::new(kind, level, self.for_family(level, kind.family()))
    }
}

/// Derive the parameters for an escalation level (0 = base).
///
/// Each level speeds up spawning by `ESCALATION_FACTOR` and allows one more concurrent
/// stimulus.
pub fn escalated(base: &DifficultyConfig, level: u32) -> DifficultyConfig {
    let factor = ESCALATION_FACTOR.powi(level.min(64) as i32);
    let interval = ((base.spawn_interval_ms as f64) * factor).round() as u64;
    let cap = MAX_CONCURRENT_STIMULI.max(base.max_concurrent_stimuli);
    DifficultyConfig {
        spawn_interval_ms: interval.max(MIN_SPAWN_INTERVAL_MS).min(base.spawn_interval_ms),
        max_concurrent_stimuli: (base.max_concurrent_stimuli + level as usize).min(cap),
        ..*base
    }
}
