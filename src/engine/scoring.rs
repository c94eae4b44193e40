//! Scoring strategies, one per scoring family.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use super::stats::SessionStats;
use crate::domain::ScoringFamily;

pub const CPT_ACCURACY_WEIGHT: f64 = 0.7;
pub const CPT_SENSITIVITY_WEIGHT: f64 = 0.3;
pub const POINTS_CORRECT: i64 = 10;
pub const PENALTY_RULE_SORT: i64 = 5;
pub const PENALTY_SEQUENCE: i64 = 5;
pub const PENALTY_CARD_RULE: i64 = 3;
pub const ADAPTATION_BONUS: i64 = 5;

/// Unrounded percentages and the final score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreCard {
    pub accuracy_pct: f64,
    pub sensitivity_pct: f64,
    pub score: i64,
}

/// Maps accumulated statistics to a score card.
pub trait ScoringStrategy: Send + Sync + Debug {
    /// Family this strategy scores
    fn family(&self) -> ScoringFamily;

    fn score(&self, stats: &SessionStats) -> ScoreCard;
}

/// `100 * part / whole`, 0 for an empty whole, clamped to [0, 100]
fn percent(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (100.0 * part as f64 / whole as f64).clamp(0.0, 100.0)
}

/// Weighted blend of accuracy and sensitivity for go/no-go games
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CptScoring {
    pub accuracy_weight: f64,
    pub sensitivity_weight: f64,
}

impl Default for CptScoring {
    fn default() -> Self {
        Self {
            accuracy_weight: CPT_ACCURACY_WEIGHT,
            sensitivity_weight: CPT_SENSITIVITY_WEIGHT,
        }
    }
}

impl ScoringStrategy for CptScoring {
    fn family(&self) -> ScoringFamily {
        ScoringFamily::Cpt
    }

    fn score(&self, stats: &SessionStats) -> ScoreCard {
        let total = stats.hits + stats.misses + stats.false_alarms + stats.correct_rejections;
        let accuracy_pct = percent(stats.hits + stats.correct_rejections, total);
        let sensitivity_pct = percent(stats.hits, stats.hits + stats.misses);
        let blended = self.accuracy_weight * accuracy_pct + self.sensitivity_weight * sensitivity_pct;
        ScoreCard {
            accuracy_pct,
            sensitivity_pct,
            score: blended.round().max(0.0) as i64,
        }
    }
}

/// Per-event point deltas for rule-sort, sequence-memory and card-rule games
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointScoring {
    family: ScoringFamily,
    points_correct: i64,
    penalty_incorrect: i64,
    adaptation_bonus: i64,
}

impl PointScoring {
    /// Default point values for a family
    pub fn new(family: ScoringFamily) -> Self {
        let penalty_incorrect = match family {
            ScoringFamily::CardRule => PENALTY_CARD_RULE,
            ScoringFamily::SequenceMemory => PENALTY_SEQUENCE,
            _ => PENALTY_RULE_SORT,
        };
        Self {
            family,
            points_correct: POINTS_CORRECT,
            penalty_incorrect,
            adaptation_bonus: ADAPTATION_BONUS,
        }
    }

    pub fn with_points_correct(mut self, points: i64) -> Self {
        self.points_correct = points;
        self
    }

    pub fn with_penalty_incorrect(mut self, penalty: i64) -> Self {
        self.penalty_incorrect = penalty;
        self
    }

    pub fn with_adaptation_bonus(mut self, bonus: i64) -> Self {
        self.adaptation_bonus = bonus;
        self
    }
}

impl ScoringStrategy for PointScoring {
    fn family(&self) -> ScoringFamily {
        self.family
    }

    fn score(&self, stats: &SessionStats) -> ScoreCard {
        let raw = stats.correct_count as i64 * self.points_correct - stats.incorrect_count as i64 * self.penalty_incorrect
            + stats.adaptation_events as i64 * self.adaptation_bonus;
        ScoreCard {
            accuracy_pct: percent(stats.correct_count, stats.correct_count + stats.incorrect_count),
            sensitivity_pct: percent(stats.correct_count, stats.correct_count + stats.lapsed_targets),
            score: raw.max(0),
        }
    }
}

/// Overridable scoring constants, as read from the app config
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringSettings {
    pub cpt_accuracy_weight: f64,
    pub cpt_sensitivity_weight: f64,
    pub points_correct: i64,
    pub penalty_rule_sort: i64,
    pub penalty_sequence: i64,
    pub penalty_card_rule: i64,
    pub adaptation_bonus: i64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            cpt_accuracy_weight: CPT_ACCURACY_WEIGHT,
            cpt_sensitivity_weight: CPT_SENSITIVITY_WEIGHT,
            points_correct: POINTS_CORRECT,
            penalty_rule_sort: PENALTY_RULE_SORT,
            penalty_sequence: PENALTY_SEQUENCE,
            penalty_card_rule: PENALTY_CARD_RULE,
            adaptation_bonus: ADAPTATION_BONUS,
        }
    }
}

impl ScoringSettings {
    /// Strategy for a family built from these settings
    pub fn strategy_for(&self, family: ScoringFamily) -> Box<dyn ScoringStrategy> {
        let penalty = match family {
            ScoringFamily::Cpt => {
                return Box::new(CptScoring {
                    accuracy_weight: self.cpt_accuracy_weight,
                    sensitivity_weight: self.cpt_sensitivity_weight,
                });
            }
            ScoringFamily::RuleSort => self.penalty_rule_sort,
            ScoringFamily::SequenceMemory => self.penalty_sequence,
            ScoringFamily::CardRule => self.penalty_card_rule,
        };
        Box::new(
            PointScoring::new(family)
                .with_points_correct(self.points_correct)
                .with_penalty_incorrect(penalty)
                .with_adaptation_bonus(self.adaptation_bonus),
        )
    }
}

/// Default strategy for a family
pub fn strategy_for(family: ScoringFamily) -> Box<dyn ScoringStrategy> {
    ScoringSettings::default().strategy_for(family)
}
