//! Game catalog and per-session game configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::rule::{SortRule, TargetPredicate};
use super::stimulus::{Color, Shape};
use crate::error::{Result, VigilError};

/// Scoring family a game belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoringFamily {
    /// Go/no-go continuous performance test
    Cpt,
    /// Sort cards by a rule that changes over time
    RuleSort,
    /// Reproduce a growing sequence of cells
    SequenceMemory,
    /// Play cards onto a center pile
    CardRule,
}

impl ScoringFamily {
    /// Returns true if the family uses periodic rule changes
    pub fn has_rule_changes(&self) -> bool {
        matches!(self, ScoringFamily::RuleSort | ScoringFamily::CardRule)
    }
}

impl fmt::Display for ScoringFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScoringFamily::Cpt => "cpt",
            ScoringFamily::RuleSort => "rule-sort",
            ScoringFamily::SequenceMemory => "sequence-memory",
            ScoringFamily::CardRule => "card-rule",
        };
        f.write_str(name)
    }
}

/// The seven mini-games
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameKind {
    /// Click stars, ignore every other shape
    StarCatch,
    /// Click green lights, hold on every other color
    GoLight,
    /// Click the digit 7, ignore the rest
    DigitWatch,
    /// Pick cards matching the key card by color or shape
    CardSort,
    /// Like card-sort, with number as a third rule
    TriSort,
    /// Tap cells in the order they lit up
    SequenceRecall,
    /// Play cards matching the center by color or value
    CardMatch,
}

impl GameKind {
    pub const ALL: [GameKind; 7] = [
        GameKind::StarCatch,
        GameKind::GoLight,
        GameKind::DigitWatch,
        GameKind::CardSort,
        GameKind::TriSort,
        GameKind::SequenceRecall,
        GameKind::CardMatch,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            GameKind::StarCatch => "star-catch",
            GameKind::GoLight => "go-light",
            GameKind::DigitWatch => "digit-watch",
            GameKind::CardSort => "card-sort",
            GameKind::TriSort => "tri-sort",
            GameKind::SequenceRecall => "sequence-recall",
            GameKind::CardMatch => "card-match",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            GameKind::StarCatch => "Star Catch",
            GameKind::GoLight => "Go Light",
            GameKind::DigitWatch => "Digit Watch",
            GameKind::CardSort => "Card Sort",
            GameKind::TriSort => "Tri Sort",
            GameKind::SequenceRecall => "Sequence Recall",
            GameKind::CardMatch => "Card Match",
        }
    }

    pub fn family(&self) -> ScoringFamily {
        match self {
            GameKind::StarCatch | GameKind::GoLight | GameKind::DigitWatch => ScoringFamily::Cpt,
            GameKind::CardSort | GameKind::TriSort => ScoringFamily::RuleSort,
            GameKind::SequenceRecall => ScoringFamily::SequenceMemory,
            GameKind::CardMatch => ScoringFamily::CardRule,
        }
    }

    /// Target predicate for CPT games
    pub fn cpt_predicate(&self) -> Option<TargetPredicate> {
        match self {
            GameKind::StarCatch => Some(TargetPredicate::Shape(Shape::Star)),
            GameKind::GoLight => Some(TargetPredicate::Color(Color::Green)),
            GameKind::DigitWatch => Some(TargetPredicate::Value(7)),
            _ => None,
        }
    }

    /// Rule cycle for rule-sort games; empty for the others
    pub fn sort_cycle(&self) -> &'static [SortRule] {
        match self {
            GameKind::CardSort => &[SortRule::Color, SortRule::Shape],
            GameKind::TriSort => &[SortRule::Color, SortRule::Shape, SortRule::Number],
            _ => &[],
        }
    }

    pub fn default_duration_sec(&self) -> u64 {
        match self.family() {
            ScoringFamily::Cpt => 60,
            ScoringFamily::RuleSort | ScoringFamily::CardRule => 90,
            ScoringFamily::SequenceMemory => 120,
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for GameKind {
    type Err = VigilError;

    fn from_str(s: &str) -> Result<Self> {
        GameKind::ALL
            .into_iter()
            .find(|kind| kind.id() == s)
            .ok_or_else(|| VigilError::UnknownGame(s.to_string()))
    }
}

/// Named difficulty level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DifficultyLevel::Easy => "easy",
            DifficultyLevel::Medium => "medium",
            DifficultyLevel::Hard => "hard",
        };
        f.write_str(name)
    }
}

impl FromStr for DifficultyLevel {
    type Err = VigilError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(DifficultyLevel::Easy),
            "medium" => Ok(DifficultyLevel::Medium),
            "hard" => Ok(DifficultyLevel::Hard),
            other => Err(VigilError::UnknownDifficulty(other.to_string())),
        }
    }
}

/// Timing parameters derived from a difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyConfig {
    pub spawn_interval_ms: u64,
    pub max_concurrent_stimuli: usize,
    pub response_deadline_ms: u64,
    pub target_probability: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_change_interval_ms: Option<u64>,
}

/// Everything a session needs to know about the game it runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    pub id: String,
    pub kind: GameKind,
    pub duration_sec: u64,
    pub spawn_interval_ms: u64,
    /// Response deadline; a stimulus expires this long after it spawns
    pub stimulus_duration_ms: u64,
    pub target_probability: f64,
    pub difficulty: DifficultyLevel,
    pub scoring_family: ScoringFamily,
    pub max_concurrent_stimuli: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_change_interval_ms: Option<u64>,
}

impl GameConfig {
    /// Build a config for a game from derived difficulty parameters
    pub fn new(kind: GameKind, level: DifficultyLevel, params: DifficultyConfig) -> Self {
        Self {
            id: kind.id().to_string(),
            kind,
            duration_sec: kind.default_duration_sec(),
            spawn_interval_ms: params.spawn_interval_ms,
            stimulus_duration_ms: params.response_deadline_ms,
            target_probability: params.target_probability,
            difficulty: level,
            scoring_family: kind.family(),
            max_concurrent_stimuli: params.max_concurrent_stimuli,
            rule_change_interval_ms: params.rule_change_interval_ms,
        }
    }

    /// Override the session duration
    pub fn with_duration_sec(mut self, duration_sec: u64) -> Self {
        self.duration_sec = duration_sec;
        self
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_sec.saturating_mul(1000)
    }

    pub fn response_deadline_ms(&self) -> u64 {
        self.stimulus_duration_ms
    }

    /// The timing parameters this config was built from
    pub fn difficulty_config(&self) -> DifficultyConfig {
        DifficultyConfig {
            spawn_interval_ms: self.spawn_interval_ms,
            max_concurrent_stimuli: self.max_concurrent_stimuli,
            response_deadline_ms: self.stimulus_duration_ms,
            target_probability: self.target_probability,
            rule_change_interval_ms: self.rule_change_interval_ms,
        }
    }

    /// Check the config before a session is created from it
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(VigilError::Config("game id must not be empty".to_string()));
        }
        if self.scoring_family != self.kind.family() {
            return Err(VigilError::Config(format!(
                "game {} belongs to the {} family, not {}",
                self.kind,
                self.kind.family(),
                self.scoring_family
            )));
        }
        if self.duration_sec == 0 {
            return Err(VigilError::Config("duration must be positive".to_string()));
        }
        if self.spawn_interval_ms == 0 {
            return Err(VigilError::Config("spawn interval must be positive".to_string()));
        }
        if self.stimulus_duration_ms == 0 {
            return Err(VigilError::Config("response deadline must be positive".to_string()));
        }
        if self.max_concurrent_stimuli == 0 {
            return Err(VigilError::Config("at least one concurrent stimulus is required".to_string()));
        }
        if !self.target_probability.is_finite() || !(0.0..=1.0).contains(&self.target_probability) {
            return Err(VigilError::Config(format!(
                "target probability {} is outside [0, 1]",
                self.target_probability
            )));
        }
        match (self.scoring_family.has_rule_changes(), self.rule_change_interval_ms) {
            (true, None) | (true, Some(0)) => {
                return Err(VigilError::Config(format!(
                    "{} requires a positive rule change interval",
                    self.kind
                )));
            }
            (false, Some(_)) => {
                return Err(VigilError::Config(format!("{} does not change rules", self.kind)));
            }
            _ => {}
        }
        Ok(())
    }
}
