//! Trial engine
//!
//! Leaves first:
//! - difficulty: level tables and escalation
//! - generator: stimulus drafts from an injectable random source
//! - classifier: stimulus + response + rule context to outcome
//! - scoring: one strategy per scoring family
//! - stats: running counters
//! - clock: the single logical tick source
//! - session: the state machine tying them together

pub mod classifier;
pub mod clock;
pub mod difficulty;
pub mod generator;
pub mod rules;
pub mod scoring;
pub mod session;
pub mod stats;

pub use classifier::ResponseClassifier;
pub use clock::{ClockEvent, ClockPhase, ClockSnapshot, DEFAULT_TICK_MS, TrialClock};
pub use difficulty::{DifficultyPolicy, escalated};
pub use generator::{RandomSource, ScriptedSource, StimulusGenerator};
pub use rules::{ADAPTATION_WINDOW_MS, RuleChange, RuleContext, RuleState};
pub use scoring::{CptScoring, PointScoring, ScoreCard, ScoringSettings, ScoringStrategy, strategy_for};
pub use session::{Command, GameSession, SessionEvent, SessionSnapshot, StaleReason};
pub use stats::{SessionStats, StatsAccumulator};
