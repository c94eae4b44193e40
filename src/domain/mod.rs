//! Domain types for Vigil
//!
//! This module contains all core domain types:
//! - Stimulus: what the participant sees and may respond to
//! - Rule primitives: sorting rules, CPT target predicates, card faces
//! - Outcome: the closed classification taxonomy
//! - Response: user input events and the derived latency record
//! - GameConfig: the per-session game parameters
//! - GameResult: the terminal record handed to the result store
//! - SessionState: the session state machine states

pub mod game;
pub mod outcome;
pub mod response;
pub mod result;
pub mod rule;
pub mod state;
pub mod stimulus;

pub use game::{DifficultyConfig, DifficultyLevel, GameConfig, GameKind, ScoringFamily};
pub use outcome::Outcome;
pub use response::{Response, ResponseTarget, UserResponseEvent};
pub use result::GameResult;
pub use rule::{CardFace, SortRule, TargetPredicate};
pub use state::SessionState;
pub use stimulus::{Attributes, CELL_COUNT, Color, GRID_SIZE, Shape, Stimulus, StimulusCategory, StimulusDraft, StimulusId, VALUES, cell_at};
