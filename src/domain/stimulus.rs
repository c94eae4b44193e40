//! Stimulus types
//!
//! A stimulus is spawned by the session from a generator draft, sits in the active set until
//! it is resolved exactly once, and is then dropped.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::rule::CardFace;

/// Side length of the square placement grid
pub const GRID_SIZE: u8 = 3;

/// Number of placement cells
pub const CELL_COUNT: u8 = GRID_SIZE * GRID_SIZE;

/// Card/digit values used by the attribute pools
pub const VALUES: [u8; 9] = [1, 2, 3, 4, 5, 6, 7, 8, 9];

/// Sequential per-session stimulus identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StimulusId(pub u64);

impl fmt::Display for StimulusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Whether the stimulus calls for a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StimulusCategory {
    Target,
    NonTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Circle,
    Square,
    Triangle,
    Star,
    Diamond,
}

impl Shape {
    pub const ALL: [Shape; 5] = [Shape::Circle, Shape::Square, Shape::Triangle, Shape::Star, Shape::Diamond];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
    Purple,
}

impl Color {
    pub const ALL: [Color; 5] = [Color::Red, Color::Green, Color::Blue, Color::Yellow, Color::Purple];
}

/// Visual attributes of a stimulus.
///
/// Every game reads the subset it cares about: CPT games test one predicate, sorting and card
/// games compare the card face, sequence memory uses `cell` and `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attributes {
    pub shape: Shape,
    pub color: Color,
    /// Card or digit value, 1..=9
    pub value: u8,
    /// Placement cell on the grid, row-major
    pub cell: u8,
    /// Position inside a sequence-memory round
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<u32>,
}

impl Attributes {
    /// The card face (shape, color, value) of these attributes
    pub fn face(&self) -> CardFace {
        CardFace {
            shape: self.shape,
            color: self.color,
            value: self.value,
        }
    }

    /// Center of the placement cell in unit coordinates
    pub fn cell_center(&self) -> (f32, f32) {
        let size = GRID_SIZE as f32;
        let col = (self.cell % GRID_SIZE) as f32;
        let row = (self.cell / GRID_SIZE) as f32;
        ((col + 0.5) / size, (row + 0.5) / size)
    }
}

/// Map a point in unit coordinates to its grid cell.
///
/// Returns None for points outside `[0, 1) x [0, 1)`.
pub fn cell_at(x: f32, y: f32) -> Option<u8> {
    if !(0.0..1.0).contains(&x) || !(0.0..1.0).contains(&y) {
        return None;
    }
    let size = GRID_SIZE as f32;
    let col = (x * size) as u8;
    let row = (y * size) as u8;
    Some(row * GRID_SIZE + col)
}

/// Generator output, before the session assigns an id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StimulusDraft {
    pub category: StimulusCategory,
    pub attributes: Attributes,
    pub spawn_ms: u64,
    pub expiry_ms: u64,
}

/// A live stimulus in the session's active set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stimulus {
    pub id: StimulusId,
    pub category: StimulusCategory,
    pub attributes: Attributes,
    /// Session-logical spawn time
    pub spawn_ms: u64,
    /// Inclusive response deadline in session-logical time
    pub expiry_ms: u64,
}

impl Stimulus {
    /// Create a stimulus from a generator draft
    pub fn from_draft(id: StimulusId, draft: StimulusDraft) -> Self {
        Self {
            id,
            category: draft.category,
            attributes: draft.attributes,
            spawn_ms: draft.spawn_ms,
            expiry_ms: draft.expiry_ms,
        }
    }

    pub fn is_target(&self) -> bool {
        self.category == StimulusCategory::Target
    }

    /// Returns true if a response at `at_ms` falls inside the response window.
    /// The deadline is inclusive.
    pub fn accepts_response_at(&self, at_ms: u64) -> bool {
        at_ms >= self.spawn_ms && at_ms <= self.expiry_ms
    }
}
