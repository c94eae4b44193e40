//! Rule primitives shared by the generator and the classifier.

use serde::{Deserialize, Serialize};

use super::stimulus::{Attributes, Color, Shape};

/// Dimension a rule-sort game currently sorts by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortRule {
    Color,
    Shape,
    Number,
}

impl SortRule {
    /// Returns true if the two faces agree on this rule's dimension
    pub fn matches(&self, a: &CardFace, b: &CardFace) -> bool {
        match self {
            SortRule::Color => a.color == b.color,
            SortRule::Shape => a.shape == b.shape,
            SortRule::Number => a.value == b.value,
        }
    }
}

/// Predicate a CPT game uses to mark targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "is")]
pub enum TargetPredicate {
    Shape(Shape),
    Color(Color),
    Value(u8),
}

impl TargetPredicate {
    pub fn matches(&self, attributes: &Attributes) -> bool {
        match self {
            TargetPredicate::Shape(shape) => attributes.shape == *shape,
            TargetPredicate::Color(color) => attributes.color == *color,
            TargetPredicate::Value(value) => attributes.value == *value,
        }
    }
}

/// Shape, color and value of a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardFace {
    pub shape: Shape,
    pub color: Color,
    pub value: u8,
}

impl CardFace {
    /// Returns true if this card can be played on `center`.
    ///
    /// A card is playable when it shows the effective color (the override when one is
    /// active, the center's color otherwise) or the center's value.
    pub fn playable_on(&self, center: &CardFace, color_override: Option<Color>) -> bool {
        let effective = color_override.unwrap_or(center.color);
        self.color == effective || self.value == center.value
    }
}
