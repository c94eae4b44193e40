//! Response classification.

use super::rules::RuleContext;
use crate::domain::{Outcome, Response, Stimulus};

/// Maps a stimulus, an optional response and the rule context to an outcome.
///
/// Stateless. A response outside the stimulus's response window is treated as no response.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseClassifier;

impl ResponseClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, stimulus: &Stimulus, response: Option<&Response>, context: &RuleContext) -> Outcome {
        let responded = response.is_some_and(|r| stimulus.accepts_response_at(r.received_at_ms));

        match context {
            RuleContext::GoNoGo { .. } => match (stimulus.is_target(), responded) {
                (true, true) => Outcome::Hit,
                (true, false) => Outcome::Miss,
                (false, true) => Outcome::FalseAlarm,
                (false, false) => Outcome::CorrectRejection,
            },
            RuleContext::Sequence { expected_step, .. } => {
                if !responded {
                    return Outcome::Lapsed { target: true };
                }
                if stimulus.attributes.step == Some(*expected_step) {
                    Outcome::StepCorrect
                } else {
                    Outcome::StepIncorrect
                }
            }
            RuleContext::RuleSort { .. } | RuleContext::CardRule { .. } => {
                let matches = Self::matches_rule(stimulus, context);
                match (responded, matches) {
                    (true, true) => Outcome::Correct,
                    (true, false) => Outcome::Incorrect,
                    (false, _) => Outcome::Lapsed {
                        target: stimulus.is_target(),
                    },
                }
            }
        }
    }

    /// Returns true if responding to `stimulus` is the right move under `context`
    pub fn matches_rule(stimulus: &Stimulus, context: &RuleContext) -> bool {
        match context {
            RuleContext::GoNoGo { .. } => stimulus.is_target(),
            RuleContext::RuleSort { rule, key } => rule.matches(key, &stimulus.attributes.face()),
            RuleContext::Sequence { expected_step, .. } => stimulus.attributes.step == Some(*expected_step),
            RuleContext::CardRule { center, color_override } => {
                stimulus.attributes.face().playable_on(center, *color_override)
            }
        }
    }
}
