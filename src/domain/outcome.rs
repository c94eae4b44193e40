//! Response outcome taxonomy.
//!
//! One closed enum covers every scoring family; each family only ever produces its own
//! variants plus `Lapsed` for stimuli that leave the active set unanswered.

use serde::{Deserialize, Serialize};

/// Outcome of resolving one stimulus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    /// CPT: target answered within the deadline
    Hit,
    /// CPT: target not answered by the deadline
    Miss,
    /// CPT: non-target answered
    FalseAlarm,
    /// CPT: non-target correctly withheld
    CorrectRejection,
    /// Rule-sort / card-rule: response agreed with the active rule
    Correct,
    /// Rule-sort / card-rule: response violated the active rule
    Incorrect,
    /// Sequence memory: the expected step was chosen
    StepCorrect,
    /// Sequence memory: a wrong step was chosen; ends the round
    StepIncorrect,
    /// Non-CPT families: no response before the stimulus left the active set
    Lapsed { target: bool },
}

impl Outcome {
    /// Returns true if reaction time is meaningful for this outcome
    pub fn records_latency(&self) -> bool {
        matches!(self, Outcome::Hit | Outcome::Correct | Outcome::StepCorrect)
    }

    /// Returns true if the participant did the right thing
    pub fn is_correct(&self) -> bool {
        matches!(
            self,
            Outcome::Hit | Outcome::CorrectRejection | Outcome::Correct | Outcome::StepCorrect
        )
    }

    /// Returns true if this outcome ends a sequence-memory round
    pub fn terminates_round(&self) -> bool {
        matches!(self, Outcome::StepIncorrect | Outcome::Lapsed { .. })
    }
}
