//! Simulated participant for unattended sessions.
//!
//! Answers from the same snapshot a renderer would see: the active stimuli and the current
//! rule. With probability `accuracy` it does the right thing for a stimulus, otherwise the
//! opposite. Responses land roughly `reaction_ms` after a stimulus appears.

use std::collections::{BTreeMap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::domain::{GameResult, SessionState, StimulusId, UserResponseEvent};
use crate::engine::{GameSession, ResponseClassifier, RuleContext, SessionSnapshot};
use crate::error::{Result, VigilError};

pub const DEFAULT_ACCURACY: f64 = 0.85;
pub const DEFAULT_REACTION_MS: u64 = 450;

/// Scripted stand-in for a human player
#[derive(Debug, Clone)]
pub struct SimulatedParticipant {
    accuracy: f64,
    reaction_ms: u64,
    rng: StdRng,
    decided: HashSet<StimulusId>,
    planned: BTreeMap<StimulusId, u64>,
    last_sequence_answer_ms: Option<u64>,
}

impl SimulatedParticipant {
    pub fn new(accuracy: f64, reaction_ms: u64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            accuracy: accuracy.clamp(0.0, 1.0),
            reaction_ms: reaction_ms.max(1),
            rng,
            decided: HashSet::new(),
            planned: BTreeMap::new(),
            last_sequence_answer_ms: None,
        }
    }

    fn jittered_reaction(&mut self) -> u64 {
        let low = self.reaction_ms * 3 / 4;
        let high = self.reaction_ms * 5 / 4;
        if high <= low {
            return self.reaction_ms;
        }
        self.rng.random_range(low..=high)
    }

    fn acts_correctly(&mut self) -> bool {
        self.rng.random::<f64>() < self.accuracy
    }

    /// Stimuli to respond to at the snapshot's logical time, in order.
    pub fn respond_to(&mut self, snapshot: &SessionSnapshot) -> Vec<StimulusId> {
        if snapshot.state != SessionState::Playing {
            return Vec::new();
        }
        let now = snapshot.elapsed_ms;

        if let RuleContext::Sequence { expected_step, .. } = snapshot.rule {
            return self.sequence_response(snapshot, expected_step).into_iter().collect();
        }

        for stimulus in &snapshot.active_stimuli {
            if !self.decided.insert(stimulus.id) {
                continue;
            }
            let ideal = ResponseClassifier::matches_rule(stimulus, &snapshot.rule);
            let respond = if self.acts_correctly() { ideal } else { !ideal };
            let at = stimulus.spawn_ms + self.jittered_reaction();
            if respond && at <= stimulus.expiry_ms {
                self.planned.insert(stimulus.id, at);
            }
        }

        let active: HashSet<StimulusId> = snapshot.active_stimuli.iter().map(|s| s.id).collect();
        self.planned.retain(|id, _| active.contains(id));

        let mut due: Vec<(u64, StimulusId)> = self
            .planned
            .iter()
            .filter(|&(_, at)| *at <= now)
            .map(|(id, at)| (*at, *id))
            .collect();
        due.sort_unstable();
        for (_, id) in &due {
            self.planned.remove(id);
        }
        due.into_iter().map(|(_, id)| id).collect()
    }

    /// One step per reaction interval: the expected one, or a wrong one on a slip
    fn sequence_response(&mut self, snapshot: &SessionSnapshot, expected_step: u32) -> Option<StimulusId> {
        let now = snapshot.elapsed_ms;
        let expected = snapshot
            .active_stimuli
            .iter()
            .find(|s| s.attributes.step == Some(expected_step))?;
        let ready_at = match self.last_sequence_answer_ms {
            Some(last) => (last + self.reaction_ms).max(expected.spawn_ms + self.reaction_ms),
            None => expected.spawn_ms + self.reaction_ms,
        };
        if now < ready_at {
            return None;
        }
        self.last_sequence_answer_ms = Some(now);

        if self.acts_correctly() {
            return Some(expected.id);
        }
        snapshot
            .active_stimuli
            .iter()
            .find(|s| s.id != expected.id)
            .map(|s| s.id)
            .or(Some(expected.id))
    }

    /// Play a session to the end in logical time.
    pub fn play(&mut self, session: &mut GameSession) -> Result<GameResult> {
        if session.state() == SessionState::Ready {
            session.start()?;
        }
        while session.state() == SessionState::Playing {
            let snapshot = session.snapshot();
            for id in self.respond_to(&snapshot) {
                session.respond(UserResponseEvent::on_stimulus(id, snapshot.elapsed_ms))?;
            }
            session.tick()?;
        }
        debug!(session_id = %session.id(), "Simulated participant done");
        session
            .result()
            .cloned()
            .ok_or_else(|| VigilError::SessionClosed(format!("session {} ended without a result", session.id())))
    }
}

impl Default for SimulatedParticipant {
    fn default() -> Self {
        Self::new(DEFAULT_ACCURACY, DEFAULT_REACTION_MS, None)
    }
}
