//! Rule state per game family.
//!
//! `RuleState` is the mutable half, owned by the session. `RuleContext` is the copy the
//! generator and classifier read, taken at spawn or response time.

use serde::Serialize;

use super::difficulty::{SEQUENCE_BASE_LENGTH, SEQUENCE_MAX_LENGTH};
use super::generator::{RandomSource, pick_other, random_face};
use crate::domain::{CardFace, Color, GameKind, ScoringFamily, Shape, SortRule, TargetPredicate};

/// How long after a rule change a correct response counts as adaptation.
pub const ADAPTATION_WINDOW_MS: u64 = 3000;

/// Rule snapshot the generator and classifier evaluate against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "family")]
pub enum RuleContext {
    /// CPT: fixed predicate for the whole session
    GoNoGo { predicate: TargetPredicate },
    /// Rule-sort: match the key card on the active dimension
    RuleSort { rule: SortRule, key: CardFace },
    /// Sequence memory: the step the participant must pick next, and how many were shown
    #[serde(rename_all = "camelCase")]
    Sequence { expected_step: u32, presented: u32 },
    /// Card-rule: play onto the center, honoring any color override
    #[serde(rename_all = "camelCase")]
    CardRule {
        center: CardFace,
        color_override: Option<Color>,
    },
}

/// What a rule change tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleChange {
    Sort(SortRule),
    ColorOverride(Color),
}

/// Progress through a sequence-memory round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Round {
    length: u32,
    presented: u32,
    expected_step: u32,
}

impl Round {
    fn new(length: u32) -> Self {
        Self {
            length,
            presented: 0,
            expected_step: 0,
        }
    }
}

/// Mutable rule state of one session
#[derive(Debug, Clone)]
pub struct RuleState {
    kind: GameKind,
    sort_index: usize,
    key: CardFace,
    center: CardFace,
    color_override: Option<Color>,
    level: u32,
    round: Round,
    last_change_ms: Option<u64>,
    /// Context in force until the last rule change
    previous: Option<RuleContext>,
    adaptation_open: bool,
}

impl RuleState {
    /// Fresh rule state; key and center cards are drawn from `random`
    pub fn new(kind: GameKind, random: &mut dyn RandomSource) -> Self {
        let (key, center) = match kind.family() {
            ScoringFamily::RuleSort => {
                let key = random_face(random);
                (key, key)
            }
            ScoringFamily::CardRule => {
                let center = random_face(random);
                (center, center)
            }
            _ => (BLANK_FACE, BLANK_FACE),
        };
        Self {
            kind,
            sort_index: 0,
            key,
            center,
            color_override: None,
            level: 1,
            round: Round::new(round_length(1)),
            last_change_ms: None,
            previous: None,
            adaptation_open: false,
        }
    }

    /// Context to evaluate stimuli against right now
    pub fn context(&self) -> RuleContext {
        match self.kind.family() {
            ScoringFamily::Cpt => RuleContext::GoNoGo {
                predicate: self.kind.cpt_predicate().unwrap_or(TargetPredicate::Value(7)),
            },
            ScoringFamily::RuleSort => RuleContext::RuleSort {
                rule: self.active_sort_rule(),
                key: self.key,
            },
            ScoringFamily::SequenceMemory => RuleContext::Sequence {
                expected_step: self.round.expected_step,
                presented: self.round.presented,
            },
            ScoringFamily::CardRule => RuleContext::CardRule {
                center: self.center,
                color_override: self.color_override,
            },
        }
    }

    /// Context a response stamped at `at_ms` is judged under.
    ///
    /// A stamp earlier than the last rule change belongs to the rule before it.
    pub fn context_at(&self, at_ms: u64) -> RuleContext {
        match (self.last_change_ms, self.previous) {
            (Some(changed), Some(previous)) if at_ms < changed => previous,
            _ => self.context(),
        }
    }

    fn active_sort_rule(&self) -> SortRule {
        let cycle = self.kind.sort_cycle();
        if cycle.is_empty() {
            SortRule::Color
        } else {
            cycle[self.sort_index % cycle.len()]
        }
    }

    /// Returns true if the family allows another stimulus to be presented
    pub fn can_present(&self) -> bool {
        match self.kind.family() {
            ScoringFamily::SequenceMemory => self.round.presented < self.round.length,
            _ => true,
        }
    }

    /// Record that a stimulus was presented
    pub fn on_spawn(&mut self) {
        if self.kind.family() == ScoringFamily::SequenceMemory {
            self.round.presented += 1;
        }
    }

    /// Apply a rule change tick. Returns None for families without rule changes.
    pub fn change_rule(&mut self, now_ms: u64, random: &mut dyn RandomSource) -> Option<RuleChange> {
        let before = self.context();
        let change = match self.kind.family() {
            ScoringFamily::RuleSort => {
                let cycle = self.kind.sort_cycle();
                if cycle.is_empty() {
                    return None;
                }
                self.sort_index = (self.sort_index + 1) % cycle.len();
                RuleChange::Sort(self.active_sort_rule())
            }
            ScoringFamily::CardRule => {
                let color = pick_other(random, &Color::ALL, self.center.color);
                self.color_override = Some(color);
                RuleChange::ColorOverride(color)
            }
            _ => return None,
        };
        self.last_change_ms = Some(now_ms);
        self.previous = Some(before);
        self.adaptation_open = true;
        Some(change)
    }

    /// Consume the adaptation window on a correct response.
    ///
    /// Returns true only for the first correct response within `ADAPTATION_WINDOW_MS` of the
    /// last rule change. The window closes on the first correct response stamped after the
    /// change; earlier stamps leave it open.
    pub fn take_adaptation(&mut self, at_ms: u64) -> bool {
        let Some(changed) = self.last_change_ms else {
            return false;
        };
        if !self.adaptation_open || at_ms < changed {
            return false;
        }
        self.adaptation_open = false;
        at_ms - changed <= ADAPTATION_WINDOW_MS
    }

    /// A correct card play becomes the new center and clears the override
    pub fn play_card(&mut self, face: CardFace) {
        self.center = face;
        self.color_override = None;
    }

    /// Advance past a correct step. Returns true if the round is complete.
    pub fn advance_step(&mut self) -> bool {
        self.round.expected_step += 1;
        self.round.expected_step >= self.round.length
    }

    /// Raise the level and start a longer round. Returns the new level.
    pub fn level_up(&mut self) -> u32 {
        self.level += 1;
        self.round = Round::new(round_length(self.level));
        self.level
    }

    /// Restart the current round from its first step
    pub fn abort_round(&mut self) {
        self.round = Round::new(self.round.length);
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn round_length(&self) -> u32 {
        self.round.length
    }
}

/// Steps in a sequence-memory round at `level`
fn round_length(level: u32) -> u32 {
    let base = SEQUENCE_BASE_LENGTH as u32 - 1;
    (level + base).min(SEQUENCE_MAX_LENGTH as u32)
}

/// Key and center for families that never read them
const BLANK_FACE: CardFace = CardFace {
    shape: Shape::Circle,
    color: Color::Red,
    value: 1,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::generator::ScriptedSource;

    fn state(kind: GameKind) -> RuleState {
        RuleState::new(kind, &mut ScriptedSource::default())
    }

    #[test]
    fn test_scripted_key_is_first_of_each_pool() {
        let rules = state(GameKind::CardSort);
        assert_eq!(
            rules.context(),
            RuleContext::RuleSort {
                rule: SortRule::Color,
                key: CardFace {
                    shape: Shape::Circle,
                    color: Color::Red,
                    value: 1,
                },
            }
        );
    }

    #[test]
    fn test_cpt_context_uses_game_predicate() {
        let rules = state(GameKind::DigitWatch);
        assert_eq!(
            rules.context(),
            RuleContext::GoNoGo {
                predicate: TargetPredicate::Value(7)
            }
        );
    }

    #[test]
    fn test_sort_rule_cycles() {
        let mut rules = state(GameKind::TriSort);
        let mut random = ScriptedSource::default();
        assert_eq!(rules.change_rule(1000, &mut random), Some(RuleChange::Sort(SortRule::Shape)));
        assert_eq!(rules.change_rule(2000, &mut random), Some(RuleChange::Sort(SortRule::Number)));
        assert_eq!(rules.change_rule(3000, &mut random), Some(RuleChange::Sort(SortRule::Color)));
    }

    #[test]
    fn test_cpt_and_sequence_have_no_rule_changes() {
        let mut random = ScriptedSource::default();
        assert_eq!(state(GameKind::StarCatch).change_rule(1000, &mut random), None);
        assert_eq!(state(GameKind::SequenceRecall).change_rule(1000, &mut random), None);
    }

    #[test]
    fn test_color_override_differs_from_center() {
        let mut rules = state(GameKind::CardMatch);
        let mut random = ScriptedSource::default();
        let change = rules.change_rule(1000, &mut random).unwrap();
        assert_eq!(change, RuleChange::ColorOverride(Color::Green));
        match rules.context() {
            RuleContext::CardRule { center, color_override } => {
                assert_eq!(center.color, Color::Red);
                assert_eq!(color_override, Some(Color::Green));
            }
            other => panic!("unexpected context {:?}", other),
        }
    }

    #[test]
    fn test_play_card_clears_override() {
        let mut rules = state(GameKind::CardMatch);
        rules.change_rule(1000, &mut ScriptedSource::default());
        let face = CardFace {
            shape: Shape::Star,
            color: Color::Green,
            value: 4,
        };
        rules.play_card(face);
        assert_eq!(
            rules.context(),
            RuleContext::CardRule {
                center: face,
                color_override: None
            }
        );
    }

    #[test]
    fn test_adaptation_window() {
        let mut rules = state(GameKind::CardSort);
        assert!(!rules.take_adaptation(500));

        rules.change_rule(1000, &mut ScriptedSource::default());
        assert!(rules.take_adaptation(4000));
        // only the first correct response counts
        assert!(!rules.take_adaptation(4100));

        rules.change_rule(10_000, &mut ScriptedSource::default());
        assert!(!rules.take_adaptation(13_001));
        assert!(!rules.take_adaptation(13_100));
    }

    #[test]
    fn test_back_dated_correct_response_keeps_window_open() {
        let mut rules = state(GameKind::CardSort);
        rules.change_rule(4000, &mut ScriptedSource::default());
        assert!(!rules.take_adaptation(3900));
        assert!(rules.take_adaptation(4200));
    }

    #[test]
    fn test_context_at_uses_rule_before_change() {
        let mut rules = state(GameKind::CardSort);
        let before = rules.context();
        assert_eq!(rules.context_at(0), before);

        rules.change_rule(4000, &mut ScriptedSource::default());
        let after = rules.context();
        assert_ne!(before, after);
        assert_eq!(rules.context_at(3999), before);
        assert_eq!(rules.context_at(4000), after);
        assert_eq!(rules.context_at(4100), after);
    }

    #[test]
    fn test_sequence_round_progress() {
        let mut rules = state(GameKind::SequenceRecall);
        assert_eq!(rules.level(), 1);
        assert_eq!(rules.round_length(), 3);

        for _ in 0..3 {
            assert!(rules.can_present());
            rules.on_spawn();
        }
        assert!(!rules.can_present());
        assert_eq!(
            rules.context(),
            RuleContext::Sequence {
                expected_step: 0,
                presented: 3
            }
        );

        assert!(!rules.advance_step());
        assert!(!rules.advance_step());
        assert!(rules.advance_step());
        assert_eq!(rules.level_up(), 2);
        assert_eq!(rules.round_length(), 4);
        assert!(rules.can_present());
    }

    #[test]
    fn test_abort_round_keeps_length() {
        let mut rules = state(GameKind::SequenceRecall);
        rules.on_spawn();
        rules.on_spawn();
        rules.advance_step();
        rules.abort_round();
        assert_eq!(
            rules.context(),
            RuleContext::Sequence {
                expected_step: 0,
                presented: 0
            }
        );
        assert_eq!(rules.round_length(), 3);
    }

    #[test]
    fn test_round_length_is_capped() {
        let mut rules = state(GameKind::SequenceRecall);
        for _ in 0..20 {
            rules.level_up();
        }
        assert_eq!(rules.round_length(), SEQUENCE_MAX_LENGTH as u32);
    }
}
