//! Stimulus generation.
//!
//! The generator is pure given its random source: the same source state, config, context and
//! timestamp always produce the same draft.

use rand::Rng;

use super::rules::RuleContext;
use crate::domain::{
    Attributes, CELL_COUNT, CardFace, Color, DifficultyConfig, GameConfig, ScoringFamily, Shape, SortRule,
    StimulusCategory, StimulusDraft, TargetPredicate, VALUES,
};

/// Source of randomness for stimulus generation and rule changes.
pub trait RandomSource: Send {
    /// Returns true with the given probability
    fn chance(&mut self, probability: f64) -> bool;

    /// Uniform index in `0..len`; `len` must be positive
    fn pick(&mut self, len: usize) -> usize;
}

impl<R: Rng + Send> RandomSource for R {
    fn chance(&mut self, probability: f64) -> bool {
        self.random::<f64>() < probability
    }

    fn pick(&mut self, len: usize) -> usize {
        if len <= 1 { 0 } else { self.random_range(0..len) }
    }
}

/// Replays fixed decisions, cycling through each list.
///
/// `chances` drive target/non-target decisions, `picks` drive every attribute choice (taken
/// modulo the pool size). Empty lists yield `false` and `0`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    chances: Vec<bool>,
    picks: Vec<usize>,
    chance_pos: usize,
    pick_pos: usize,
}

impl ScriptedSource {
    pub fn new(chances: Vec<bool>, picks: Vec<usize>) -> Self {
        Self {
            chances,
            picks,
            chance_pos: 0,
            pick_pos: 0,
        }
    }

    /// Scripted category sequence, first element of every pool
    pub fn categories(chances: Vec<bool>) -> Self {
        Self::new(chances, Vec::new())
    }
}

impl RandomSource for ScriptedSource {
    fn chance(&mut self, _probability: f64) -> bool {
        if self.chances.is_empty() {
            return false;
        }
        let value = self.chances[self.chance_pos % self.chances.len()];
        self.chance_pos += 1;
        value
    }

    fn pick(&mut self, len: usize) -> usize {
        if self.picks.is_empty() || len == 0 {
            return 0;
        }
        let value = self.picks[self.pick_pos % self.picks.len()];
        self.pick_pos += 1;
        value % len
    }
}

/// Pick any element of a non-empty pool
pub(crate) fn pick_from<T: Copy>(random: &mut dyn RandomSource, pool: &[T]) -> T {
    pool[random.pick(pool.len())]
}

/// Pick an element different from `exclude`; pools always hold at least two values
pub(crate) fn pick_other<T: Copy + PartialEq>(random: &mut dyn RandomSource, pool: &[T], exclude: T) -> T {
    let others: Vec<T> = pool.iter().copied().filter(|v| *v != exclude).collect();
    if others.is_empty() {
        return exclude;
    }
    others[random.pick(others.len())]
}

/// Pick a random card face
pub(crate) fn random_face(random: &mut dyn RandomSource) -> CardFace {
    CardFace {
        shape: pick_from(random, &Shape::ALL),
        color: pick_from(random, &Color::ALL),
        value: pick_from(random, &VALUES),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Same,
    Different,
    Any,
}

/// Produces stimulus drafts whose attributes unambiguously satisfy or violate the target
/// predicate of the current rule context.
#[derive(Debug, Clone, Copy, Default)]
pub struct StimulusGenerator;

impl StimulusGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Draft the next stimulus spawning at `now_ms`
    pub fn next(
        &self,
        config: &GameConfig,
        difficulty: &DifficultyConfig,
        context: &RuleContext,
        now_ms: u64,
        random: &mut dyn RandomSource,
    ) -> StimulusDraft {
        let category = if config.scoring_family == ScoringFamily::SequenceMemory
            || random.chance(difficulty.target_probability)
        {
            StimulusCategory::Target
        } else {
            StimulusCategory::NonTarget
        };
        let target = category == StimulusCategory::Target;

        let attributes = match context {
            RuleContext::GoNoGo { predicate } => Self::cpt_attributes(*predicate, target, random),
            RuleContext::RuleSort { rule, key } => Self::sort_attributes(*rule, key, target, random),
            RuleContext::Sequence { presented, .. } => Self::sequence_attributes(*presented, random),
            RuleContext::CardRule { center, color_override } => {
                Self::card_attributes(center, *color_override, target, random)
            }
        };

        StimulusDraft {
            category,
            attributes,
            spawn_ms: now_ms,
            expiry_ms: now_ms + difficulty.response_deadline_ms,
        }
    }

    fn cpt_attributes(predicate: TargetPredicate, target: bool, random: &mut dyn RandomSource) -> Attributes {
        let shape = match predicate {
            TargetPredicate::Shape(s) if target => s,
            TargetPredicate::Shape(s) => pick_other(random, &Shape::ALL, s),
            _ => pick_from(random, &Shape::ALL),
        };
        let color = match predicate {
            TargetPredicate::Color(c) if target => c,
            TargetPredicate::Color(c) => pick_other(random, &Color::ALL, c),
            _ => pick_from(random, &Color::ALL),
        };
        let value = match predicate {
            TargetPredicate::Value(v) if target => v,
            TargetPredicate::Value(v) => pick_other(random, &VALUES, v),
            _ => pick_from(random, &VALUES),
        };
        Attributes {
            shape,
            color,
            value,
            cell: random.pick(CELL_COUNT as usize) as u8,
            step: None,
        }
    }

    /// Targets match the key on the active dimension only, so any rule change turns them
    /// into non-matches. Non-targets differ on the active dimension and are free elsewhere.
    fn sort_attributes(rule: SortRule, key: &CardFace, target: bool, random: &mut dyn RandomSource) -> Attributes {
        let shape = match Self::dimension_choice(rule, SortRule::Shape, target) {
            Choice::Same => key.shape,
            Choice::Different => pick_other(random, &Shape::ALL, key.shape),
            Choice::Any => pick_from(random, &Shape::ALL),
        };
        let color = match Self::dimension_choice(rule, SortRule::Color, target) {
            Choice::Same => key.color,
            Choice::Different => pick_other(random, &Color::ALL, key.color),
            Choice::Any => pick_from(random, &Color::ALL),
        };
        let value = match Self::dimension_choice(rule, SortRule::Number, target) {
            Choice::Same => key.value,
            Choice::Different => pick_other(random, &VALUES, key.value),
            Choice::Any => pick_from(random, &VALUES),
        };
        Attributes {
            shape,
            color,
            value,
            cell: random.pick(CELL_COUNT as usize) as u8,
            step: None,
        }
    }

    /// Per-dimension choice for rule-sort attributes
    fn dimension_choice(active: SortRule, dimension: SortRule, target: bool) -> Choice {
        match (target, dimension == active) {
            (true, true) => Choice::Same,
            (true, false) | (false, true) => Choice::Different,
            (false, false) => Choice::Any,
        }
    }

    fn sequence_attributes(presented: u32, random: &mut dyn RandomSource) -> Attributes {
        let cell = random.pick(CELL_COUNT as usize) as u8;
        Attributes {
            shape: Shape::Square,
            color: pick_from(random, &Color::ALL),
            value: cell + 1,
            cell,
            step: Some(presented),
        }
    }

    fn card_attributes(
        center: &CardFace,
        color_override: Option<Color>,
        target: bool,
        random: &mut dyn RandomSource,
    ) -> Attributes {
        let effective = color_override.unwrap_or(center.color);
        let (color, value) = if !target {
            (
                pick_other(random, &Color::ALL, effective),
                pick_other(random, &VALUES, center.value),
            )
        } else if random.pick(2) == 0 {
            (effective, pick_from(random, &VALUES))
        } else {
            (pick_from(random, &Color::ALL), center.value)
        };
        Attributes {
            shape: pick_from(random, &Shape::ALL),
            color,
            value,
            cell: random.pick(CELL_COUNT as usize) as u8,
            step: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DifficultyLevel, GameKind};
    use crate::engine::difficulty::DifficultyPolicy;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn config(kind: GameKind) -> GameConfig {
        DifficultyPolicy::default().game_config(kind, DifficultyLevel::Medium)
    }

    fn key() -> CardFace {
        CardFace {
            shape: Shape::Circle,
            color: Color::Red,
            value: 1,
        }
    }

    #[test]
    fn test_scripted_source_cycles() {
        let mut source = ScriptedSource::new(vec![true, false], vec![1, 4]);
        assert!(source.chance(0.0));
        assert!(!source.chance(1.0));
        assert!(source.chance(0.5));
        assert_eq!(source.pick(3), 1);
        assert_eq!(source.pick(3), 1); // 4 % 3
        assert_eq!(source.pick(10), 1);
    }

    #[test]
    fn test_scripted_source_empty_defaults() {
        let mut source = ScriptedSource::default();
        assert!(!source.chance(1.0));
        assert_eq!(source.pick(5), 0);
    }

    #[test]
    fn test_rng_source_respects_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            assert!(rng.pick(5) < 5);
        }
        assert!(!rng.chance(0.0));
        assert!(rng.chance(1.0));
    }

    #[test]
    fn test_scripted_categories_follow_chances() {
        let cfg = config(GameKind::StarCatch);
        let context = RuleContext::GoNoGo {
            predicate: TargetPredicate::Shape(Shape::Star),
        };
        let mut source = ScriptedSource::categories(vec![true, false, true]);
        let generator = StimulusGenerator::new();
        let categories: Vec<_> = (0..3)
            .map(|i| {
                generator
                    .next(&cfg, &cfg.difficulty_config(), &context, i * 1000, &mut source)
                    .category
            })
            .collect();
        assert_eq!(
            categories,
            vec![StimulusCategory::Target, StimulusCategory::NonTarget, StimulusCategory::Target]
        );
    }

    #[test]
    fn test_draft_timestamps() {
        let cfg = config(GameKind::GoLight);
        let context = RuleContext::GoNoGo {
            predicate: TargetPredicate::Color(Color::Green),
        };
        let mut source = ScriptedSource::default();
        let draft = StimulusGenerator::new().next(&cfg, &cfg.difficulty_config(), &context, 3000, &mut source);
        assert_eq!(draft.spawn_ms, 3000);
        assert_eq!(draft.expiry_ms, 3000 + cfg.stimulus_duration_ms);
    }

    #[test]
    fn test_cpt_drafts_agree_with_predicate() {
        let generator = StimulusGenerator::new();
        let mut rng = StdRng::seed_from_u64(42);
        for kind in [GameKind::StarCatch, GameKind::GoLight, GameKind::DigitWatch] {
            let cfg = config(kind);
            let predicate = kind.cpt_predicate().unwrap();
            let context = RuleContext::GoNoGo { predicate };
            for _ in 0..200 {
                let draft = generator.next(&cfg, &cfg.difficulty_config(), &context, 0, &mut rng);
                let is_target = draft.category == StimulusCategory::Target;
                assert_eq!(predicate.matches(&draft.attributes), is_target);
                assert!(draft.attributes.cell < CELL_COUNT);
            }
        }
    }

    #[test]
    fn test_sort_targets_match_only_active_dimension() {
        let mut rng = StdRng::seed_from_u64(3);
        for rule in [SortRule::Color, SortRule::Shape, SortRule::Number] {
            for _ in 0..100 {
                let attributes = StimulusGenerator::sort_attributes(rule, &key(), true, &mut rng);
                let face = attributes.face();
                for dimension in [SortRule::Color, SortRule::Shape, SortRule::Number] {
                    assert_eq!(dimension.matches(&key(), &face), dimension == rule);
                }
            }
        }
    }

    #[test]
    fn test_sort_non_targets_miss_active_dimension() {
        let mut rng = StdRng::seed_from_u64(4);
        for rule in [SortRule::Color, SortRule::Shape, SortRule::Number] {
            for _ in 0..100 {
                let attributes = StimulusGenerator::sort_attributes(rule, &key(), false, &mut rng);
                assert!(!rule.matches(&key(), &attributes.face()));
            }
        }
    }

    #[test]
    fn test_card_drafts_agree_with_playability() {
        let generator = StimulusGenerator::new();
        let cfg = config(GameKind::CardMatch);
        let mut rng = StdRng::seed_from_u64(9);
        for color_override in [None, Some(Color::Yellow)] {
            let context = RuleContext::CardRule {
                center: key(),
                color_override,
            };
            for _ in 0..200 {
                let draft = generator.next(&cfg, &cfg.difficulty_config(), &context, 0, &mut rng);
                let playable = draft.attributes.face().playable_on(&key(), color_override);
                assert_eq!(playable, draft.category == StimulusCategory::Target);
            }
        }
    }

    #[test]
    fn test_sequence_drafts_are_numbered_targets() {
        let generator = StimulusGenerator::new();
        let cfg = config(GameKind::SequenceRecall);
        let mut rng = StdRng::seed_from_u64(11);
        let context = RuleContext::Sequence {
            expected_step: 0,
            presented: 2,
        };
        let draft = generator.next(&cfg, &cfg.difficulty_config(), &context, 0, &mut rng);
        assert_eq!(draft.category, StimulusCategory::Target);
        assert_eq!(draft.attributes.step, Some(2));
        assert_eq!(draft.attributes.value, draft.attributes.cell + 1);
    }
}
