//! End-to-end session behavior through the public API.

use rand::SeedableRng;
use rand::rngs::StdRng;

use vigil::VigilError;
use vigil::domain::{DifficultyLevel, GameConfig, GameKind, Outcome, SessionState, SortRule, StimulusId, UserResponseEvent};
use vigil::engine::{
    DifficultyPolicy, GameSession, RuleChange, RuleContext, ScriptedSource, SessionEvent, StaleReason, escalated,
};
use vigil::runner::SimulatedParticipant;

fn config(kind: GameKind, duration_sec: u64) -> GameConfig {
    DifficultyPolicy::default()
        .game_config(kind, DifficultyLevel::Medium)
        .with_duration_sec(duration_sec)
}

fn cpt_session(chances: Vec<bool>) -> GameSession {
    let mut config = config(GameKind::StarCatch, 10);
    config.spawn_interval_ms = 2000;
    config.stimulus_duration_ms = 1000;
    GameSession::new(config, Box::new(ScriptedSource::categories(chances))).unwrap()
}

fn resolved(events: &[SessionEvent]) -> Vec<(StimulusId, Outcome)> {
    events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::Resolved { stimulus_id, outcome } => Some((*stimulus_id, *outcome)),
            _ => None,
        })
        .collect()
}

/// Five stimuli T N T N T, responses to the first two targets only
fn play_cpt_reference(session: &mut GameSession) -> Vec<SessionEvent> {
    let mut events = session.start().unwrap();
    events.extend(session.advance_to(500).unwrap());
    events.extend(session.respond(UserResponseEvent::on_stimulus(StimulusId(0), 500)).unwrap());
    events.extend(session.advance_to(4500).unwrap());
    events.extend(session.respond(UserResponseEvent::on_stimulus(StimulusId(2), 4500)).unwrap());
    events.extend(session.advance_to(10_000).unwrap());
    events
}

#[test]
fn test_cpt_reference_session() {
    let mut session = cpt_session(vec![true, false, true, false, true]);
    let events = play_cpt_reference(&mut session);

    assert_eq!(session.state(), SessionState::Finished);
    assert_eq!(
        resolved(&events),
        vec![
            (StimulusId(0), Outcome::Hit),
            (StimulusId(1), Outcome::CorrectRejection),
            (StimulusId(2), Outcome::Hit),
            (StimulusId(3), Outcome::CorrectRejection),
            (StimulusId(4), Outcome::Miss),
        ]
    );

    let result = session.result().cloned().unwrap();
    assert_eq!(result.game_id, "star-catch");
    assert_eq!(result.duration_sec, 10);
    assert_eq!(result.total_stimuli, 5);
    assert_eq!(result.total_targets, 3);
    assert_eq!(result.total_non_targets, 2);
    assert_eq!(result.hits, 2);
    assert_eq!(result.misses, 1);
    assert_eq!(result.false_alarms, 0);
    assert_eq!(result.correct_rejections, 2);
    assert_eq!(result.average_reaction_time_ms, 500);
    assert_eq!(result.accuracy_pct, 80);
    assert_eq!(result.sensitivity_pct, 67);
    assert_eq!(result.score, 76);

    match events.last() {
        Some(SessionEvent::Finished(finished)) => assert_eq!(*finished, result),
        other => panic!("expected finish, got {:?}", other),
    }
}

#[test]
fn test_pause_does_not_change_outcome() {
    let mut reference = cpt_session(vec![true, false, true, false, true]);
    play_cpt_reference(&mut reference);

    let mut paused = cpt_session(vec![true, false, true, false, true]);
    paused.start().unwrap();
    paused.advance_to(500).unwrap();
    paused.respond(UserResponseEvent::on_stimulus(StimulusId(0), 500)).unwrap();
    paused.advance_to(3000).unwrap();
    paused.pause().unwrap();
    for _ in 0..50 {
        assert!(paused.tick().unwrap().is_empty());
    }
    assert_eq!(paused.elapsed_ms(), 3000);
    paused.resume().unwrap();
    paused.advance_to(4500).unwrap();
    paused.respond(UserResponseEvent::on_stimulus(StimulusId(2), 4500)).unwrap();
    paused.advance_to(10_000).unwrap();

    assert_eq!(paused.result(), reference.result());
}

#[test]
fn test_second_response_changes_nothing() {
    let mut session = cpt_session(vec![true]);
    session.start().unwrap();
    session.respond(UserResponseEvent::on_stimulus(StimulusId(0), 200)).unwrap();
    let before = session.stats().clone();

    let events = session.respond(UserResponseEvent::on_stimulus(StimulusId(0), 300)).unwrap();
    assert_eq!(
        events,
        vec![SessionEvent::Ignored {
            stimulus_id: Some(StimulusId(0)),
            reason: StaleReason::AlreadyResolved,
        }]
    );
    assert_eq!(*session.stats(), before);
}

#[test]
fn test_deadline_is_inclusive() {
    let mut session = cpt_session(vec![true, true]);
    session.start().unwrap();
    session.advance_to(1000).unwrap();
    let events = session.respond(UserResponseEvent::on_stimulus(StimulusId(0), 1000)).unwrap();
    assert_eq!(resolved(&events), vec![(StimulusId(0), Outcome::Hit)]);

    session.advance_to(3000).unwrap();
    let events = session.respond(UserResponseEvent::on_stimulus(StimulusId(1), 3001)).unwrap();
    assert!(resolved(&events).is_empty());
    let events = session.advance_to(3100).unwrap();
    assert_eq!(resolved(&events), vec![(StimulusId(1), Outcome::Miss)]);
}

#[test]
fn test_lifecycle_rejections() {
    let mut session = cpt_session(vec![false]);

    let events = session.respond(UserResponseEvent::on_stimulus(StimulusId(0), 0)).unwrap();
    assert!(matches!(
        events[0],
        SessionEvent::Ignored {
            reason: StaleReason::NotAccepting,
            ..
        }
    ));
    assert!(matches!(
        session.pause(),
        Err(VigilError::InvalidTransition {
            from: SessionState::Ready,
            ..
        })
    ));

    session.start().unwrap();
    session.stop().unwrap();
    assert_eq!(session.state(), SessionState::Finished);
    assert!(matches!(
        session.resume(),
        Err(VigilError::InvalidTransition {
            from: SessionState::Finished,
            ..
        })
    ));
    assert!(session.result().is_some());
}

#[test]
fn test_rule_flip_turns_pending_target_incorrect() {
    let mut config = config(GameKind::CardSort, 20);
    config.spawn_interval_ms = 2000;
    config.stimulus_duration_ms = 1500;
    config.max_concurrent_stimuli = 4;
    config.target_probability = 1.0;
    config.rule_change_interval_ms = Some(4000);
    let mut session = GameSession::new(config, Box::new(ScriptedSource::new(vec![true], vec![0]))).unwrap();

    session.start().unwrap();
    session.advance_to(500).unwrap();
    let events = session.respond(UserResponseEvent::on_stimulus(StimulusId(0), 500)).unwrap();
    assert_eq!(resolved(&events), vec![(StimulusId(0), Outcome::Correct)]);

    let events = session.advance_to(3600).unwrap();
    assert_eq!(resolved(&events), vec![(StimulusId(1), Outcome::Lapsed { target: true })]);

    let events = session.advance_to(4000).unwrap();
    assert!(events.contains(&SessionEvent::RuleChanged(RuleChange::Sort(SortRule::Shape))));
    assert!(events.iter().any(|e| matches!(e, SessionEvent::Spawned(s) if s.id == StimulusId(2))));

    session.advance_to(4100).unwrap();
    let events = session.respond(UserResponseEvent::on_stimulus(StimulusId(2), 4100)).unwrap();
    assert_eq!(resolved(&events), vec![(StimulusId(2), Outcome::Incorrect)]);
    assert!(!events.contains(&SessionEvent::Adapted));

    let stats = session.stats();
    assert_eq!(stats.correct_count, 1);
    assert_eq!(stats.incorrect_count, 1);
    assert_eq!(stats.rule_changes, 1);
    assert_eq!(stats.adaptation_events, 0);
}

#[test]
fn test_every_game_accounts_for_every_stimulus() {
    for kind in GameKind::ALL {
        for seed in 0..3u64 {
            let mut session = GameSession::new(config(kind, 30), Box::new(StdRng::seed_from_u64(seed))).unwrap();
            let mut participant = SimulatedParticipant::new(0.7, 400, Some(seed));
            let result = participant.play(&mut session).unwrap();

            assert_eq!(result.classified(), result.total_stimuli, "{} seed {}", kind, seed);
            assert_eq!(result.total_targets + result.total_non_targets, result.total_stimuli);
            assert!(result.accuracy_pct <= 100);
            assert!(result.sensitivity_pct <= 100);
            assert!(result.score >= 0);
            assert_eq!(result.duration_sec, 30);
            assert!(session.active_stimuli().next().is_none());
        }
    }
}

#[test]
fn test_same_seed_same_result() {
    let play = |seed: u64| {
        let mut session =
            GameSession::new(config(GameKind::CardMatch, 30), Box::new(StdRng::seed_from_u64(seed))).unwrap();
        SimulatedParticipant::new(0.8, 350, Some(seed)).play(&mut session).unwrap()
    };
    assert_eq!(play(11), play(11));
}

#[test]
fn test_sequence_mistake_aborts_round() {
    let mut session = GameSession::new(config(GameKind::SequenceRecall, 60), Box::new(ScriptedSource::default())).unwrap();
    session.start().unwrap();
    session.advance_to(750).unwrap();
    assert_eq!(session.active_stimuli().count(), 2);

    // step 1 chosen while step 0 is expected
    let events = session.respond(UserResponseEvent::on_stimulus(StimulusId(1), 800)).unwrap();
    assert_eq!(
        resolved(&events),
        vec![
            (StimulusId(1), Outcome::StepIncorrect),
            (StimulusId(0), Outcome::Lapsed { target: true }),
        ]
    );
    assert!(events.contains(&SessionEvent::RoundAborted));
    assert_eq!(session.active_stimuli().count(), 0);
    assert_eq!(session.stats().level, 1);
}

fn card_sort_config(spawn_interval_ms: u64, deadline_ms: u64) -> GameConfig {
    let mut config = config(GameKind::CardSort, 20);
    config.spawn_interval_ms = spawn_interval_ms;
    config.stimulus_duration_ms = deadline_ms;
    config.max_concurrent_stimuli = 4;
    config.target_probability = 1.0;
    config.rule_change_interval_ms = Some(4000);
    config
}

#[test]
fn test_response_stamped_before_rule_change_uses_old_rule() {
    let mut session =
        GameSession::new(card_sort_config(3000, 5000), Box::new(ScriptedSource::new(vec![true], vec![0]))).unwrap();
    session.start().unwrap();

    let events = session.advance_to(4000).unwrap();
    assert!(events.contains(&SessionEvent::RuleChanged(RuleChange::Sort(SortRule::Shape))));

    // stamped while the color rule was still active
    let events = session.respond(UserResponseEvent::on_stimulus(StimulusId(0), 3900)).unwrap();
    assert_eq!(resolved(&events), vec![(StimulusId(0), Outcome::Correct)]);
    assert!(!events.contains(&SessionEvent::Adapted));

    // stamped after the flip, judged by shape
    let events = session.respond(UserResponseEvent::on_stimulus(StimulusId(1), 4100)).unwrap();
    assert_eq!(resolved(&events), vec![(StimulusId(1), Outcome::Incorrect)]);

    // first correct response under the new rule, inside the window
    session.advance_to(6500).unwrap();
    let events = session.respond(UserResponseEvent::on_stimulus(StimulusId(2), 6500)).unwrap();
    assert_eq!(resolved(&events), vec![(StimulusId(2), Outcome::Correct)]);
    assert!(events.contains(&SessionEvent::Adapted));

    session.stop().unwrap();
    let stats = session.stats();
    assert_eq!(stats.correct_count, 2);
    assert_eq!(stats.incorrect_count, 1);
    assert_eq!(stats.adaptation_events, 1);

    let result = session.result().cloned().unwrap();
    assert_eq!(result.hits, 2);
    assert_eq!(result.false_alarms, 1);
    assert_eq!(result.score, 2 * 10 - 5 + 5);
    assert_eq!(result.accuracy_pct, 67);
}

#[test]
fn test_lapse_keeps_spawn_category_across_rule_change() {
    let mut session =
        GameSession::new(card_sort_config(3000, 1500), Box::new(ScriptedSource::new(vec![true], vec![0]))).unwrap();
    session.start().unwrap();

    // s1 spawns as a color target at 3000 and lapses after the flip to shape
    let events = session.advance_to(4600).unwrap();
    assert_eq!(resolved(&events).last(), Some(&(StimulusId(1), Outcome::Lapsed { target: true })));

    session.advance_to(6000).unwrap();
    session.stop().unwrap();
    let result = session.result().cloned().unwrap();
    assert_eq!(result.total_targets, 3);
    assert_eq!(result.misses, 3);
    assert_eq!(result.correct_rejections, 0);
    assert_eq!(result.hits + result.misses, result.total_targets);
    assert_eq!(result.classified(), result.total_stimuli);
}

#[test]
fn test_correct_card_play_becomes_center_and_clears_override() {
    let mut config = config(GameKind::CardMatch, 20);
    config.spawn_interval_ms = 2000;
    config.stimulus_duration_ms = 5000;
    config.target_probability = 1.0;
    config.rule_change_interval_ms = Some(3000);
    let mut session = GameSession::new(config, Box::new(ScriptedSource::new(vec![true], vec![0]))).unwrap();
    session.start().unwrap();

    let events = session.advance_to(3000).unwrap();
    let override_color = events
        .iter()
        .find_map(|e| match e {
            SessionEvent::RuleChanged(RuleChange::ColorOverride(color)) => Some(*color),
            _ => None,
        })
        .unwrap();
    match session.rule_context() {
        RuleContext::CardRule { center, color_override } => {
            assert_eq!(color_override, Some(override_color));
            assert_ne!(center.color, override_color);
        }
        other => panic!("expected card rule, got {:?}", other),
    }

    let card = session
        .active_stimuli()
        .find(|s| s.id == StimulusId(1))
        .cloned()
        .unwrap();
    let events = session.respond(UserResponseEvent::on_stimulus(card.id, 3100)).unwrap();
    assert_eq!(resolved(&events), vec![(card.id, Outcome::Correct)]);
    assert!(events.contains(&SessionEvent::Adapted));
    assert_eq!(
        session.rule_context(),
        RuleContext::CardRule {
            center: card.attributes.face(),
            color_override: None,
        }
    );
}

#[test]
fn test_completed_sequence_round_escalates_difficulty() {
    let mut session =
        GameSession::new(config(GameKind::SequenceRecall, 60), Box::new(ScriptedSource::default())).unwrap();
    let base = *session.difficulty();
    session.start().unwrap();

    let mut level_ups = Vec::new();
    for (step, at) in [(0u64, 100), (1, 800), (2, 1600)] {
        session.advance_to(at).unwrap();
        let events = session.respond(UserResponseEvent::on_stimulus(StimulusId(step), at)).unwrap();
        assert_eq!(resolved(&events), vec![(StimulusId(step), Outcome::StepCorrect)]);
        level_ups.extend(events.into_iter().filter(|e| matches!(e, SessionEvent::LevelUp(_))));
    }

    assert_eq!(level_ups, vec![SessionEvent::LevelUp(2)]);
    assert_eq!(session.stats().level, 2);
    assert_eq!(*session.difficulty(), escalated(&base, 1));
    assert!(session.difficulty().spawn_interval_ms < base.spawn_interval_ms);
    assert_eq!(session.difficulty().max_concurrent_stimuli, base.max_concurrent_stimuli + 1);
    assert_eq!(
        session.rule_context(),
        RuleContext::Sequence {
            expected_step: 0,
            presented: 0,
        }
    );
}
