//! Game session - the state machine that owns a running game
//!
//! Every mutation goes through `GameSession::handle`: clock ticks, responses and lifecycle
//! transitions are applied one at a time, in the order they arrive. A stimulus leaves the
//! active set exactly once; removal from the set is what makes a second resolution a no-op.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::classifier::ResponseClassifier;
use super::clock::{ClockEvent, DEFAULT_TICK_MS, TrialClock};
use super::difficulty::escalated;
use super::generator::{RandomSource, StimulusGenerator};
use super::rules::{RuleChange, RuleContext, RuleState};
use super::scoring::{ScoringStrategy, strategy_for};
use super::stats::{SessionStats, StatsAccumulator};
use crate::domain::{
    DifficultyConfig, GameConfig, GameResult, Outcome, Response, ResponseTarget, ScoringFamily, SessionState,
    Stimulus, StimulusId, UserResponseEvent, cell_at,
};
use crate::error::{Result, VigilError};
use crate::id::generate_session_id;

/// Inputs to the session's serialized handler
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Start,
    /// Advance the clock one logical step
    Tick,
    Respond(UserResponseEvent),
    Pause,
    Resume,
    Stop,
}

/// Why an input was dropped without touching statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StaleReason {
    /// No stimulus with this id was ever spawned
    UnknownStimulus,
    /// The stimulus was already resolved
    AlreadyResolved,
    /// Response stamped after the deadline
    Late,
    /// Response stamped before the stimulus appeared
    BeforeSpawn,
    /// Pointer hit no active stimulus
    NoStimulusAtPoint,
    /// Session is not accepting responses right now
    NotAccepting,
}

/// What a command did, in order
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Started,
    Spawned(Stimulus),
    Resolved { stimulus_id: StimulusId, outcome: Outcome },
    Ignored {
        stimulus_id: Option<StimulusId>,
        reason: StaleReason,
    },
    RuleChanged(RuleChange),
    Adapted,
    LevelUp(u32),
    RoundAborted,
    Paused,
    Resumed,
    Finished(GameResult),
}

/// Read-only view of a session for rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: String,
    pub game_id: String,
    pub state: SessionState,
    pub elapsed_ms: u64,
    pub remaining_sec: u64,
    pub active_stimuli: Vec<Stimulus>,
    pub live_stats: SessionStats,
    pub rule: RuleContext,
    pub level: u32,
}

/// One game session from `ready` to `finished`.
pub struct GameSession {
    id: String,
    config: GameConfig,
    base_difficulty: DifficultyConfig,
    difficulty: DifficultyConfig,
    state: SessionState,
    clock: TrialClock,
    generator: StimulusGenerator,
    classifier: ResponseClassifier,
    scoring: Box<dyn ScoringStrategy>,
    random: Box<dyn RandomSource>,
    rules: RuleState,
    stats: StatsAccumulator,
    active: BTreeMap<StimulusId, Stimulus>,
    next_id: u64,
    result: Option<GameResult>,
}

impl GameSession {
    /// Create a session in the `ready` state. Fails if the config does not validate.
    pub fn new(config: GameConfig, mut random: Box<dyn RandomSource>) -> Result<Self> {
        config.validate()?;
        let difficulty = config.difficulty_config();
        let clock = TrialClock::new(
            DEFAULT_TICK_MS,
            config.duration_ms(),
            difficulty.spawn_interval_ms,
            difficulty.rule_change_interval_ms,
        );
        let rules = RuleState::new(config.kind, random.as_mut());
        let id = generate_session_id();
        debug!(session_id = %id, game_id = %config.id, difficulty = %config.difficulty, "Session created");
        Ok(Self {
            id,
            scoring: strategy_for(config.scoring_family),
            config,
            base_difficulty: difficulty,
            difficulty,
            state: SessionState::Ready,
            clock,
            generator: StimulusGenerator::new(),
            classifier: ResponseClassifier::new(),
            random,
            rules,
            stats: StatsAccumulator::new(),
            active: BTreeMap::new(),
            next_id: 0,
            result: None,
        })
    }

    /// Replace the scoring strategy. The strategy must score this game's family.
    pub fn with_scoring(mut self, scoring: Box<dyn ScoringStrategy>) -> Result<Self> {
        if scoring.family() != self.config.scoring_family {
            return Err(VigilError::Config(format!(
                "{} scoring cannot score {} ({})",
                scoring.family(),
                self.config.kind,
                self.config.scoring_family
            )));
        }
        self.scoring = scoring;
        Ok(self)
    }

    /// Use a different logical step. Only allowed before the session starts.
    pub fn with_tick_ms(mut self, tick_ms: u64) -> Result<Self> {
        if tick_ms == 0 {
            return Err(VigilError::Config("tick must be positive".to_string()));
        }
        if self.state != SessionState::Ready {
            return Err(VigilError::InvalidTransition {
                from: self.state,
                action: "retime",
            });
        }
        self.clock = TrialClock::new(
            tick_ms,
            self.config.duration_ms(),
            self.difficulty.spawn_interval_ms,
            self.difficulty.rule_change_interval_ms,
        );
        Ok(self)
    }

    /// Apply one command and return what happened.
    ///
    /// Lifecycle commands that do not fit the current state fail with `InvalidTransition`
    /// and leave the session untouched. Stale responses are reported as `Ignored`.
    pub fn handle(&mut self, command: Command) -> Result<Vec<SessionEvent>> {
        if self.state.is_terminal() {
            return Err(self.invalid(Self::action_name(&command)));
        }
        match command {
            Command::Start => self.handle_start(),
            Command::Tick => Ok(self.handle_tick()),
            Command::Respond(event) => Ok(self.handle_respond(event)),
            Command::Pause => self.handle_pause(),
            Command::Resume => self.handle_resume(),
            Command::Stop => self.handle_stop(),
        }
    }

    fn action_name(command: &Command) -> &'static str {
        match command {
            Command::Start => "start",
            Command::Tick => "tick",
            Command::Respond(_) => "respond to",
            Command::Pause => "pause",
            Command::Resume => "resume",
            Command::Stop => "stop",
        }
    }

    fn invalid(&self, action: &'static str) -> VigilError {
        VigilError::InvalidTransition {
            from: self.state,
            action,
        }
    }

    fn handle_start(&mut self) -> Result<Vec<SessionEvent>> {
        if self.state != SessionState::Ready || !self.clock.arm() {
            return Err(self.invalid("start"));
        }
        self.stats.reset();
        self.stats.set_level(self.rules.level());
        self.state = SessionState::Playing;
        info!(
            session_id = %self.id,
            game_id = %self.config.id,
            duration_sec = self.config.duration_sec,
            "Session started"
        );

        let mut events = vec![SessionEvent::Started];
        self.spawn(&mut events);
        Ok(events)
    }

    fn handle_tick(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.state != SessionState::Playing {
            return events;
        }

        for event in self.clock.tick() {
            match event {
                ClockEvent::SessionExpire => {
                    debug!(session_id = %self.id, elapsed_ms = self.clock.elapsed_ms(), "Session expired");
                    self.finish(&mut events);
                    return events;
                }
                ClockEvent::StimulusExpire(id) => {
                    if !self.resolve(id, None, &mut events) {
                        debug!(session_id = %self.id, stimulus_id = %id, "Expiry for resolved stimulus");
                    }
                }
                ClockEvent::SpawnTick => self.spawn(&mut events),
                ClockEvent::RuleChangeTick => self.change_rule(&mut events),
            }
        }
        events
    }

    fn handle_respond(&mut self, event: UserResponseEvent) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.state != SessionState::Playing {
            warn!(session_id = %self.id, state = %self.state, "Response while not playing");
            events.push(SessionEvent::Ignored {
                stimulus_id: None,
                reason: StaleReason::NotAccepting,
            });
            return events;
        }

        let id = match self.locate(event.target) {
            Ok(id) => id,
            Err((stimulus_id, reason)) => {
                events.push(SessionEvent::Ignored { stimulus_id, reason });
                return events;
            }
        };

        let Some(stimulus) = self.active.get(&id) else {
            return events;
        };
        let at = event.timestamp_ms;
        if at < stimulus.spawn_ms {
            warn!(session_id = %self.id, stimulus_id = %id, at_ms = at, "Response before spawn");
            events.push(SessionEvent::Ignored {
                stimulus_id: Some(id),
                reason: StaleReason::BeforeSpawn,
            });
            return events;
        }
        if at > stimulus.expiry_ms {
            warn!(session_id = %self.id, stimulus_id = %id, at_ms = at, "Late response");
            events.push(SessionEvent::Ignored {
                stimulus_id: Some(id),
                reason: StaleReason::Late,
            });
            return events;
        }

        let response = Response::new(stimulus, at);
        self.resolve(id, Some(response), &mut events);
        events
    }

    /// Find the active stimulus a response is aimed at
    fn locate(&self, target: ResponseTarget) -> std::result::Result<StimulusId, (Option<StimulusId>, StaleReason)> {
        match target {
            ResponseTarget::Stimulus(id) => {
                if self.active.contains_key(&id) {
                    Ok(id)
                } else if id.0 < self.next_id {
                    warn!(session_id = %self.id, stimulus_id = %id, "Response to resolved stimulus");
                    Err((Some(id), StaleReason::AlreadyResolved))
                } else {
                    warn!(session_id = %self.id, stimulus_id = %id, "Response to unknown stimulus");
                    Err((Some(id), StaleReason::UnknownStimulus))
                }
            }
            ResponseTarget::Point { x, y } => cell_at(x, y)
                .and_then(|cell| {
                    self.active
                        .values()
                        .find(|stimulus| stimulus.attributes.cell == cell)
                        .map(|stimulus| stimulus.id)
                })
                .ok_or((None, StaleReason::NoStimulusAtPoint)),
        }
    }

    fn handle_pause(&mut self) -> Result<Vec<SessionEvent>> {
        if self.state != SessionState::Playing || !self.clock.pause() {
            return Err(self.invalid("pause"));
        }
        self.state = SessionState::Paused;
        info!(session_id = %self.id, elapsed_ms = self.clock.elapsed_ms(), "Session paused");
        Ok(vec![SessionEvent::Paused])
    }

    fn handle_resume(&mut self) -> Result<Vec<SessionEvent>> {
        if !self.state.is_resumable() || !self.clock.resume() {
            return Err(self.invalid("resume"));
        }
        self.state = SessionState::Playing;
        info!(session_id = %self.id, elapsed_ms = self.clock.elapsed_ms(), "Session resumed");
        Ok(vec![SessionEvent::Resumed])
    }

    fn handle_stop(&mut self) -> Result<Vec<SessionEvent>> {
        if !self.state.is_stoppable() {
            return Err(self.invalid("stop"));
        }
        info!(session_id = %self.id, elapsed_ms = self.clock.elapsed_ms(), "Session stopped");
        let mut events = Vec::new();
        self.finish(&mut events);
        Ok(events)
    }

    /// Spawn one stimulus at the current logical time, if the cap and the family allow it
    fn spawn(&mut self, events: &mut Vec<SessionEvent>) {
        if self.active.len() >= self.difficulty.max_concurrent_stimuli {
            debug!(session_id = %self.id, active = self.active.len(), "Spawn skipped, at capacity");
            return;
        }
        if !self.rules.can_present() {
            return;
        }

        let now = self.clock.elapsed_ms();
        let context = self.rules.context();
        let draft = self
            .generator
            .next(&self.config, &self.difficulty, &context, now, self.random.as_mut());
        let id = StimulusId(self.next_id);
        self.next_id += 1;

        let stimulus = Stimulus::from_draft(id, draft);
        self.clock.schedule_expiry(id, stimulus.expiry_ms);
        self.stats.record_spawn(stimulus.category);
        self.rules.on_spawn();
        debug!(
            session_id = %self.id,
            stimulus_id = %id,
            category = ?stimulus.category,
            spawn_ms = now,
            "Stimulus spawned"
        );
        self.active.insert(id, stimulus.clone());
        events.push(SessionEvent::Spawned(stimulus));
    }

    fn change_rule(&mut self, events: &mut Vec<SessionEvent>) {
        let now = self.clock.elapsed_ms();
        if let Some(change) = self.rules.change_rule(now, self.random.as_mut()) {
            self.stats.record_rule_change();
            debug!(session_id = %self.id, change = ?change, at_ms = now, "Rule changed");
            events.push(SessionEvent::RuleChanged(change));
        }
    }

    /// Remove a stimulus from the active set, classify it and apply family effects.
    /// Returns false if the stimulus was not active.
    fn resolve(&mut self, id: StimulusId, response: Option<Response>, events: &mut Vec<SessionEvent>) -> bool {
        let Some(stimulus) = self.active.remove(&id) else {
            return false;
        };
        self.clock.cancel_expiry(id);

        let context = match &response {
            Some(response) => self.rules.context_at(response.received_at_ms),
            None => self.rules.context(),
        };
        let outcome = self.classifier.classify(&stimulus, response.as_ref(), &context);
        self.stats.apply(outcome, response.map(|r| r.latency_ms));
        events.push(SessionEvent::Resolved {
            stimulus_id: id,
            outcome,
        });

        let family = self.config.scoring_family;
        if let Some(response) = response
            && matches!(outcome, Outcome::Correct)
            && self.rules.take_adaptation(response.received_at_ms)
        {
            self.stats.record_adaptation();
            events.push(SessionEvent::Adapted);
        }

        match family {
            ScoringFamily::CardRule if outcome == Outcome::Correct => {
                self.rules.play_card(stimulus.attributes.face());
            }
            ScoringFamily::SequenceMemory => {
                if outcome == Outcome::StepCorrect && self.rules.advance_step() {
                    self.level_up(events);
                } else if outcome.terminates_round() {
                    self.abort_round(events);
                }
            }
            _ => {}
        }
        true
    }

    fn level_up(&mut self, events: &mut Vec<SessionEvent>) {
        let level = self.rules.level_up();
        self.difficulty = escalated(&self.base_difficulty, level.saturating_sub(1));
        self.clock.set_spawn_interval(self.difficulty.spawn_interval_ms);
        self.stats.set_level(level);
        info!(
            session_id = %self.id,
            level,
            spawn_interval_ms = self.difficulty.spawn_interval_ms,
            "Sequence level up"
        );
        events.push(SessionEvent::LevelUp(level));
    }

    /// Lapse every step still on screen and restart the round
    fn abort_round(&mut self, events: &mut Vec<SessionEvent>) {
        let context = self.rules.context();
        for (id, stimulus) in std::mem::take(&mut self.active) {
            self.clock.cancel_expiry(id);
            let outcome = self.classifier.classify(&stimulus, None, &context);
            self.stats.apply(outcome, None);
            events.push(SessionEvent::Resolved {
                stimulus_id: id,
                outcome,
            });
        }
        self.rules.abort_round();
        debug!(session_id = %self.id, "Sequence round aborted");
        events.push(SessionEvent::RoundAborted);
    }

    /// Transition to `finished`: stop the clock, force-resolve what is left, score.
    fn finish(&mut self, events: &mut Vec<SessionEvent>) {
        self.clock.stop();

        let context = self.rules.context();
        for (id, stimulus) in std::mem::take(&mut self.active) {
            let outcome = self.classifier.classify(&stimulus, None, &context);
            self.stats.apply(outcome, None);
            self.stats.record_force_resolved();
            events.push(SessionEvent::Resolved {
                stimulus_id: id,
                outcome,
            });
        }

        let result = self.build_result();
        self.state = SessionState::Finished;
        info!(
            session_id = %self.id,
            game_id = %result.game_id,
            score = result.score,
            accuracy = result.accuracy_pct,
            stimuli = result.total_stimuli,
            "Session finished"
        );
        self.result = Some(result.clone());
        events.push(SessionEvent::Finished(result));
    }

    fn build_result(&self) -> GameResult {
        let stats = self.stats.stats();
        let card = self.scoring.score(stats);
        let (hits, misses, false_alarms, correct_rejections) = match self.config.scoring_family {
            ScoringFamily::Cpt => (stats.hits, stats.misses, stats.false_alarms, stats.correct_rejections),
            _ => (
                stats.correct_count,
                stats.lapsed_targets,
                stats.incorrect_count,
                stats.lapsed_non_targets,
            ),
        };
        GameResult {
            game_id: self.config.id.clone(),
            duration_sec: (self.clock.elapsed_ms() + 500) / 1000,
            total_stimuli: stats.spawned,
            total_targets: stats.targets,
            total_non_targets: stats.non_targets,
            hits,
            misses,
            false_alarms,
            correct_rejections,
            average_reaction_time_ms: stats.average_reaction_time_ms(),
            accuracy_pct: card.accuracy_pct.round() as u32,
            sensitivity_pct: card.sensitivity_pct.round() as u32,
            score: card.score,
        }
    }

    pub fn start(&mut self) -> Result<Vec<SessionEvent>> {
        self.handle(Command::Start)
    }

    pub fn tick(&mut self) -> Result<Vec<SessionEvent>> {
        self.handle(Command::Tick)
    }

    pub fn respond(&mut self, event: UserResponseEvent) -> Result<Vec<SessionEvent>> {
        self.handle(Command::Respond(event))
    }

    pub fn pause(&mut self) -> Result<Vec<SessionEvent>> {
        self.handle(Command::Pause)
    }

    pub fn resume(&mut self) -> Result<Vec<SessionEvent>> {
        self.handle(Command::Resume)
    }

    pub fn stop(&mut self) -> Result<Vec<SessionEvent>> {
        self.handle(Command::Stop)
    }

    /// Tick until logical time reaches `target_ms` or the session stops playing
    pub fn advance_to(&mut self, target_ms: u64) -> Result<Vec<SessionEvent>> {
        let mut events = Vec::new();
        while self.state == SessionState::Playing && self.clock.elapsed_ms() < target_ms {
            events.extend(self.tick()?);
        }
        Ok(events)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let remaining_ms = self.clock.remaining_ms();
        SessionSnapshot {
            session_id: self.id.clone(),
            game_id: self.config.id.clone(),
            state: self.state,
            elapsed_ms: self.clock.elapsed_ms(),
            remaining_sec: remaining_ms.div_ceil(1000),
            active_stimuli: self.active.values().cloned().collect(),
            live_stats: self.stats.snapshot(),
            rule: self.rules.context(),
            level: self.rules.level(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.clock.elapsed_ms()
    }

    pub fn tick_ms(&self) -> u64 {
        self.clock.tick_ms()
    }

    /// Current rule context
    pub fn rule_context(&self) -> RuleContext {
        self.rules.context()
    }

    /// Difficulty currently in effect, after any escalation
    pub fn difficulty(&self) -> &DifficultyConfig {
        &self.difficulty
    }

    pub fn stats(&self) -> &SessionStats {
        self.stats.stats()
    }

    pub fn active_stimuli(&self) -> impl Iterator<Item = &Stimulus> {
        self.active.values()
    }

    /// The result, once the session has finished
    pub fn result(&self) -> Option<&GameResult> {
        self.result.as_ref()
    }
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("id", &self.id)
            .field("game_id", &self.config.id)
            .field("state", &self.state)
            .field("elapsed_ms", &self.clock.elapsed_ms())
            .field("active", &self.active.len())
            .finish()
    }
}
