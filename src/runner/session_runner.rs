//! Wall-clock driver for a game session.
//!
//! The runner owns the session inside one task and is the only thing that touches it. A tokio
//! interval drives logical ticks; commands from any number of `SessionHandle`s arrive over an
//! mpsc channel and are applied between ticks. Snapshots go out through a watch channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::domain::{GameResult, ResponseTarget, SessionState, UserResponseEvent};
use crate::engine::{GameSession, SessionSnapshot};
use crate::error::{Result, VigilError};
use crate::storage::ResultStore;

const COMMAND_BUFFER: usize = 64;

/// Commands a handle can send to a running session
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunnerCommand {
    Respond(ResponseTarget),
    Pause,
    Resume,
    Stop,
}

/// Cloneable control surface for a session owned by a `SessionRunner`
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<RunnerCommand>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    async fn send(&self, command: RunnerCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| VigilError::SessionClosed("runner is no longer accepting commands".to_string()))
    }

    /// Respond now; the runner stamps the response with logical session time
    pub async fn respond(&self, target: ResponseTarget) -> Result<()> {
        self.send(RunnerCommand::Respond(target)).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.send(RunnerCommand::Pause).await
    }

    pub async fn resume(&self) -> Result<()> {
        self.send(RunnerCommand::Resume).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.send(RunnerCommand::Stop).await
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }
}

/// Drives one session in real time and hands its result to a store.
pub struct SessionRunner {
    session: GameSession,
    store: Arc<dyn ResultStore>,
    commands: mpsc::Receiver<RunnerCommand>,
    snapshots: watch::Sender<SessionSnapshot>,
    tick: Duration,
    last_tick: Instant,
}

impl SessionRunner {
    pub fn new(session: GameSession, store: Arc<dyn ResultStore>) -> (Self, SessionHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot());
        let tick = Duration::from_millis(session.tick_ms());
        let runner = Self {
            session,
            store,
            commands: command_rx,
            snapshots: snapshot_tx,
            tick,
            last_tick: Instant::now(),
        };
        let handle = SessionHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
        };
        (runner, handle)
    }

    /// Run until the session finishes, then save and return the result.
    pub async fn run(mut self) -> Result<GameResult> {
        if self.session.state() == SessionState::Ready {
            self.session.start()?;
        }
        self.publish();

        let mut ticker = tokio::time::interval_at(Instant::now() + self.tick, self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
        self.last_tick = Instant::now();
        let mut commands_open = true;

        info!(session_id = %self.session.id(), tick_ms = self.tick.as_millis() as u64, "Runner started");

        while !self.session.state().is_terminal() {
            tokio::select! {
                _ = ticker.tick() => {
                    self.session.tick()?;
                    self.last_tick = Instant::now();
                }
                command = self.commands.recv(), if commands_open => match command {
                    Some(command) => self.apply(command),
                    None => {
                        debug!(session_id = %self.session.id(), "All handles dropped, running to completion");
                        commands_open = false;
                    }
                },
            }
            self.publish();
        }

        let result = self
            .session
            .result()
            .cloned()
            .ok_or_else(|| VigilError::SessionClosed(format!("session {} has no result", self.session.id())))?;
        self.store.save(&result)?;
        info!(session_id = %self.session.id(), game_id = %result.game_id, score = result.score, "Result saved");
        Ok(result)
    }

    /// Logical time for a response arriving now: the last tick plus the wall time since it,
    /// never more than one tick
    fn stamp(&self) -> u64 {
        let since = self.last_tick.elapsed().min(self.tick);
        self.session.elapsed_ms() + since.as_millis() as u64
    }

    fn apply(&mut self, command: RunnerCommand) {
        let outcome = match command {
            RunnerCommand::Respond(target) => {
                let event = UserResponseEvent {
                    timestamp_ms: self.stamp(),
                    target,
                };
                self.session.respond(event)
            }
            RunnerCommand::Pause => self.session.pause(),
            RunnerCommand::Resume => {
                let resumed = self.session.resume();
                self.last_tick = Instant::now();
                resumed
            }
            RunnerCommand::Stop => self.session.stop(),
        };
        if let Err(e) = outcome {
            warn!(session_id = %self.session.id(), command = ?command, error = %e, "Command rejected");
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.session.snapshot());
    }
}
