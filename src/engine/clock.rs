//! Trial clock - the single logical time source of a session
//!
//! Every tick advances logical time by a fixed step and reports, in order:
//! - stimulus expiries (deadline passed)
//! - the spawn tick
//! - the rule change tick
//!
//! Session expiry pre-empts all of them. Pausing moves every pending timer into a suspension
//! record holding its remaining time; resuming rearms them from that record.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::StimulusId;

/// Default logical step.
pub const DEFAULT_TICK_MS: u64 = 100;

/// Lifecycle of the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockPhase {
    /// Not armed yet
    Idle,
    /// Advancing on every tick
    Running,
    /// Paused; timers parked with their remaining time
    Suspended,
    /// Session over; never rearms
    Stopped,
}

/// Scheduled event fired by a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    SessionExpire,
    StimulusExpire(StimulusId),
    SpawnTick,
    RuleChangeTick,
}

/// Read-only view of the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockSnapshot {
    pub phase: ClockPhase,
    pub elapsed_ms: u64,
    pub remaining_ms: u64,
}

/// Timers parked by `pause`, as remaining milliseconds
#[derive(Debug, Clone, Default)]
struct Suspension {
    spawn_remaining: Option<u64>,
    rule_change_remaining: Option<u64>,
    expiry_remaining: Vec<(StimulusId, u64)>,
}

/// Single authoritative time source for a session.
#[derive(Debug, Clone)]
pub struct TrialClock {
    tick_ms: u64,
    duration_ms: u64,
    spawn_interval_ms: u64,
    rule_change_interval_ms: Option<u64>,
    elapsed_ms: u64,
    tick_count: u64,
    phase: ClockPhase,
    next_spawn_ms: Option<u64>,
    next_rule_change_ms: Option<u64>,
    /// Inclusive deadlines; an expiry fires on the first tick strictly past it
    expiries: BTreeMap<StimulusId, u64>,
    suspension: Option<Suspension>,
}

impl TrialClock {
    /// Create an idle clock
    pub fn new(tick_ms: u64, duration_ms: u64, spawn_interval_ms: u64, rule_change_interval_ms: Option<u64>) -> Self {
        Self {
            tick_ms: tick_ms.max(1),
            duration_ms,
            spawn_interval_ms: spawn_interval_ms.max(1),
            rule_change_interval_ms: rule_change_interval_ms.filter(|ms| *ms > 0),
            elapsed_ms: 0,
            tick_count: 0,
            phase: ClockPhase::Idle,
            next_spawn_ms: None,
            next_rule_change_ms: None,
            expiries: BTreeMap::new(),
            suspension: None,
        }
    }

    /// Start running. The caller handles the spawn at t=0; the first spawn tick fires one
    /// interval later. Returns false if the clock was already armed.
    pub fn arm(&mut self) -> bool {
        if self.phase != ClockPhase::Idle {
            return false;
        }
        self.phase = ClockPhase::Running;
        self.next_spawn_ms = Some(self.elapsed_ms + self.spawn_interval_ms);
        self.next_rule_change_ms = self.rule_change_interval_ms.map(|ms| self.elapsed_ms + ms);
        true
    }

    /// Advance one logical step and return the events that fired.
    pub fn tick(&mut self) -> Vec<ClockEvent> {
        if self.phase != ClockPhase::Running {
            return Vec::new();
        }

        self.tick_count += 1;
        self.elapsed_ms = self.elapsed_ms.saturating_add(self.tick_ms);

        if self.elapsed_ms >= self.duration_ms {
            if self.elapsed_ms > self.duration_ms {
                debug!(
                    overshoot_ms = self.elapsed_ms - self.duration_ms,
                    "Tick overshot session duration, clamping"
                );
            }
            self.elapsed_ms = self.duration_ms;
            self.stop();
            return vec![ClockEvent::SessionExpire];
        }

        let now = self.elapsed_ms;
        let mut events = Vec::new();

        let mut due: Vec<(u64, StimulusId)> = self
            .expiries
            .iter()
            .filter(|&(_, deadline)| *deadline < now)
            .map(|(id, deadline)| (*deadline, *id))
            .collect();
        due.sort_unstable();
        for (_, id) in due {
            self.expiries.remove(&id);
            events.push(ClockEvent::StimulusExpire(id));
        }

        if let Some(next) = self.next_spawn_ms
            && now >= next
        {
            events.push(ClockEvent::SpawnTick);
            self.next_spawn_ms = Some(Self::next_after(next, self.spawn_interval_ms, now));
        }

        if let (Some(next), Some(interval)) = (self.next_rule_change_ms, self.rule_change_interval_ms)
            && now >= next
        {
            events.push(ClockEvent::RuleChangeTick);
            self.next_rule_change_ms = Some(Self::next_after(next, interval, now));
        }

        events
    }

    /// First multiple of `interval` after `from` that is later than `now`
    fn next_after(from: u64, interval: u64, now: u64) -> u64 {
        let mut next = from;
        while next <= now {
            next += interval;
        }
        next
    }

    /// Suspend every pending timer in one step. Returns false if not running.
    pub fn pause(&mut self) -> bool {
        if self.phase != ClockPhase::Running {
            return false;
        }
        let now = self.elapsed_ms;
        let suspension = Suspension {
            spawn_remaining: self.next_spawn_ms.take().map(|t| t.saturating_sub(now)),
            rule_change_remaining: self.next_rule_change_ms.take().map(|t| t.saturating_sub(now)),
            expiry_remaining: std::mem::take(&mut self.expiries)
                .into_iter()
                .map(|(id, deadline)| (id, deadline.saturating_sub(now)))
                .collect(),
        };
        self.suspension = Some(suspension);
        self.phase = ClockPhase::Suspended;
        true
    }

    /// Rearm every parked timer with its preserved remaining time. Returns false if not
    /// suspended.
    pub fn resume(&mut self) -> bool {
        if self.phase != ClockPhase::Suspended {
            return false;
        }
        let now = self.elapsed_ms;
        let suspension = self.suspension.take().unwrap_or_default();
        self.next_spawn_ms = suspension.spawn_remaining.map(|r| now + r);
        self.next_rule_change_ms = suspension.rule_change_remaining.map(|r| now + r);
        self.expiries = suspension
            .expiry_remaining
            .into_iter()
            .map(|(id, remaining)| (id, now + remaining))
            .collect();
        self.phase = ClockPhase::Running;
        true
    }

    /// Terminate and cancel everything. Idempotent.
    pub fn stop(&mut self) {
        self.phase = ClockPhase::Stopped;
        self.next_spawn_ms = None;
        self.next_rule_change_ms = None;
        self.expiries.clear();
        self.suspension = None;
    }

    /// Schedule the expiry of a stimulus at its inclusive deadline.
    pub fn schedule_expiry(&mut self, id: StimulusId, deadline_ms: u64) {
        match self.phase {
            ClockPhase::Running | ClockPhase::Idle => {
                self.expiries.insert(id, deadline_ms);
            }
            ClockPhase::Suspended => {
                if let Some(suspension) = self.suspension.as_mut() {
                    let remaining = deadline_ms.saturating_sub(self.elapsed_ms);
                    suspension.expiry_remaining.push((id, remaining));
                }
            }
            ClockPhase::Stopped => {}
        }
    }

    /// Cancel a pending expiry. Returns true if one was pending.
    pub fn cancel_expiry(&mut self, id: StimulusId) -> bool {
        if self.expiries.remove(&id).is_some() {
            return true;
        }
        if let Some(suspension) = self.suspension.as_mut() {
            let before = suspension.expiry_remaining.len();
            suspension.expiry_remaining.retain(|(pending, _)| *pending != id);
            return suspension.expiry_remaining.len() != before;
        }
        false
    }

    /// Change the spawn pace; takes effect after the currently scheduled spawn.
    pub fn set_spawn_interval(&mut self, spawn_interval_ms: u64) {
        self.spawn_interval_ms = spawn_interval_ms.max(1);
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Remaining session time; zero once stopped.
    pub fn remaining_ms(&self) -> u64 {
        if self.phase == ClockPhase::Stopped {
            return 0;
        }
        match self.duration_ms.checked_sub(self.elapsed_ms) {
            Some(remaining) => remaining,
            None => {
                warn!(
                    elapsed_ms = self.elapsed_ms,
                    duration_ms = self.duration_ms,
                    "Remaining time negative, clamping to zero"
                );
                0
            }
        }
    }

    pub fn phase(&self) -> ClockPhase {
        self.phase
    }

    pub fn tick_ms(&self) -> u64 {
        self.tick_ms
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Number of pending stimulus expiries, parked or live
    pub fn pending_expiries(&self) -> usize {
        self.expiries.len()
            + self
                .suspension
                .as_ref()
                .map(|s| s.expiry_remaining.len())
                .unwrap_or(0)
    }

    /// Time left until a stimulus expires, if it is scheduled
    pub fn expiry_remaining(&self, id: StimulusId) -> Option<u64> {
        if let Some(deadline) = self.expiries.get(&id) {
            return Some(deadline.saturating_sub(self.elapsed_ms));
        }
        self.suspension.as_ref().and_then(|s| {
            s.expiry_remaining
                .iter()
                .find(|(pending, _)| *pending == id)
                .map(|(_, remaining)| *remaining)
        })
    }

    pub fn snapshot(&self) -> ClockSnapshot {
        ClockSnapshot {
            phase: self.phase,
            elapsed_ms: self.elapsed_ms,
            remaining_ms: self.remaining_ms(),
        }
    }
}
