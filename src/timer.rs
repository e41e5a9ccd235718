//! Cooperative timers for the presentation and input phases.
//!
//! Nothing here sleeps. The front end feeds elapsed milliseconds through
//! `advance`, and a timer fires at most once. Every timer is stamped with the
//! [`RoundToken`] of the round that armed it; a [`TimerSlot`] drops a timer
//! whose token no longer matches instead of firing it.

use tracing::trace;

/// Generation number of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RoundToken(u64);

impl RoundToken {
    pub fn next(self) -> Self {
        RoundToken(self.0.wrapping_add(1))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStatus {
    Running,
    /// Returned by the call that crossed the deadline, and only that call
    Fired,
    Spent,
}

pub trait Timer {
    fn token(&self) -> RoundToken;
    fn advance(&mut self, dt_ms: u64) -> TimerStatus;
}

/// Reveals a challenge in `steps` equal slices, then waits `settle_ms`
/// before firing.
#[derive(Debug, Clone, PartialEq)]
pub struct PresentationTimer {
    token: RoundToken,
    steps: usize,
    step_ms: u64,
    settle_ms: u64,
    elapsed_ms: u64,
    fired: bool,
}

impl PresentationTimer {
    pub fn single(token: RoundToken, duration_ms: u64) -> Self {
        Self::stepped(token, 1, duration_ms, 0)
    }

    pub fn stepped(token: RoundToken, steps: usize, step_ms: u64, settle_ms: u64) -> Self {
        Self {
            token,
            steps: steps.max(1),
            step_ms,
            settle_ms,
            elapsed_ms: 0,
            fired: false,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        self.step_ms
            .saturating_mul(self.steps as u64)
            .saturating_add(self.settle_ms)
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn remaining_ms(&self) -> u64 {
        self.duration_ms().saturating_sub(self.elapsed_ms)
    }

    /// How many steps have been shown so far
    pub fn revealed(&self) -> usize {
        if self.step_ms == 0 {
            return self.steps;
        }
        ((self.elapsed_ms / self.step_ms) as usize).min(self.steps)
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}

impl Timer for PresentationTimer {
    fn token(&self) -> RoundToken {
        self.token
    }

    fn advance(&mut self, dt_ms: u64) -> TimerStatus {
        if self.fired {
            return TimerStatus::Spent;
        }
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);
        if self.elapsed_ms >= self.duration_ms() {
            self.fired = true;
            TimerStatus::Fired
        } else {
            TimerStatus::Running
        }
    }
}

/// Input-phase deadline
#[derive(Debug, Clone, PartialEq)]
pub struct Countdown {
    token: RoundToken,
    total_ms: u64,
    elapsed_ms: u64,
    fired: bool,
}

impl Countdown {
    pub fn new(token: RoundToken, total_ms: u64) -> Self {
        Self {
            token,
            total_ms,
            elapsed_ms: 0,
            fired: false,
        }
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ms
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn remaining_ms(&self) -> u64 {
        self.total_ms.saturating_sub(self.elapsed_ms)
    }
}

impl Timer for Countdown {
    fn token(&self) -> RoundToken {
        self.token
    }

    fn advance(&mut self, dt_ms: u64) -> TimerStatus {
        if self.fired {
            return TimerStatus::Spent;
        }
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);
        if self.elapsed_ms >= self.total_ms {
            self.fired = true;
            TimerStatus::Fired
        } else {
            TimerStatus::Running
        }
    }
}

/// Owns at most one pending timer. Arming replaces (and so cancels) the
/// previous one; a fired timer is released immediately.
#[derive(Debug)]
pub struct TimerSlot<T> {
    armed: Option<T>,
}

impl<T> Default for TimerSlot<T> {
    fn default() -> Self {
        Self { armed: None }
    }
}

impl<T: Timer> TimerSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, timer: T) {
        if let Some(old) = self.armed.replace(timer) {
            trace!(token = old.token().get(), "replaced pending timer");
        }
    }

    /// Returns true if a pending timer was dropped
    pub fn cancel(&mut self) -> bool {
        match self.armed.take() {
            Some(old) => {
                trace!(token = old.token().get(), "cancelled pending timer");
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn get(&self) -> Option<&T> {
        self.armed.as_ref()
    }

    pub fn advance(&mut self, dt_ms: u64, current: RoundToken) -> TimerStatus {
        let Some(timer) = self.armed.as_mut() else {
            return TimerStatus::Spent;
        };
        if timer.token() != current {
            trace!(
                stale = timer.token().get(),
                current = current.get(),
                "dropping timer from an earlier round"
            );
            self.armed = None;
            return TimerStatus::Spent;
        }
        match timer.advance(dt_ms) {
            TimerStatus::Fired => {
                self.armed = None;
                TimerStatus::Fired
            }
            status => status,
        }
    }
}
