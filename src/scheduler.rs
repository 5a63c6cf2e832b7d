//! Fixed-tick animation loop on top of host frame callbacks.
//!
//! The host fires frames at whatever rate the display runs; the scheduler
//! only reports a step as due once `tick_ms` has elapsed since the last one.
//! Every requested frame carries a [`FrameToken`]; a callback whose token is
//! not the one currently awaited (because the loop was paused or restarted in
//! the meantime) is ignored, so at most one loop is ever live.

use life_common::TICK_MS;
use log::{debug, trace};

/// Identifies one requested frame callback.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FrameToken(pub u64);

/// Host side of the frame loop (requestAnimationFrame, a test clock, ...).
pub trait FrameHost {
    /// Current time in milliseconds, on the same clock as frame timestamps.
    fn now_ms(&self) -> f64;
    /// Schedules one callback that must come back with `token`.
    fn request_frame(&mut self, token: FrameToken);
    /// Cancels a scheduled callback. Cancelling an unknown token is a no-op.
    fn cancel_frame(&mut self, token: FrameToken);
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SchedulerState {
    Stopped,
    Running { awaiting: FrameToken, last_tick: f64 },
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    state: SchedulerState,
    tick_ms: f64,
    next_token: u64,
}

impl Scheduler {
    pub fn new(tick_ms: f64) -> Self {
        Scheduler { state: SchedulerState::Stopped, tick_ms, next_token: 0 }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, SchedulerState::Running { .. })
    }

    pub fn tick_ms(&self) -> f64 {
        self.tick_ms
    }

    fn issue_token(&mut self) -> FrameToken {
        self.next_token += 1;
        FrameToken(self.next_token)
    }

    /// Stopped → Running. Returns false (and schedules nothing) if already running.
    pub fn play<H: FrameHost + ?Sized>(&mut self, host: &mut H) -> bool {
        if self.is_running() {
            return false;
        }
        let token = self.issue_token();
        host.request_frame(token);
        self.state = SchedulerState::Running { awaiting: token, last_tick: host.now_ms() };
        debug!("Animation started");
        true
    }

    /// Running → Stopped, cancelling the pending callback. Idempotent.
    pub fn pause<H: FrameHost + ?Sized>(&mut self, host: &mut H) -> bool {
        match self.state {
            SchedulerState::Running { awaiting, .. } => {
                host.cancel_frame(awaiting);
                self.state = SchedulerState::Stopped;
                debug!("Animation paused");
                true
            }
            SchedulerState::Stopped => false,
        }
    }

    pub fn toggle<H: FrameHost + ?Sized>(&mut self, host: &mut H) {
        if self.is_running() {
            self.pause(host);
        } else {
            self.play(host);
        }
    }

    /// Handles a frame callback. Returns true when a simulation step is due.
    /// Stale tokens are ignored and do not schedule anything.
    pub fn on_frame<H: FrameHost + ?Sized>(&mut self, token: FrameToken, timestamp: f64, host: &mut H) -> bool {
        let SchedulerState::Running { awaiting, last_tick } = self.state else {
            trace!("Frame {:?} after pause ignored", token);
            return false;
        };
        if awaiting != token {
            trace!("Stale frame {:?} ignored (awaiting {:?})", token, awaiting);
            return false;
        }

        let due = timestamp - last_tick >= self.tick_ms;
        let next = self.issue_token();
        host.request_frame(next);
        self.state = SchedulerState::Running {
            awaiting: next,
            last_tick: if due { timestamp } else { last_tick },
        };
        due
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Scheduler::new(TICK_MS)
    }
}

/// A frame host driven by hand: time only moves on `advance`, and callbacks
/// only fire when the owner takes the pending token.
#[derive(Debug, Default, Clone)]
pub struct ManualFrameHost {
    now: f64,
    pending: Vec<FrameToken>,
    pub requested: usize,
    pub cancelled: usize,
}

impl ManualFrameHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, ms: f64) {
        self.now += ms;
    }

    /// Pending callbacks, oldest first.
    pub fn pending(&self) -> &[FrameToken] {
        &self.pending
    }

    /// Removes and returns the oldest pending callback, as if the host fired it.
    pub fn fire_next(&mut self) -> Option<FrameToken> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.pending.remove(0))
        }
    }
}

impl FrameHost for ManualFrameHost {
    fn now_ms(&self) -> f64 {
        self.now
    }

    fn request_frame(&mut self, token: FrameToken) {
        self.requested += 1;
        self.pending.push(token);
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        let before = self.pending.len();
        self.pending.retain(|&t| t != token);
        if self.pending.len() != before {
            self.cancelled += 1;
        }
    }
}
