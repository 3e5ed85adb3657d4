//! Frame and timer scheduling.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Deferred callbacks the scanner asks its host for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Timer {
    /// Deferred startup after the capability gate passed.
    Start,
    /// End of rejection pause number `pause`, armed in session `epoch`.
    EndPause { epoch: u64, pause: u64 },
    /// Revert a transient status notice.
    RevertNotice { notice: u64 },
}

/// Host scheduling primitives.
///
/// A frame request fires `Scanner::on_frame` once on the next display
/// refresh; a timer fires `Scanner::on_timer` once after `delay`.
pub trait Scheduler {
    fn request_frame(&mut self);
    fn schedule(&mut self, delay: Duration, timer: Timer);
}

#[derive(Debug, Default)]
struct ManualState {
    now: Duration,
    frames_outstanding: usize,
    frames_requested: usize,
    next_seq: u64,
    timers: Vec<(Duration, u64, Timer)>,
}

/// Deterministic scheduler with a virtual clock.
///
/// Clones share state, so one handle can live inside a scanner while
/// another drives it.
#[derive(Clone, Debug, Default)]
pub struct ManualScheduler {
    inner: Rc<RefCell<ManualState>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    /// Consume one outstanding frame request.
    pub fn take_frame(&self) -> bool {
        let mut state = self.inner.borrow_mut();
        if state.frames_outstanding == 0 {
            return false;
        }
        state.frames_outstanding -= 1;
        true
    }

    pub fn frame_pending(&self) -> bool {
        self.inner.borrow().frames_outstanding > 0
    }

    /// Total frame requests since creation.
    pub fn frames_requested(&self) -> usize {
        self.inner.borrow().frames_requested
    }

    /// Timers not yet fired, in firing order.
    pub fn pending_timers(&self) -> Vec<Timer> {
        let mut timers = self.inner.borrow().timers.clone();
        timers.sort_by_key(|&(due, seq, _)| (due, seq));
        timers.into_iter().map(|(_, _, timer)| timer).collect()
    }

    /// Move the clock forward and return the timers that came due, in order.
    pub fn advance(&self, by: Duration) -> Vec<Timer> {
        let mut state = self.inner.borrow_mut();
        state.now += by;
        let now = state.now;
        let (mut due, pending): (Vec<_>, Vec<_>) =
            state.timers.drain(..).partition(|&(at, _, _)| at <= now);
        state.timers = pending;
        due.sort_by_key(|&(at, seq, _)| (at, seq));
        due.into_iter().map(|(_, _, timer)| timer).collect()
    }
}

impl Scheduler for ManualScheduler {
    fn request_frame(&mut self) {
        let mut state = self.inner.borrow_mut();
        state.frames_outstanding += 1;
        state.frames_requested += 1;
    }

    fn schedule(&mut self, delay: Duration, timer: Timer) {
        let mut state = self.inner.borrow_mut();
        let due = state.now + delay;
        let seq = state.next_seq;
        state.next_seq += 1;
        state.timers.push((due, seq, timer));
    }
}
