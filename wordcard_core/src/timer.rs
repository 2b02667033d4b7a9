//! Clocks and cancellable scheduled events
//!
//! The quiz never sleeps. It schedules events against a [`Clock`] and the host
//! calls `fire_due` (through the engine's `tick`) whenever it likes. Tests
//! drive a [`ManualClock`] forward by hand.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotonic time source, as an offset from an arbitrary origin.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Wall-clock time measured from construction.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Virtual clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, to: Duration) {
        self.now.set(to);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Identifies one scheduled event. Stays valid (but inert) after firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug)]
struct Scheduled<E> {
    handle: TimerHandle,
    due: Duration,
    event: E,
}

/// Pending events ordered by due time.
#[derive(Debug)]
pub struct Scheduler<E> {
    next_id: u64,
    pending: Vec<Scheduled<E>>,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self {
            next_id: 0,
            pending: Vec::new(),
        }
    }
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `event` to fire once `after` has elapsed from `now`.
    pub fn schedule(&mut self, now: Duration, after: Duration, event: E) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.pending.push(Scheduled {
            handle,
            due: now + after,
            event,
        });
        handle
    }

    /// Disarm a timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.pending.iter().position(|s| s.handle == handle) {
            Some(index) => {
                self.pending.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_armed(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|s| s.handle == handle)
    }

    pub fn due_at(&self, handle: TimerHandle) -> Option<Duration> {
        self.pending
            .iter()
            .find(|s| s.handle == handle)
            .map(|s| s.due)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return every event due at or before `now`, earliest first.
    /// Events armed at the same instant fire in scheduling order.
    pub fn fire_due(&mut self, now: Duration) -> Vec<(TimerHandle, E)> {
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|s| s.due <= now);
        self.pending = pending;
        due.sort_by_key(|s| (s.due, s.handle.0));
        due.into_iter().map(|s| (s.handle, s.event)).collect()
    }
}
