use std::time::{Duration, Instant};

use crate::live::cancel::CancelToken;

/// Fixed-rate tick source for the render loop.
///
/// Deadlines advance by whole intervals regardless of how long a step took. When the loop
/// falls more than one interval behind, missed ticks are dropped instead of replayed.
#[derive(Debug)]
pub struct FrameClock {
    interval: Duration,
    next: Instant,
}

impl FrameClock {
    /// The first tick is due immediately.
    pub fn new(interval: Duration) -> Self {
        Self::starting_at(interval, Instant::now())
    }

    pub fn starting_at(interval: Duration, first: Instant) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            next: first,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Deadline of the next tick after `now`, advancing the clock.
    pub fn advance(&mut self, now: Instant) -> Instant {
        let due = self.next;
        self.next += self.interval;
        if now > self.next {
            self.next = now + self.interval;
        }
        due
    }

    /// Block until the next tick. Returns `false` when `cancel` fired first.
    ///
    /// Parks the thread, so a canceller should unpark it to be noticed promptly.
    pub fn wait(&mut self, cancel: &CancelToken) -> bool {
        let due = self.advance(Instant::now());
        loop {
            if cancel.is_cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= due {
                return true;
            }
            std::thread::park_timeout(due - now);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/live/clock.rs"]
mod tests;
