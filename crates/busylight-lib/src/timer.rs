//! Single-shot, re-armable countdown driven by an injectable clock.
//!
//! The countdown is a deadline, not a thread: the owning event loop calls
//! [`Countdown::poll`] on its own thread, so arming, cancelling and firing
//! are always serialized. Re-arming overwrites the deadline, so a replaced
//! countdown can never fire.

use std::time::{Duration, Instant};

/// Source of monotonic time.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// The real monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A cancellable single-shot countdown.
#[derive(Debug, Default)]
pub struct Countdown {
    deadline: Option<Instant>,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm for `duration` starting at `now`, replacing any pending countdown.
    ///
    /// Returns `false` and leaves the countdown untouched when the deadline
    /// is not representable.
    pub fn arm(&mut self, now: Instant, duration: Duration) -> bool {
        match now.checked_add(duration) {
            Some(deadline) => {
                self.deadline = Some(deadline);
                true
            }
            None => false,
        }
    }

    /// Disarm. Returns `true` if a countdown was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// The instant the pending countdown fires.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the pending countdown fires (zero once overdue).
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Check for expiry. Returns `true` exactly once per armed countdown,
    /// at the first poll at or after the deadline, and disarms it.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.cancel();
                true
            }
            _ => false,
        }
    }
}

/// Manually driven clock for tests.
///
/// Always compiled (zero runtime cost), hidden from public docs.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// A clock that only moves when told to. Clones share the same time.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        now: Rc<Cell<Instant>>,
    }

    impl Default for ManualClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ManualClock {
        pub fn new() -> Self {
            Self {
                now: Rc::new(Cell::new(Instant::now())),
            }
        }

        pub fn advance(&self, by: Duration) {
            self.now.set(self.now.get() + by);
        }

        pub fn advance_secs(&self, secs: u64) {
            self.advance(Duration::from_secs(secs));
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.now.get()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::ManualClock;
    use super::*;

    #[test]
    fn new_countdown_is_disarmed() {
        let c = Countdown::new();
        assert!(!c.is_armed());
        assert_eq!(c.remaining(Instant::now()), None);
    }

    #[test]
    fn fires_once_at_deadline() {
        let clock = ManualClock::new();
        let mut c = Countdown::new();
        c.arm(clock.now(), Duration::from_secs(5));

        clock.advance_secs(4);
        assert!(!c.poll(clock.now()));
        assert_eq!(c.remaining(clock.now()), Some(Duration::from_secs(1)));

        clock.advance_secs(1);
        assert!(c.poll(clock.now()));
        assert!(!c.is_armed());

        clock.advance_secs(10);
        assert!(!c.poll(clock.now()), "single-shot must not fire again");
    }

    #[test]
    fn rearm_resets_instead_of_stacking() {
        let clock = ManualClock::new();
        let mut c = Countdown::new();
        c.arm(clock.now(), Duration::from_secs(5));
        clock.advance_secs(3);
        c.arm(clock.now(), Duration::from_secs(5));

        clock.advance_secs(3);
        assert!(!c.poll(clock.now()), "old deadline must be gone");
        clock.advance_secs(2);
        assert!(c.poll(clock.now()));
    }

    #[test]
    fn cancel_prevents_firing() {
        let clock = ManualClock::new();
        let mut c = Countdown::new();
        c.arm(clock.now(), Duration::from_secs(1));
        assert!(c.cancel());
        assert!(!c.cancel());
        clock.advance_secs(5);
        assert!(!c.poll(clock.now()));
    }

    #[test]
    fn remaining_saturates_when_overdue() {
        let clock = ManualClock::new();
        let mut c = Countdown::new();
        c.arm(clock.now(), Duration::from_secs(1));
        clock.advance_secs(3);
        assert_eq!(c.remaining(clock.now()), Some(Duration::ZERO));
    }

    #[test]
    fn unrepresentable_deadline_is_refused() {
        let clock = ManualClock::new();
        let mut c = Countdown::new();
        assert!(!c.arm(clock.now(), Duration::MAX));
        assert!(!c.is_armed());

        assert!(c.arm(clock.now(), Duration::from_secs(5)));
        assert!(!c.arm(clock.now(), Duration::MAX));
        assert_eq!(c.remaining(clock.now()), Some(Duration::from_secs(5)));
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let a = ManualClock::new();
        let b = a.clone();
        let t0 = b.now();
        a.advance_secs(7);
        assert_eq!(b.now() - t0, Duration::from_secs(7));
    }
}
