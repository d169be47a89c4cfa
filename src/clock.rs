//! # Time Source Abstraction
//!
//! Every pause in this crate is a bounded poll or sleep, and all of them go
//! through the [`Clock`] trait. That single seam is what makes the flow
//! controller and the job scheduler testable: production code uses
//! [`SystemClock`] (monotonic, real sleeps), tests use [`FakeClock`] (virtual
//! time where sleeping *is* advancing).
//!
//! ## Why not `Instant` directly?
//!
//! The flow controller computes microsecond resume deadlines and the
//! scheduler computes millisecond cool-downs. Both need "now" and "sleep"
//! from the same source or a fake clock cannot keep them consistent.

use std::cell::Cell;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

/// Monotonic time source with sleep capability.
///
/// All waits in the crate are expressed against this trait so tests can
/// substitute virtual time.
pub trait Clock {
    /// Microseconds since an arbitrary fixed origin (monotonic).
    fn now_micros(&self) -> u64;

    /// Pause the calling thread for `us` microseconds.
    fn sleep_micros(&self, us: u64);

    /// Milliseconds since the origin.
    fn now_millis(&self) -> u64 {
        self.now_micros() / 1000
    }

    /// Pause the calling thread for `ms` milliseconds.
    fn sleep_millis(&self, ms: u64) {
        self.sleep_micros(ms * 1000);
    }
}

/// Real time: a monotonic [`Instant`] origin plus `thread::sleep`.
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
    fn now_micros(&self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }

    fn sleep_micros(&self, us: u64) {
        thread::sleep(Duration::from_micros(us));
    }
}

/// Virtual time for tests: sleeping advances the clock instantly.
///
/// Clones share the same underlying counter, so a test can keep one handle
/// to inspect or advance time while the code under test holds another.
///
/// ## Example
///
/// ```
/// use brasa::clock::{Clock, FakeClock};
///
/// let clock = FakeClock::new();
/// let handle = clock.clone();
/// clock.sleep_millis(250);
/// assert_eq!(handle.now_millis(), 250);
/// handle.advance_micros(500);
/// assert_eq!(clock.now_micros(), 250_500);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FakeClock {
    now_us: Rc<Cell<u64>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move virtual time forward without sleeping.
    pub fn advance_micros(&self, us: u64) {
        self.now_us.set(self.now_us.get() + us);
    }

    /// Move virtual time forward by milliseconds.
    pub fn advance_millis(&self, ms: u64) {
        self.advance_micros(ms * 1000);
    }
}

impl Clock for FakeClock {
    fn now_micros(&self) -> u64 {
        self.now_us.get()
    }

    fn sleep_micros(&self, us: u64) {
        self.advance_micros(us);
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now_micros();
        let b = clock.now_micros();
        assert!(b >= a);
    }

    #[test]
    fn test_fake_clock_starts_at_zero() {
        let clock = FakeClock::new();
        assert_eq!(clock.now_micros(), 0);
        assert_eq!(clock.now_millis(), 0);
    }

    #[test]
    fn test_fake_clock_sleep_advances() {
        let clock = FakeClock::new();
        clock.sleep_micros(1040);
        assert_eq!(clock.now_micros(), 1040);
        clock.sleep_millis(2);
        assert_eq!(clock.now_micros(), 3040);
    }

    #[test]
    fn test_fake_clock_clones_share_time() {
        let clock = FakeClock::new();
        let other = clock.clone();
        clock.advance_millis(100);
        assert_eq!(other.now_millis(), 100);
    }
}
