//! Exponential backoff arithmetic.
//!
//! Pure and side-effect free: the node keeps one [`Backoff`] for its
//! quarantine window, and the execution engine computes its own retry sleeps
//! with [`retry_delay`]. Keeping the math out of the state machines keeps it
//! trivially testable.

use std::time::Duration;

/// Doubling backoff clamped to `[min, max]`.
///
/// `current` is the delay the *next* failure will impose. It starts at
/// `min`, doubles per consecutive failure, and snaps back to `min` on
/// success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backoff {
    min: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    /// A backoff starting (and resetting) at `min`, capped at `max`.
    pub fn new(min: Duration, max: Duration) -> Self {
        let min = min.max(Duration::from_millis(1));
        let max = max.max(min);
        Backoff { min, max, current: min }
    }

    /// The delay the next failure will impose.
    pub fn current(&self) -> Duration {
        self.current
    }

    /// The configured floor.
    pub fn min(&self) -> Duration {
        self.min
    }

    /// The configured ceiling.
    pub fn max(&self) -> Duration {
        self.max
    }

    /// Records a failure: returns the quarantine to apply now and doubles
    /// the stored delay (capped).
    pub fn record_failure(&mut self) -> Duration {
        let applied = self.current;
        self.current = (self.current * 2).min(self.max);
        applied
    }

    /// Records a success: the next failure starts over at `min`.
    pub fn reset(&mut self) {
        self.current = self.min;
    }

    /// Tightens the bounds, re-clamping the current delay.
    pub fn set_bounds(&mut self, min: Duration, max: Duration) {
        let min = min.max(Duration::from_millis(1));
        let max = max.max(min);
        self.min = min;
        self.max = max;
        self.current = self.current.clamp(min, max);
    }
}

/// The engine-side retry sleep after `consecutive` same-node retries:
/// `min · 2^consecutive`, capped at `max`. `consecutive` is zero-based, so
/// the first retry sleeps exactly `min`.
pub fn retry_delay(min: Duration, max: Duration, consecutive: u32) -> Duration {
    let exp = consecutive.min(31);
    min.checked_mul(1u32 << exp).map_or(max, |d| d.min(max))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: Duration = Duration::from_millis(250);
    const MAX: Duration = Duration::from_secs(8);

    #[test]
    fn doubles_until_capped() {
        let mut b = Backoff::new(MIN, MAX);
        let mut applied = Vec::new();
        for _ in 0..8 {
            applied.push(b.record_failure());
        }
        assert_eq!(applied[0], MIN);
        assert_eq!(applied[1], MIN * 2);
        assert_eq!(applied[4], MIN * 16); // 4 s
        assert_eq!(applied[5], MAX); // 8 s, exactly the cap
        assert_eq!(applied[6], MAX); // stays capped
        assert_eq!(applied[7], MAX);
    }

    #[test]
    fn reset_returns_to_min() {
        let mut b = Backoff::new(MIN, MAX);
        for _ in 0..5 {
            b.record_failure();
        }
        b.reset();
        assert_eq!(b.current(), MIN);
        assert_eq!(b.record_failure(), MIN);
    }

    #[test]
    fn degenerate_bounds_are_repaired() {
        let b = Backoff::new(Duration::ZERO, Duration::ZERO);
        assert!(b.min() >= Duration::from_millis(1));
        assert!(b.max() >= b.min());

        let b = Backoff::new(Duration::from_secs(10), Duration::from_secs(1));
        assert_eq!(b.max(), b.min());
    }

    #[test]
    fn set_bounds_reclamps_current() {
        let mut b = Backoff::new(MIN, MAX);
        for _ in 0..10 {
            b.record_failure();
        }
        b.set_bounds(Duration::from_millis(100), Duration::from_secs(1));
        assert_eq!(b.current(), Duration::from_secs(1));
    }

    #[test]
    fn retry_delay_matches_formula() {
        assert_eq!(retry_delay(MIN, MAX, 0), MIN);
        assert_eq!(retry_delay(MIN, MAX, 1), MIN * 2);
        assert_eq!(retry_delay(MIN, MAX, 5), MAX);
        // Huge exponents must not overflow.
        assert_eq!(retry_delay(MIN, MAX, u32::MAX), MAX);
    }
}
