//! Periodic deadline used by the polling control loops.

use std::time::{Duration, Instant};

/// An explicit next-due deadline, recomputed from the firing time.
#[derive(Clone, Copy, Debug)]
pub struct Ticker {
    period: Duration,
    next_due: Instant,
}

impl Ticker {
    /// First due one full period after `now`.
    pub fn new(period: Duration, now: Instant) -> Self {
        Self {
            period,
            next_due: now + period,
        }
    }

    /// Due immediately, then every period after firing.
    pub fn immediate(period: Duration, now: Instant) -> Self {
        Self {
            period,
            next_due: now,
        }
    }

    #[inline]
    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next_due
    }

    /// Record a firing at `now`. Missed periods are not caught up.
    pub fn fire(&mut self, now: Instant) {
        self.next_due = now + self.period;
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_due_after_period() {
        let t0 = Instant::now();
        let ticker = Ticker::new(Duration::from_secs(1), t0);
        assert!(!ticker.is_due(t0));
        assert!(!ticker.is_due(t0 + Duration::from_millis(999)));
        assert!(ticker.is_due(t0 + Duration::from_secs(1)));
    }

    #[test]
    fn test_fire_recomputes_from_firing_time() {
        let t0 = Instant::now();
        let mut ticker = Ticker::new(Duration::from_millis(500), t0);
        // Fired late: next deadline counts from the late firing
        let late = t0 + Duration::from_millis(1300);
        assert!(ticker.is_due(late));
        ticker.fire(late);
        assert!(!ticker.is_due(late + Duration::from_millis(499)));
        assert!(ticker.is_due(late + Duration::from_millis(500)));
    }

    #[test]
    fn test_immediate() {
        let t0 = Instant::now();
        let ticker = Ticker::immediate(Duration::from_secs(5), t0);
        assert!(ticker.is_due(t0));
    }
}
