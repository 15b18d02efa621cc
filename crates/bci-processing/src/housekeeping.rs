//! Periodic maintenance throttle

use std::time::{Duration, Instant};

/// Minimum time between two maintenance passes
pub const HOUSEKEEPING_INTERVAL: Duration = Duration::from_secs(60);

/// Decides when the next memory-reclamation pass is due
#[derive(Debug, Clone)]
pub struct Housekeeper {
    interval: Duration,
    last_pass: Instant,
}

impl Housekeeper {
    /// Start the clock at `now`; the first pass is due one interval later
    pub fn new(interval: Duration, now: Instant) -> Self {
        Housekeeper {
            interval,
            last_pass: now,
        }
    }

    /// True, and the clock restarts, when strictly more than one interval
    /// has passed since the last pass
    pub fn due(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last_pass) > self.interval {
            self.last_pass = now;
            true
        } else {
            false
        }
    }
}

impl Default for Housekeeper {
    fn default() -> Self {
        Self::new(HOUSEKEEPING_INTERVAL, Instant::now())
    }
}
