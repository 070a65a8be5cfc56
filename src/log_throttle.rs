//! Rate-limited warning emission for index-maintenance anomalies.
//!
//! `SimpleMapIndex::remove` can observe a missing posting for a key that
//! should have been present; this is recoverable (the index keeps working)
//! but worth surfacing without flooding the log on a hot remove path.

use std::time::{Duration, Instant};

use log::warn;

/// Tracks a quiet window per distinct warning site; logs the first
/// occurrence immediately, then at most once per window thereafter,
/// folding in the count of suppressed occurrences.
pub struct LogThrottle {
    window: Duration,
    first: Option<Instant>,
    count: u64,
}

impl LogThrottle {
    pub fn new(window: Duration) -> Self {
        LogThrottle { window, first: None, count: 0 }
    }

    /// Record an occurrence; emits a `warn!` through the `log` crate when
    /// this is the first occurrence in the window, and folds subsequent
    /// ones into the next emission's count.
    pub fn fire(&mut self, target: &str, message: &str) {
        let now = Instant::now();
        self.count += 1;
        let elapsed_past_window = self.first.map_or(true, |t| now.duration_since(t) >= self.window);
        if elapsed_past_window {
            if self.count > 1 {
                warn!(target: target, "{} ({} suppressed since last report)", message, self.count - 1);
            } else {
                warn!(target: target, "{}", message);
            }
            self.first = Some(now);
            self.count = 0;
        }
    }
}

impl Default for LogThrottle {
    fn default() -> Self {
        LogThrottle::new(Duration::from_secs(10))
    }
}

#[cfg(test)]
#[path = "log_throttle_test.rs"]
mod log_throttle_test;
