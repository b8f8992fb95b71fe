//! Rate Window Module
//!
//! Per-client request counter for one fixed window.

use std::time::{Duration, Instant};

// == Rate Window ==
/// Request count since `window_start` for a single client.
#[derive(Debug, Clone, Copy)]
pub struct RateWindow {
    /// Requests admitted in this window
    pub count: u32,
    /// When the window opened
    pub window_start: Instant,
}

impl RateWindow {
    /// Opens a window holding the request that created it.
    pub fn open(now: Instant) -> Self {
        Self {
            count: 1,
            window_start: now,
        }
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.window_start)
    }

    /// A window lapses once strictly more than `size` has passed.
    pub fn is_expired(&self, now: Instant, size: Duration) -> bool {
        self.elapsed(now) > size
    }

    /// Time left until the window lapses.
    pub fn remaining(&self, now: Instant, size: Duration) -> Duration {
        size.saturating_sub(self.elapsed(now))
    }
}
