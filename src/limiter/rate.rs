//! Rate Limiter Module
//!
//! Fixed-window admission control keyed by client identifier.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::{debug, error, warn};

use crate::error::{AccelError, Result};
use crate::limiter::RateWindow;

// == Rate Decision ==
/// Outcome of checking one request against its client's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// Request admitted; `remaining` more fit in the current window
    Admitted { remaining: u32 },
    /// Budget exhausted; the window resets after `retry_after`
    Limited { retry_after: Duration },
}

impl RateDecision {
    pub fn is_limited(&self) -> bool {
        matches!(self, RateDecision::Limited { .. })
    }
}

// == Rate Limiter ==
/// Counts requests per client inside fixed windows of `window` length.
///
/// Windows are fixed, not sliding: a burst straddling a window boundary can
/// be admitted at up to twice the limit in a short span.
#[derive(Debug)]
pub struct RateLimiter {
    windows: Mutex<HashMap<String, RateWindow>>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    // == Constructor ==
    /// Creates a limiter admitting `limit` requests per client per `window`.
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            limit,
            window,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, RateWindow>>> {
        self.windows
            .lock()
            .map_err(|_| AccelError::LockPoisoned("rate limiter"))
    }

    // == Check ==
    /// Counts one request from `client_id` and decides whether to admit it.
    pub fn check(&self, client_id: &str) -> Result<RateDecision> {
        self.check_at(client_id, Instant::now())
    }

    pub(crate) fn check_at(&self, client_id: &str, now: Instant) -> Result<RateDecision> {
        let mut windows = self.lock()?;

        let active = windows
            .get_mut(client_id)
            .filter(|window| !window.is_expired(now, self.window));

        if let Some(window) = active {
            if window.count >= self.limit {
                let retry_after = window.remaining(now, self.window);
                debug!(client_id, count = window.count, "rate window exhausted");
                return Ok(RateDecision::Limited { retry_after });
            }

            window.count += 1;
            return Ok(RateDecision::Admitted {
                remaining: self.limit - window.count,
            });
        }

        // No window yet, or the previous one lapsed
        windows.insert(client_id.to_string(), RateWindow::open(now));
        Ok(RateDecision::Admitted {
            remaining: self.limit.saturating_sub(1),
        })
    }

    // == Enforce ==
    /// Handler-level guard: admits or returns `AccelError::RateLimited`.
    ///
    /// Internal faults admit the request. Returns the remaining budget, or
    /// the full limit when the limiter could not be consulted.
    pub fn enforce(&self, client_id: &str) -> Result<u32> {
        match self.check(client_id) {
            Ok(RateDecision::Admitted { remaining }) => Ok(remaining),
            Ok(RateDecision::Limited { retry_after }) => {
                warn!(
                    client_id,
                    retry_after_secs = retry_after.as_secs_f64(),
                    "rate limit exceeded"
                );
                Err(AccelError::RateLimited {
                    limit: self.limit,
                    retry_after,
                })
            }
            Err(err) => {
                error!(client_id, error = %err, "rate limiter unavailable, admitting request");
                Ok(self.limit)
            }
        }
    }

    // == Sweep Expired ==
    /// Drops windows that have lapsed. Returns how many were removed.
    pub fn sweep_expired(&self) -> Result<usize> {
        self.sweep_expired_at(Instant::now())
    }

    pub(crate) fn sweep_expired_at(&self, now: Instant) -> Result<usize> {
        let mut windows = self.lock()?;
        let before = windows.len();
        windows.retain(|_, window| !window.is_expired(now, self.window));
        Ok(before - windows.len())
    }

    /// Number of clients currently tracked.
    pub fn active_windows(&self) -> usize {
        self.lock().map(|windows| windows.len()).unwrap_or(0)
    }
}
