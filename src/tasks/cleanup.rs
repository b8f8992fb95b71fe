//! Sweep Task
//!
//! Background task that periodically drops expired cache entries and lapsed
//! rate windows.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::TtlStore;
use crate::limiter::RateLimiter;

/// Spawns a background task that sweeps the cache and the given limiters.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between sweeps. Each sweep takes the structures' locks briefly and never
/// awaits while holding them.
///
/// # Arguments
/// * `cache` - Shared memoization store
/// * `limiters` - Rate limiters whose stale windows should be dropped
/// * `cleanup_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_cleanup_task(
    cache: Arc<TtlStore>,
    limiters: Vec<Arc<RateLimiter>>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()> {
    spawn_sweeper(
        cache,
        limiters,
        Duration::from_secs(cleanup_interval_secs.max(1)),
    )
}

pub(crate) fn spawn_sweeper(
    cache: Arc<TtlStore>,
    limiters: Vec<Arc<RateLimiter>>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            interval_ms = interval.as_millis() as u64,
            "Starting cache and rate window sweep task"
        );

        loop {
            tokio::time::sleep(interval).await;

            match cache.cleanup_expired() {
                Ok(0) => debug!("Sweep: no expired cache entries"),
                Ok(removed) => info!("Sweep: removed {} expired cache entries", removed),
                Err(err) => warn!(error = %err, "Sweep: cache cleanup failed"),
            }

            for limiter in &limiters {
                match limiter.sweep_expired() {
                    Ok(0) => {}
                    Ok(removed) => debug!("Sweep: removed {} stale rate windows", removed),
                    Err(err) => warn!(error = %err, "Sweep: rate window cleanup failed"),
                }
            }
        }
    })
}
