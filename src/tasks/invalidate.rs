//! Background Invalidation
//!
//! Fire-and-forget prefix invalidation scheduled by write paths after they
//! commit.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cache::TtlStore;

/// Schedules `invalidate_by_prefix(prefix)` off the caller's critical path.
///
/// Runs at most once. A failure is logged and swallowed so it can never fail
/// the write that triggered it. Readers racing the task may still see the old
/// entries until it completes.
pub fn spawn_invalidation(cache: Arc<TtlStore>, prefix: impl Into<String>) -> JoinHandle<()> {
    let prefix = prefix.into();

    tokio::spawn(async move {
        match cache.invalidate_by_prefix(&prefix) {
            Ok(removed) => info!(prefix = %prefix, removed, "invalidated cached entries"),
            Err(err) => warn!(prefix = %prefix, error = %err, "cache invalidation failed"),
        }
    })
}
