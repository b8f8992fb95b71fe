//! Memoizer Module
//!
//! Wraps blocking and suspending handlers so repeated calls with equal
//! arguments are answered from the `TtlStore`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::cache::{CacheKey, TtlStore};
use crate::error::{self, AccelError};

// == Memoizer ==
/// Memoizes handler results under one key namespace.
///
/// Concurrent misses on the same key are not coalesced: each caller runs the
/// handler and the last write wins.
#[derive(Debug, Clone)]
pub struct Memoizer {
    store: Arc<TtlStore>,
    prefix: String,
    ttl: Option<Duration>,
}

impl Memoizer {
    // == Constructor ==
    /// Creates a memoizer writing into `store` under `prefix`.
    pub fn new(store: Arc<TtlStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            ttl: None,
        }
    }

    /// Overrides the store's default TTL for entries written by this memoizer.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Starts a key for `handler` in this memoizer's namespace.
    ///
    /// `handler` is the handler's identity: it must be unique per memoizer,
    /// since two handlers given the same name share entries. Use `key_for`
    /// to derive it from the handler's type instead.
    pub fn key(&self, handler: &str) -> CacheKey {
        CacheKey::new(self.prefix.clone(), handler)
    }

    /// Starts a key named after the type of `handler`.
    ///
    /// Every fn item and closure has its own type, so distinct handlers never
    /// share a key even under the same memoizer.
    pub fn key_for<H>(&self, _handler: &H) -> CacheKey {
        self.key(std::any::type_name::<H>())
    }

    // == Blocking Adapter ==
    /// Runs `handler` unless a cached result exists for `key`.
    ///
    /// Handler errors are returned as-is and never cached.
    pub fn call_blocking<T, E, F>(&self, key: &CacheKey, handler: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, E>,
    {
        let rendered = key.render();
        if let Some(hit) = self.lookup(&rendered) {
            return Ok(hit);
        }

        let result = handler()?;
        self.remember(&rendered, &result);
        Ok(result)
    }

    // == Suspending Adapter ==
    /// Async counterpart of `call_blocking`.
    ///
    /// On a hit the handler future is never created. No lock is held while
    /// the handler future runs.
    pub async fn call_async<T, E, F, Fut>(&self, key: &CacheKey, handler: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let rendered = key.render();
        if let Some(hit) = self.lookup(&rendered) {
            return Ok(hit);
        }

        let result = handler().await?;
        self.remember(&rendered, &result);
        Ok(result)
    }

    // == Shared Core ==
    fn lookup<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.try_lookup(key) {
            Ok(hit) => hit,
            Err(err @ AccelError::Serialization(_)) => {
                warn!(key, error = %err, "cached value does not decode, discarding");
                let _ = self.store.delete(key);
                None
            }
            Err(err) => {
                warn!(key, error = %err, "cache lookup failed, running handler uncached");
                None
            }
        }
    }

    fn try_lookup<T: DeserializeOwned>(&self, key: &str) -> error::Result<Option<T>> {
        match self.store.get(key)? {
            Some(cached) => Ok(Some(serde_json::from_value(cached)?)),
            None => Ok(None),
        }
    }

    fn remember<T: Serialize>(&self, key: &str, value: &T) {
        match self.try_remember(key, value) {
            Ok(()) => debug!(key, prefix = self.prefix(), "memoized handler result"),
            Err(err) => warn!(key, prefix = self.prefix(), error = %err, "result not memoized"),
        }
    }

    fn try_remember<T: Serialize>(&self, key: &str, value: &T) -> error::Result<()> {
        let encoded = serde_json::to_value(value)?;
        self.store.set(key, encoded, self.ttl)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread::sleep;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Summary {
        open: u32,
        closed: u32,
    }

    fn memoizer() -> Memoizer {
        Memoizer::new(Arc::new(TtlStore::new(Duration::from_secs(300))), "stats")
    }

    #[test]
    fn test_blocking_hit_skips_handler() {
        let memo = memoizer();
        let calls = AtomicUsize::new(0);
        let key = memo.key("tickets_summary").arg(30);

        for _ in 0..3 {
            let summary: Result<Summary, ()> = memo.call_blocking(&key, || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Summary { open: 4, closed: 9 })
            });
            assert_eq!(summary.unwrap(), Summary { open: 4, closed: 9 });
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_blocking_errors_are_not_cached() {
        let memo = memoizer();
        let calls = AtomicUsize::new(0);
        let key = memo.key("flaky");

        let first: Result<u32, String> = memo.call_blocking(&key, || {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("database unavailable".to_string())
        });
        assert!(first.is_err());

        let second: Result<u32, String> = memo.call_blocking(&key, || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(7)
        });
        assert_eq!(second.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_kwarg_order_yields_hit() {
        let memo = memoizer();
        let calls = AtomicUsize::new(0);

        let first = memo.key("by_period").kwarg("from", 1).kwarg("to", 2);
        let second = memo.key("by_period").kwarg("to", 2).kwarg("from", 1);

        let run = |key: &CacheKey| -> Result<u32, ()> {
            memo.call_blocking(key, || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(11)
            })
        };

        assert_eq!(run(&first).unwrap(), 11);
        assert_eq!(run(&second).unwrap(), 11);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_distinct_handlers_do_not_share_entries() {
        let memo = memoizer();

        let a: Result<u32, ()> = memo.call_blocking(&memo.key("agents").arg(1), || Ok(1));
        let b: Result<u32, ()> = memo.call_blocking(&memo.key("users").arg(1), || Ok(2));

        assert_eq!(a.unwrap(), 1);
        assert_eq!(b.unwrap(), 2);
    }

    #[test]
    fn test_memoizer_ttl_overrides_store_default() {
        let store = Arc::new(TtlStore::new(Duration::from_secs(300)));
        let memo = Memoizer::new(Arc::clone(&store), "monitor").with_ttl(Duration::from_millis(40));
        let calls = AtomicUsize::new(0);
        let key = memo.key("system");

        let run = || -> Result<u32, ()> {
            memo.call_blocking(&key, || Ok(calls.fetch_add(1, Ordering::SeqCst) as u32))
        };

        assert_eq!(run().unwrap(), 0);
        assert_eq!(run().unwrap(), 0);
        sleep(Duration::from_millis(70));
        assert_eq!(run().unwrap(), 1);
    }

    #[test]
    fn test_undecodable_entry_falls_back_to_handler() {
        let store = Arc::new(TtlStore::new(Duration::from_secs(300)));
        let memo = Memoizer::new(Arc::clone(&store), "stats");
        let key = memo.key("summary");

        store.set(key.render(), serde_json::json!("not a summary"), None).unwrap();

        let summary: Result<Summary, ()> =
            memo.call_blocking(&key, || Ok(Summary { open: 1, closed: 2 }));
        assert_eq!(summary.unwrap(), Summary { open: 1, closed: 2 });

        let cached = store.get(&key.render()).unwrap().unwrap();
        assert_eq!(cached, serde_json::json!({"open": 1, "closed": 2}));
    }

    #[test]
    fn test_poisoned_store_fails_open() {
        let store = Arc::new(TtlStore::new(Duration::from_secs(300)));
        store.poison();
        let memo = Memoizer::new(store, "stats");
        let calls = AtomicUsize::new(0);
        let key = memo.key("summary");

        for _ in 0..2 {
            let value: Result<u32, ()> = memo.call_blocking(&key, || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(5)
            });
            assert_eq!(value.unwrap(), 5);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_async_hit_skips_future() {
        let memo = memoizer();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = memo.key("agent_performance").arg("2024-06");

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            let value: Result<Vec<u32>, ()> = memo
                .call_async(&key, || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    Ok(vec![3, 1, 4])
                })
                .await;
            assert_eq!(value.unwrap(), vec![3, 1, 4]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_async_and_blocking_share_entries() {
        let memo = memoizer();
        let key = memo.key("categories");

        let first: Result<Vec<String>, ()> = memo
            .call_async(&key, || async { Ok(vec!["printer".to_string()]) })
            .await;
        assert_eq!(first.unwrap(), vec!["printer".to_string()]);

        let second: Result<Vec<String>, ()> =
            memo.call_blocking(&key, || panic!("handler must not run on a hit"));
        assert_eq!(second.unwrap(), vec!["printer".to_string()]);
    }

    #[tokio::test]
    async fn test_concurrent_misses_each_run_handler_last_write_wins() {
        let memo = memoizer();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = memo.key("tickets_by_period").kwarg("days", 7);

        let slow_handler = |delay_ms: u64, value: u32| {
            let calls = Arc::clone(&calls);
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok::<u32, ()>(value)
            }
        };

        let (early, late) = tokio::join!(
            memo.call_async(&key, slow_handler(20, 1)),
            memo.call_async(&key, slow_handler(60, 2)),
        );

        assert_eq!(early.unwrap(), 1);
        assert_eq!(late.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let cached: Result<u32, ()> =
            memo.call_blocking(&key, || panic!("handler must not run on a hit"));
        assert_eq!(cached.unwrap(), 2);
    }

    fn open_tickets() -> Result<u32, ()> {
        Ok(3)
    }

    fn closed_tickets() -> Result<u32, ()> {
        Ok(9)
    }

    #[test]
    fn test_key_for_separates_same_shaped_handlers() {
        let memo = memoizer();

        let open_key = memo.key_for(&open_tickets);
        let closed_key = memo.key_for(&closed_tickets);
        assert_ne!(open_key, closed_key);
        assert_eq!(open_key, memo.key_for(&open_tickets));

        assert_eq!(memo.call_blocking(&open_key.clone().arg(30), open_tickets).unwrap(), 3);
        assert_eq!(memo.call_blocking(&closed_key.arg(30), closed_tickets).unwrap(), 9);
        assert_eq!(memo.call_blocking(&open_key.arg(30), closed_tickets).unwrap(), 3);
    }

    async fn list_tickets(memo: &Memoizer, key: &CacheKey, calls: &AtomicUsize) -> usize {
        let result: Result<usize, ()> = memo
            .call_async(key, || async { Ok(calls.fetch_add(1, Ordering::SeqCst)) })
            .await;
        result.unwrap()
    }

    #[tokio::test]
    async fn test_invalidation_forces_recompute() {
        let store = Arc::new(TtlStore::new(Duration::from_secs(300)));
        let memo = Memoizer::new(Arc::clone(&store), "tickets");
        let calls = AtomicUsize::new(0);
        let key = memo.key("list").arg(1);

        assert_eq!(list_tickets(&memo, &key, &calls).await, 0);
        assert_eq!(list_tickets(&memo, &key, &calls).await, 0);

        store
            .invalidate_by_prefix(&CacheKey::namespace("tickets"))
            .unwrap();

        assert_eq!(list_tickets(&memo, &key, &calls).await, 1);
    }
}
