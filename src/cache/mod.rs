//! Cache Module
//!
//! In-process memoization: a TTL store with prefix invalidation, structured
//! cache keys and blocking/async memoizing adapters.

mod entry;
mod key;
mod memoize;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use key::{CacheKey, KEY_SEPARATOR};
pub use memoize::Memoizer;
pub use stats::CacheStats;
pub use store::TtlStore;
