//! Edge Accel - request acceleration for an axum backend
//!
//! TTL memoization with prefix invalidation, fixed-window rate limiting and
//! HTTP Cache-Control policy, packaged as axum middleware.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod limiter;
pub mod models;
pub mod policy;
pub mod tasks;

pub use api::{accelerate, create_router, AppState};
pub use cache::{CacheKey, Memoizer, TtlStore};
pub use config::Config;
pub use error::{AccelError, Result};
pub use limiter::{RateDecision, RateLimiter, ThrottleGate};
pub use policy::{CacheDirective, CachePolicySelector};
pub use tasks::{spawn_cleanup_task, spawn_invalidation};
