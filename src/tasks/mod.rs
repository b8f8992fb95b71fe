//! Background Tasks Module
//!
//! Contains background tasks that run during server operation.
//!
//! # Tasks
//! - Sweep: removes expired cache entries and stale rate windows at configured intervals
//! - Invalidation: fire-and-forget prefix invalidation after a write commits

mod cleanup;
mod invalidate;

pub use cleanup::spawn_cleanup_task;
pub use invalidate::spawn_invalidation;
