//! API Module
//!
//! Operational HTTP surface of the acceleration layer and the `accelerate`
//! wrapper for domain routers.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /api/v1/monitoring/cache` - Cache statistics
//! - `GET /api/v1/monitoring/limiter` - Rate limiter statistics
//! - `POST /api/v1/cache/invalidate` - Schedule a prefix invalidation
//! - `DELETE /api/v1/cache` - Drop every cached entry

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::{accelerate, create_router};
