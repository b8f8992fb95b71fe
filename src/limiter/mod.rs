//! Rate Limiting Module
//!
//! Fixed-window request counting per client and the axum middleware that
//! enforces it at the request boundary.

mod gate;
mod rate;
mod window;

pub use gate::{client_id, peer_id, throttle, ThrottleGate, UNKNOWN_CLIENT};
pub use rate::{RateDecision, RateLimiter};
pub use window::RateWindow;
