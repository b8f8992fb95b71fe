//! Throttle Gate Module
//!
//! axum middleware enforcing the rate limiter at the request boundary.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{Extensions, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn};

use crate::error::{AccelError, HEADER_RATE_LIMIT, HEADER_RATE_REMAINING};
use crate::limiter::{RateDecision, RateLimiter};

/// Client identifier used when the connection address is unavailable.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Stale windows are swept once every this many gated requests.
const SWEEP_EVERY: u64 = 10;

// == Throttle Gate ==
/// Shared state for the `throttle` middleware.
#[derive(Debug, Clone)]
pub struct ThrottleGate {
    limiter: Arc<RateLimiter>,
    excluded_paths: Arc<[String]>,
    seen: Arc<AtomicU64>,
}

impl ThrottleGate {
    /// Creates a gate over `limiter` that ignores paths under `excluded_paths`.
    pub fn new(limiter: Arc<RateLimiter>, excluded_paths: Vec<String>) -> Self {
        Self {
            limiter,
            excluded_paths: excluded_paths.into(),
            seen: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Whether requests to `path` bypass the limiter.
    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded_paths
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    fn maybe_sweep(&self) {
        let seen = self.seen.fetch_add(1, Ordering::Relaxed) + 1;
        if seen % SWEEP_EVERY != 0 {
            return;
        }

        match self.limiter.sweep_expired() {
            Ok(0) => {}
            Ok(removed) => debug!(removed, "swept stale rate windows"),
            Err(err) => warn!(error = %err, "rate window sweep failed"),
        }
    }
}

/// Derives the rate-limit identity of a request from its peer address.
pub fn client_id(extensions: &Extensions) -> String {
    peer_id(extensions.get::<ConnectInfo<SocketAddr>>().map(|ConnectInfo(addr)| *addr))
}

/// Rate-limit identity for a peer: its IP, or `UNKNOWN_CLIENT`.
pub fn peer_id(peer: Option<SocketAddr>) -> String {
    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

// == Middleware ==
/// Admits or rejects each request according to its client's window.
///
/// Rejected requests never reach the inner service. Admitted responses carry
/// `X-RateLimit-Limit` and `X-RateLimit-Remaining`. A limiter fault admits
/// the request without rate-limit headers.
pub async fn throttle(State(gate): State<ThrottleGate>, request: Request, next: Next) -> Response {
    if gate.is_excluded(request.uri().path()) {
        return next.run(request).await;
    }

    let client = client_id(request.extensions());
    let decision = gate.limiter.check(&client);
    gate.maybe_sweep();

    let remaining = match decision {
        Ok(RateDecision::Admitted { remaining }) => remaining,
        Ok(RateDecision::Limited { retry_after }) => {
            warn!(
                client_id = %client,
                path = %request.uri().path(),
                retry_after_secs = retry_after.as_secs_f64(),
                "rate limit exceeded"
            );
            return AccelError::RateLimited {
                limit: gate.limiter.limit(),
                retry_after,
            }
            .into_response();
        }
        Err(err) => {
            error!(
                client_id = %client,
                error = %err,
                "rate limiter unavailable, admitting request"
            );
            return next.run(request).await;
        }
    };

    let mut response = next.run(request).await;
    admitted_headers(response.headers_mut(), gate.limiter.limit(), remaining);
    response
}

fn admitted_headers(headers: &mut HeaderMap, limit: u32, remaining: u32) {
    headers.insert(HEADER_RATE_LIMIT, HeaderValue::from(limit));
    headers.insert(HEADER_RATE_REMAINING, HeaderValue::from(remaining));
}
