//! API Handlers
//!
//! Operational endpoints for the acceleration layer: health, statistics and
//! cache invalidation.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::cache::TtlStore;
use crate::config::Config;
use crate::error::{AccelError, Result};
use crate::limiter::{peer_id, RateLimiter, ThrottleGate};
use crate::models::{
    CacheStatsResponse, ClearResponse, HealthResponse, InvalidateRequest, InvalidateResponse,
    LimiterStatsResponse,
};
use crate::policy::CachePolicySelector;
use crate::tasks::spawn_invalidation;

pub const CACHE_STATS_PATH: &str = "/api/v1/monitoring/cache";
pub const LIMITER_STATS_PATH: &str = "/api/v1/monitoring/limiter";

/// Application state shared across all handlers and both middleware.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Process-wide memoization store
    pub cache: Arc<TtlStore>,
    /// Gate applied to every request
    pub gate: ThrottleGate,
    /// Tighter per-handler limiter for the admin endpoints
    pub strict_limiter: Arc<RateLimiter>,
    /// Cache-Control policy for outgoing responses
    pub policy: Arc<CachePolicySelector>,
}

impl AppState {
    pub fn new(
        cache: Arc<TtlStore>,
        gate: ThrottleGate,
        strict_limiter: Arc<RateLimiter>,
        policy: CachePolicySelector,
    ) -> Self {
        Self {
            cache,
            gate,
            strict_limiter,
            policy: Arc::new(policy),
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        let window = config.rate_window();
        let limiter = Arc::new(RateLimiter::new(config.rate_limit, window));

        Self::new(
            Arc::new(TtlStore::new(config.default_ttl())),
            ThrottleGate::new(limiter, config.rate_limit_excluded_paths.clone()),
            Arc::new(RateLimiter::new(config.strict_rate_limit, window)),
            CachePolicySelector::new(
                config.path_rule_groups.clone(),
                config.cache_excluded_paths.clone(),
                config.cache_default_max_age,
            )
            .with_override(CACHE_STATS_PATH, "no-cache")
            .with_override(LIMITER_STATS_PATH, "no-cache"),
        )
    }

    /// The gate's limiter, for the sweep task and statistics.
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        self.gate.limiter()
    }
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /api/v1/monitoring/cache
pub async fn cache_stats_handler(State(state): State<AppState>) -> Result<Json<CacheStatsResponse>> {
    let stats = state.cache.stats()?;

    Ok(Json(CacheStatsResponse::new(
        &stats,
        state.cache.default_ttl().as_secs(),
    )))
}

/// Handler for GET /api/v1/monitoring/limiter
pub async fn limiter_stats_handler(State(state): State<AppState>) -> Json<LimiterStatsResponse> {
    let limiter = state.limiter();

    Json(LimiterStatsResponse {
        limit: limiter.limit(),
        window_seconds: limiter.window().as_secs(),
        active_windows: limiter.active_windows(),
    })
}

/// Handler for POST /api/v1/cache/invalidate
///
/// Schedules a background prefix invalidation and answers 202 right away.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    Json(req): Json<InvalidateRequest>,
) -> Result<(StatusCode, Json<InvalidateResponse>)> {
    state
        .strict_limiter
        .enforce(&peer_id(peer.map(|ConnectInfo(addr)| addr)))?;

    if let Some(error_msg) = req.validate() {
        return Err(AccelError::InvalidRequest(error_msg));
    }

    spawn_invalidation(Arc::clone(&state.cache), req.prefix.clone());

    Ok((
        StatusCode::ACCEPTED,
        Json(InvalidateResponse::scheduled(req.prefix)),
    ))
}

/// Handler for DELETE /api/v1/cache
pub async fn clear_handler(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
) -> Result<Json<ClearResponse>> {
    let client = peer_id(peer.map(|ConnectInfo(addr)| addr));
    state.strict_limiter.enforce(&client)?;

    let removed = state.cache.clear()?;
    info!(client_id = %client, removed, "cache cleared by operator");

    Ok(Json(ClearResponse::new(removed)))
}
