//! API Routes
//!
//! Configures the operational router and wraps routers with the
//! acceleration middleware.

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_stats_handler, clear_handler, health_handler, invalidate_handler,
    limiter_stats_handler, AppState, CACHE_STATS_PATH, LIMITER_STATS_PATH,
};
use crate::limiter::throttle;
use crate::policy::annotate;

/// Wraps `router` with the response cache annotator and the throttle gate.
///
/// The gate is the outer layer: a rejected request never reaches the
/// annotator, and admitted responses get rate-limit headers after their
/// cache headers are set.
pub fn accelerate<S>(router: Router<S>, state: &AppState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(middleware::from_fn_with_state(state.policy.clone(), annotate))
        .layer(middleware::from_fn_with_state(state.gate.clone(), throttle))
}

/// Creates the operational router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check endpoint
/// - `GET /api/v1/monitoring/cache` - Cache statistics
/// - `GET /api/v1/monitoring/limiter` - Rate limiter statistics
/// - `POST /api/v1/cache/invalidate` - Schedule a prefix invalidation
/// - `DELETE /api/v1/cache` - Drop every cached entry
///
/// # Middleware
/// - Throttle gate and cache annotator (see `accelerate`)
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router = Router::new()
        .route("/health", get(health_handler))
        .route(CACHE_STATS_PATH, get(cache_stats_handler))
        .route(LIMITER_STATS_PATH, get(limiter_stats_handler))
        .route("/api/v1/cache/invalidate", post(invalidate_handler))
        .route("/api/v1/cache", delete(clear_handler))
        .with_state(state.clone());

    accelerate(router, &state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::{HEADER_RATE_LIMIT, HEADER_RATE_REMAINING};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        create_router(AppState::from_config(&Config::default()))
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[HEADER_RATE_LIMIT], "100");
        assert_eq!(response.headers()[HEADER_RATE_REMAINING], "99");
    }

    #[tokio::test]
    async fn test_stats_endpoint_is_not_publicly_cached() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri(CACHE_STATS_PATH)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
    }

    #[tokio::test]
    async fn test_invalidate_endpoint_accepts() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/cache/invalidate")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"prefix":"tickets:"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(response.headers()[header::CACHE_CONTROL]
            .to_str()
            .unwrap()
            .contains("no-store"));
    }

    #[tokio::test]
    async fn test_clear_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/v1/cache")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
