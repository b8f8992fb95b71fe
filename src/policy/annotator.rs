//! Response Cache Annotator
//!
//! axum middleware writing the selected cache headers onto every response.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::policy::{client_opted_out, CacheDirective, CachePolicySelector};

/// Annotates the response with the directive chosen by `selector`.
///
/// Method, path and the client's opt-out are captured before the inner
/// service runs; the status is read from its response.
pub async fn annotate(
    State(selector): State<Arc<CachePolicySelector>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let bypass = client_opted_out(request.headers());

    let mut response = next.run(request).await;

    let directive = selector.select(&method, &path, response.status(), bypass);
    if let CacheDirective::Public { group, max_age, .. } = &directive {
        debug!(path = %path, group = %group, max_age, "cacheable response");
    }
    directive.apply(response.headers_mut(), chrono::Utc::now());

    response
}
