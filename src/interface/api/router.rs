//! API Router configuration

use super::calls_handler::{
    call_next_speaker, end_call, get_call, health_check, join_call, leave_call, mute_switch,
    request_to_speak, start_call, switch_participant_mode, AppState,
};
use super::metrics_handler::{metrics_handler, record_http_request};
use axum::{
    extract::{MatchedPath, Request},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Path label for requests that hit no route; raw URIs would make the label
/// set unbounded
pub const UNMATCHED_PATH_LABEL: &str = "unmatched";

/// Build the API router. `/metrics` is only mounted when a handle is given.
pub fn build_router(state: AppState, prometheus_handle: Option<PrometheusHandle>) -> Router {
    // Health check route (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    // Call routes
    let call_routes = Router::new()
        .route("/calls", post(start_call))
        .route("/calls/:id", get(get_call))
        .route("/calls/:id/join", post(join_call))
        .route("/calls/:id/switch-mode", post(switch_participant_mode))
        .route("/calls/:id/request-to-speak", post(request_to_speak))
        .route("/calls/:id/next-speaker", post(call_next_speaker))
        .route("/calls/:id/mute", post(mute_switch))
        .route("/calls/:id/leave", post(leave_call))
        .route("/calls/:id/end", post(end_call));

    let mut app = Router::new()
        .merge(health_routes)
        .merge(call_routes)
        .with_state(state);

    if let Some(handle) = prometheus_handle {
        // Metrics route (separate state)
        let metrics_routes = Router::new()
            .route("/metrics", get(metrics_handler))
            .with_state(handle);
        app = app.merge(metrics_routes);
    }

    app.layer(middleware::from_fn(track_latency))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

async fn track_latency(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_PATH_LABEL.to_string());

    let response = next.run(req).await;
    record_http_request(&method, &path, response.status().as_u16(), start.elapsed());
    response
}
