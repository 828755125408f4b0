//! HTTP surface of the catalog: route tree plus middleware.
//!
//! `main.rs` and the integration tests both go through [`build_app_router`],
//! so a test request sees the same layers as production traffic.

use std::time::Duration;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::routes;
use crate::state::AppState;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Browser preflight results may be cached for this long.
const CORS_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// The catalog application, ready to serve.
pub fn build_app_router(state: AppState, config: &ServerConfig) -> Router {
    with_middleware(app_routes(), config).with_state(state)
}

/// `/health` at the root and the movie resource under `/api/v1`.
pub fn app_routes() -> Router<AppState> {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
}

/// Wrap `routes` in the catalog's middleware.
///
/// A request passes through, outermost first: CORS, request id assignment,
/// tracing, request id echo on the response, the per-request timeout (408),
/// and panic recovery (500) right around the handler.
pub fn with_middleware<S>(routes: Router<S>, config: &ServerConfig) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    routes
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(cors_layer(config))
}

/// CORS for the configured browser origins. Origins that are not valid
/// header values are skipped with a warning.
pub fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Ignoring unusable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([CONTENT_TYPE])
        .max_age(CORS_MAX_AGE)
}
