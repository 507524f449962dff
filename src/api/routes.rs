use axum::{
    extract::Request,
    http::HeaderValue,
    routing::{get, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::Level;

use super::handlers::{health, mappings, status, AppState};
use crate::config::CorsConfig;

pub fn create_router(state: AppState, cors: &CorsConfig) -> Router {
    let public_routes = Router::new().route("/health", get(health::health));

    let api_routes = Router::new()
        .route(
            "/mappings",
            get(mappings::list_mappings).post(mappings::add_mapping),
        )
        .route(
            "/mappings/{name}",
            put(mappings::update_mapping).delete(mappings::delete_mapping),
        )
        .route("/status/{name}", get(status::get_status))
        .route("/all", get(status::get_all_status));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(|request: &Request| {
                            tracing::span!(
                                Level::INFO,
                                "http_request",
                                method = %request.method(),
                                uri = %request.uri(),
                            )
                        })
                        .on_request(|_request: &Request, _span: &tracing::Span| {
                            tracing::event!(Level::DEBUG, "received request");
                        })
                        .on_response(
                            |_response: &axum::response::Response,
                             latency: std::time::Duration,
                             _span: &tracing::Span| {
                                tracing::event!(Level::INFO, latency = ?latency, "request completed");
                            },
                        )
                        .on_failure(
                            |_error: tower_http::classify::ServerErrorsFailureClass,
                             _latency: std::time::Duration,
                             _span: &tracing::Span| {
                                tracing::event!(Level::ERROR, "request failed");
                            },
                        ),
                )
                .layer(cors_layer(cors)),
        )
}

/// Credentialed CORS for the configured origins only. Methods and headers
/// are mirrored since wildcards cannot be combined with credentials.
fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cors
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}
