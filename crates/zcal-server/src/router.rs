//! Route table, CORS and request tracing.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers;
use crate::ServerState;

/// Builds the full application router around the given state.
pub fn build_router(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %req.method(),
                uri = %req.uri(),
                version = ?req.version(),
            )
        })
        .on_response(|res: &Response<Body>, latency: Duration, _span: &tracing::Span| {
            info!(
                latency = %format!("{} ms", latency.as_millis()),
                status = %res.status().as_u16(),
                "finished processing request"
            );
        });

    let logged_routes = Router::new()
        .route(
            "/api/identify-food",
            post(handlers::food::identify_food).fallback(handlers::method_not_allowed),
        )
        .route(
            "/api/generate-recipe",
            post(handlers::recipe::generate_recipe).fallback(handlers::method_not_allowed),
        )
        .layer(trace_layer);

    Router::new()
        .merge(logged_routes)
        .route("/health", get(handlers::health).fallback(handlers::method_not_allowed))
        .route("/", get(handlers::health).fallback(handlers::method_not_allowed))
        .fallback(handlers::not_found)
        .layer(cors)
        .with_state(state)
}
