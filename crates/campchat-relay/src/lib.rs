//! CampChat Relay - streaming chat relay for the camp assistant.
//!
//! One stateless endpoint: the browser posts its conversation, the relay
//! prepends the camp system prompt, calls the AI gateway with streaming on and
//! pipes the event stream straight back.

pub mod api;
pub mod config;
pub mod error;
pub mod gateway;
mod http_client;
pub mod middleware;

use axum::{
    Router,
    http::{HeaderName, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use api::RelayState;
pub use config::RelayConfig;
pub use error::{RelayError, Result};

const ALLOWED_HEADERS: [&str; 8] = [
    "authorization",
    "x-client-info",
    "apikey",
    "content-type",
    "x-supabase-client-platform",
    "x-supabase-client-platform-version",
    "x-supabase-client-runtime",
    "x-supabase-client-runtime-version",
];

/// Permissive CORS. Preflight `OPTIONS` requests are answered here and never
/// reach a handler.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::GET, Method::OPTIONS])
        .allow_headers(ALLOWED_HEADERS.map(HeaderName::from_static))
}

pub fn build_router(state: RelayState) -> Router {
    Router::new()
        .route(
            "/chat",
            post(api::chat::chat).route_layer(from_fn_with_state(
                state.clone(),
                middleware::require_bearer,
            )),
        )
        .route("/health", get(api::health::health))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}
