pub mod registry;
pub mod relay;
pub mod shared_types;
pub mod websocket;

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use relay::Relay;

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
}

/// Build the application router: the `/ws` relay endpoint plus the static
/// asset bundle served from `static_dir` on the same port.
pub fn app(state: AppState, static_dir: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // /ws is registered first so it takes priority over the asset fallback.
    Router::new()
        .route("/ws", get(websocket::websocket_handler))
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
        .layer(cors)
}
