use std::{env, sync::Arc};

use scribble_backend::{AppState, app, relay::Relay};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scribble_backend=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let static_dir = env::var("STATIC_DIR").unwrap_or_else(|_| "public".to_string());

    let state = AppState {
        relay: Arc::new(Relay::default()),
    };
    let app = app(state, &static_dir);

    // Bind to 0.0.0.0 so the relay is reachable from other hosts/containers.
    // A bind failure is the one startup error that must stop the process.
    let listener = TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind listening port");
    info!("🚀 Relay listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install CTRL+C handler");
    info!("Shutdown signal received");
}
