//! Kombu server - restaurant stock and menu availability engine.
//!
//! This binary serves the JSON API on port 4000 by default.
//!
//! # Architecture
//!
//! - Axum web framework over the stock engine (ledger, resolver, mutator)
//! - In-memory document store with atomic check-then-mutate sections
//! - Moka-backed menu view cache, hand-built dual-bound image byte cache
//! - Injectable clock and authentication policy

#![cfg_attr(not(test), forbid(unsafe_code))]

use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kombu_server::config::KombuConfig;
use kombu_server::routes;
use kombu_server::state::AppState;

#[tokio::main]
async fn main() {
    // Initialize tracing with EnvFilter; defaults to info level for this
    // crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "kombu_server=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = KombuConfig::from_env().expect("Failed to load configuration");
    let addr = config.socket_addr();
    tracing::info!(%addr, image_dir = %config.image_dir.display(), "starting kombu server");

    let state = AppState::new(config);
    let app = routes::router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}
