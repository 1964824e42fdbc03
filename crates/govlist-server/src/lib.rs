//! HTTP front for the listing engine.
//!
//! # Routes
//!
//! - `GET /listings?page&perPage&searchTerm&region&category&favorites`
//!   returns `{ "data": [...], "totalItems": n }`
//! - `GET /health` returns liveness and the state of the dataset cache
//!
//! Errors come back as `{ "message": "..." }`: 400 for query parameters we
//! can't parse, 500 for anything the upstream or our config did wrong.
//!
//! # Caching
//!
//! The whole upstream collection is fetched in one large page and held for
//! the cache TTL. Every instance keeps its own copy, so two instances can
//! disagree for up to one TTL plus one fetch.
use std::{sync::Arc, time::Duration};

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::get,
    Router,
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

pub mod error;
pub mod routes;
pub mod state;

pub use error::AppError;
pub use routes::{health_handler, listings_handler};
pub use state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/listings", get(listings_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server(address: &str, state: Arc<AppState>) -> std::io::Result<()> {
    info!("Binding to {address}");
    let listener = TcpListener::bind(address).await?;
    info!("Server running on {address}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install terminate handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
