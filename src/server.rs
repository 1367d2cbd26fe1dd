//!
//! forkful HTTP server
//! --------------------
//! Axum router and process lifecycle for the ordering backend.
//!
//! Responsibilities:
//! - Open the document store before serving and close it (final snapshot) after
//!   graceful shutdown.
//! - Build the token verifier and image uploader from configuration.
//! - Mount the routes, wrapping account-scoped ones in identity resolution.
//!
//! Route guards:
//! - `require_identity`: bearer token verified and bound to an existing account.
//! - `require_token`: bearer token verified only (`POST /api/my/user`, which
//!   creates the account).
//! - none: public restaurant listing.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, patch};
use axum::Router;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::identity::{require_identity, require_token, JwksVerifier, TokenVerifier};
use crate::media::{CloudinaryUploader, MediaUploader};
use crate::storage::SharedStore;

pub mod extract;
pub mod order;
pub mod restaurant;
pub mod search;
pub mod user;

/// Largest accepted restaurant image.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
/// Request body cap for multipart routes: the image plus the text fields.
const MAX_FORM_BYTES: usize = MAX_IMAGE_BYTES + 256 * 1024;

/// Shared server state injected into all handlers and route guards.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub verifier: Arc<dyn TokenVerifier>,
    pub uploader: Arc<dyn MediaUploader>,
}

impl AppState {
    pub fn new(store: SharedStore, verifier: Arc<dyn TokenVerifier>, uploader: Arc<dyn MediaUploader>) -> Self {
        Self { store, verifier, uploader }
    }
}

/// All routes with their guards; the caller provides the listener.
pub fn build_router(state: AppState) -> Router {
    let identity = middleware::from_fn_with_state(state.clone(), require_identity);
    let token = middleware::from_fn_with_state(state.clone(), require_token);

    Router::new()
        .route("/api/my/user", get(user::get_current_user).put(user::update_current_user).route_layer(identity.clone()))
        .route("/api/my/user", axum::routing::post(user::create_current_user).route_layer(token))
        .route(
            "/api/my/restaurant",
            get(restaurant::get_my_restaurant)
                .post(restaurant::create_my_restaurant)
                .put(restaurant::update_my_restaurant)
                .route_layer(identity.clone())
                .layer(DefaultBodyLimit::max(MAX_FORM_BYTES)),
        )
        .route("/api/my/restaurant/order", get(order::get_my_restaurant_orders).route_layer(identity.clone()))
        .route("/api/my/restaurant/order/{orderId}/status", patch(order::update_order_status).route_layer(identity.clone()))
        .route("/api/order", get(order::get_my_orders).post(order::create_order).route_layer(identity))
        .route("/api/restaurant/search/{city}", get(restaurant::search_restaurants))
        .route("/api/restaurant/{restaurantId}", get(restaurant::get_restaurant))
        .with_state(state)
}

fn log_startup_folders(cfg: &ServerConfig) {
    let cwd = std::env::current_dir().ok();
    let exe = std::env::current_exe().ok();
    let db_env = std::env::var("FORKFUL_DB_FOLDER").ok();
    info!(
        target: "forkful::startup",
        "forkful starting. Folder configuration: cwd={:?}, exe={:?}, db_root_param={:?}, FORKFUL_DB_FOLDER_env={:?}",
        cwd, exe, cfg.db_root, db_env
    );
    info!(
        target: "forkful::startup",
        "Token issuer={} audience={} image_host_cloud={} snapshot_interval={:?}",
        cfg.auth.issuer_base_url, cfg.auth.audience, cfg.cloudinary.cloud_name, cfg.snapshot_interval
    );
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(target: "forkful::startup", "failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!(target: "forkful::startup", "shutdown requested");
}

/// Start the forkful HTTP server and block until Ctrl-C.
pub async fn run_with_config(cfg: ServerConfig) -> anyhow::Result<()> {
    log_startup_folders(&cfg);

    let store = SharedStore::open(&cfg.db_root)
        .with_context(|| format!("Failed to open document store under: {}", cfg.db_root))?;
    let snapshots = store.spawn_snapshot_task(cfg.snapshot_interval);

    let verifier: Arc<dyn TokenVerifier> = Arc::new(JwksVerifier::new(&cfg.auth));
    let uploader: Arc<dyn MediaUploader> = Arc::new(CloudinaryUploader::new(cfg.cloudinary.clone()));
    let app = build_router(AppState::new(store.clone(), verifier, uploader));

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.http_port));
    info!(target: "forkful::startup", "Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    snapshots.abort();
    store.close().context("Final snapshot flush failed")?;
    info!(target: "forkful::startup", "forkful stopped");
    Ok(())
}
