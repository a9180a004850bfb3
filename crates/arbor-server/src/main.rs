//! # arbor-server
//!
//! Authoritative HTTP service for the Arbor comment engine.
//!
//! This binary provides:
//! - **REST API** (axum) for listing posts, fetching a post with its comment
//!   thread, and creating, editing, deleting and liking comments
//! - **SQLite persistence** through `arbor-store`
//! - **Asserted identity** via the `x-actor-id` header, falling back to a
//!   configured default user

mod api;
mod config;
mod error;
mod identity;

use std::sync::Arc;

use arbor_shared::constants::APP_NAME;
use arbor_store::Database;
use tokio::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,arbor_server=debug")),
        )
        .init();

    info!("Starting {} server v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Open the database and resolve the default actor
    // -----------------------------------------------------------------------
    let mut db = Database::open_at(&config.database_path)?;
    if config.seed_demo && db.seed_demo()? {
        info!(path = %config.database_path.display(), "Seeded demo data");
    }

    let default_actor = match db.find_user_by_name(&config.default_user) {
        Ok(user) => {
            info!(user = %user.name, id = %user.id, "Default actor resolved");
            Some(user.id)
        }
        Err(arbor_store::StoreError::NotFound(_)) => {
            warn!(
                user = %config.default_user,
                "Default user does not exist, requests must send an actor header"
            );
            None
        }
        Err(e) => return Err(e.into()),
    };

    let http_addr = config.http_addr;
    let app_state = AppState {
        db: Arc::new(Mutex::new(db)),
        config: Arc::new(config),
        default_actor,
    };

    // -----------------------------------------------------------------------
    // 4. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
