//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

use arbor_shared::constants::{DEFAULT_HTTP_PORT, DEFAULT_USER_NAME};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: `./arbor.db`
    pub database_path: PathBuf,

    /// Origin allowed by CORS. `None` allows any origin.
    /// Env: `CLIENT_URL`
    pub client_url: Option<String>,

    /// Name of the user requests act as when no actor header is sent.
    /// Env: `DEFAULT_USER`
    /// Default: `Zach`
    pub default_user: String,

    /// Seed demo users, posts and comments into an empty database.
    /// Env: `SEED_DEMO` (true/false)
    /// Default: `true`
    pub seed_demo: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: PathBuf::from("./arbor.db"),
            client_url: None,
            default_user: DEFAULT_USER_NAME.to_string(),
            seed_demo: true,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(path) = lookup("DATABASE_PATH") {
            if !path.trim().is_empty() {
                config.database_path = PathBuf::from(path);
            }
        }

        if let Some(url) = lookup("CLIENT_URL") {
            let url = url.trim();
            if !url.is_empty() {
                config.client_url = Some(url.trim_end_matches('/').to_string());
            }
        }

        if let Some(name) = lookup("DEFAULT_USER") {
            let name = name.trim();
            if name.is_empty() {
                tracing::warn!("Empty DEFAULT_USER, using default");
            } else {
                config.default_user = name.to_string();
            }
        }

        if let Some(val) = lookup("SEED_DEMO") {
            config.seed_demo = val != "false" && val != "0";
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter.

        config
    }
}
