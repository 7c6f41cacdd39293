//! Server configuration, read from the environment.

use serde::{Deserialize, Serialize};

use crate::catalog::DEFAULT_CATALOG_URL;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP server binds to
    pub bind_addr: String,
    /// Database file; None falls back to the default location
    pub db_path: Option<String>,
    /// Public origin used for share links in exported templates
    pub public_url: String,
    /// Where `import-catalog` fetches the item dump from by default
    pub catalog_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: std::env::var("COMP_BIND_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:3000".to_string()),
            db_path: std::env::var(crate::db::DB_PATH_ENV).ok(),
            public_url: std::env::var("COMP_PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            catalog_url: std::env::var("COMP_CATALOG_URL")
                .unwrap_or_else(|_| DEFAULT_CATALOG_URL.to_string()),
        }
    }
}
