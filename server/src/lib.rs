//! ============================================================================
//! COMP-SERVER: HTTP front end for the composition builder
//! ============================================================================
//! One blocking `tiny_http` loop serving the JSON API. Requests are handled
//! one at a time; every save writes the whole composition, so concurrent
//! editors resolve last-write-wins.
//! ============================================================================

pub mod routes;

use anyhow::{anyhow, Result};
use tiny_http::Server;
use tracing::{debug, info, warn};

use comp_core::{CompDb, CompService, ServerConfig};

/// Start the server and block serving requests
pub fn run() -> Result<()> {
    // Load environment variables from .env file
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Could not load .env file: {}", e);
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("comp_server=debug".parse()?)
                .add_directive("comp_core=debug".parse()?),
        )
        .init();

    info!("Starting Comp Builder server");

    let config = ServerConfig::default();
    let db = CompDb::open(config.db_path.as_deref())?;
    let service = CompService::new(db)?;

    let server = Server::http(&config.bind_addr)
        .map_err(|e| anyhow!("Failed to start server on {}: {}", config.bind_addr, e))?;
    info!("Listening on http://{}", config.bind_addr);

    for mut request in server.incoming_requests() {
        let mut body = String::new();
        if let Err(e) = request.as_reader().read_to_string(&mut body) {
            warn!("Failed to read request body: {}", e);
        }

        let method = request.method().clone();
        let url = request.url().to_string();
        let response = routes::handle(&service, &config, &method, &url, &body);
        // Query strings can carry the viewer password
        debug!("{} {} -> {}", method, routes::log_path(&url), response.status);

        if let Err(e) = request.respond(response.into_http()) {
            warn!("Failed to send response: {}", e);
        }
    }

    Ok(())
}
