//! DeBank MCP Server
//!
//! A Model Context Protocol server for the DeBank Pro API.

use rmcp::ServiceExt;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use debank_mcp::{Config, DeBankServer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Fail fast before touching stdout
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("debank-mcp: {e}");
            std::process::exit(1);
        }
    };

    // Initialize logging; stdout carries the MCP transport
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    tracing::info!("Starting DeBank MCP Server");

    let server = match DeBankServer::new(config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize server");
            eprintln!("debank-mcp: {e}");
            std::process::exit(1);
        }
    };

    // Run with stdio transport
    let transport = rmcp::transport::stdio();
    let running = server.serve(transport).await?;

    // Wait for the server to finish
    running.waiting().await?;

    Ok(())
}
