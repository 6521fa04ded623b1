//! Serve command: run the HTTP API.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use kerasgen_api::create_router;
use kerasgen_ops::{Config, OpsContext};
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Bind the listener and serve until the process is stopped.
pub async fn execute(config: Config, port: Option<u16>) -> Result<()> {
    let port = port.unwrap_or(config.server.port);
    if let Err(e) = config.validate_broker() {
        warn!("{}; POST /fit will fail until the broker is configured", e);
    }

    let workspace_root = config.server.workspace_root.clone();
    let policy = config.server.literal_policy;
    let app = create_router(OpsContext::new(config));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;

    info!(
        %addr,
        workspace = %workspace_root.display(),
        %policy,
        "kerasgen API listening"
    );
    println!();
    println!("kerasgen API");
    println!("   URL:    http://localhost:{}", port);
    println!("   Health: http://localhost:{}/health", port);
    println!();
    println!("   Press Ctrl+C to stop");
    println!();

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
