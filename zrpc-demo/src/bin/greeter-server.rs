// MIT License
// Copyright 2023--present zrpc developers

use zrpc_core::ZrpcServer;
use zrpc_demo::{app_router, init_tracing, DEFAULT_ADDRESS};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let address = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_ADDRESS.to_string());
    let server = ZrpcServer::bind(app_router(), address)?;
    if server.start().await.is_none() {
        // Already logged by `start`.
        return Ok(());
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    Ok(())
}
