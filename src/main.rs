//! Room Chat Server - Entry Point
//!
//! Binds the listener and runs the accept loop until the process is
//! terminated.

use std::env;

use tracing::info;
use tracing_subscriber::EnvFilter;

use room_chat_server::{ChatServer, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=room_chat_server=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("room_chat_server=info")),
        )
        .init();

    // Port or host:port from the command line, or the default address
    let config = ServerConfig::from_args(env::args().skip(1));

    let server = ChatServer::bind(config).await?;
    info!("Chat server listening on {}", server.local_addr()?);

    server.run().await;
    Ok(())
}
