//! ChatServer: listening socket, room registry and accept loop

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::handler::handle_connection;
use crate::room::RoomRegistry;

/// The chat server
///
/// Owns the listener and the global room registry. Each accepted
/// connection runs as its own spawned task; tasks are never joined.
pub struct ChatServer {
    listener: TcpListener,
    rooms: Arc<RoomRegistry>,
    config: ServerConfig,
}

impl ChatServer {
    /// Bind the listening socket
    pub async fn bind(config: ServerConfig) -> Result<Self, AppError> {
        let listener = TcpListener::bind(&config.bind_addr).await?;
        Ok(Self {
            listener,
            rooms: Arc::new(RoomRegistry::new()),
            config,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, AppError> {
        Ok(self.listener.local_addr()?)
    }

    /// Shared handle to the room registry
    pub fn rooms(&self) -> Arc<RoomRegistry> {
        Arc::clone(&self.rooms)
    }

    /// Accept connections forever
    ///
    /// A failed accept is logged and skipped.
    pub async fn run(self) {
        info!("ChatServer started");

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    info!("New connection from {}", addr);
                    let rooms = Arc::clone(&self.rooms);
                    let config = self.config.clone();

                    // Spawn handler task for each connection
                    tokio::spawn(async move {
                        match handle_connection(stream, rooms, config).await {
                            Ok(()) => debug!("Session from {} ended", addr),
                            Err(e) if e.is_fatal() => {
                                debug!("Session from {} ended: {}", addr, e)
                            }
                            Err(e) => warn!("Session from {} failed: {}", addr, e),
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}
