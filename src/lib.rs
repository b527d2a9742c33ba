//! Room-based TCP Chat Server Library
//!
//! A line-oriented chat server: clients log in as senders or receivers,
//! join named rooms and exchange text messages through the server.
//!
//! # Protocol
//! One frame per line, `TAG:payload\n`. Senders log in with `SLOGIN`,
//! then issue `JOIN`, `LEAVE`, `SENDALL` and `QUIT`. Receivers log in with
//! `RLOGIN`, send one `JOIN`, and then receive `DELIVERY:room:sender:text`
//! frames.
//!
//! # Architecture
//! - `ChatServer` accepts connections and spawns one task per connection
//! - Each task owns a `Session` whose `Drop` performs cleanup
//! - `Room`s live in a shared `RoomRegistry`; a broadcast enqueues a copy
//!   into every member's `MessageQueue`
//! - Three independent locks (registry, room, queue), never nested
//!
//! # Example
//! ```ignore
//! use room_chat_server::{ChatServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = ChatServer::bind(ServerConfig::default()).await.unwrap();
//!     server.run().await;
//! }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod handler;
pub mod message;
pub mod queue;
pub mod room;
pub mod server;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use config::ServerConfig;
pub use connection::{Connection, ConnectionStatus};
pub use error::AppError;
pub use handler::handle_connection;
pub use message::{Message, Tag};
pub use queue::MessageQueue;
pub use room::{Room, RoomRegistry};
pub use server::ChatServer;
pub use session::Session;
pub use types::{User, UserId};
