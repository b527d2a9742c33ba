//! Error types for the chat server
//!
//! Uses thiserror for ergonomic error definitions. The display text of
//! every non-I/O variant doubles as the reason sent to the peer in an
//! `ERR` frame.

use thiserror::Error;

/// Application-level errors
///
/// Covers connection failures (session terminates silently), protocol
/// errors (reported as `ERR` when possible, then the session terminates)
/// and application errors (reported as `ERR`, session continues).
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Peer closed the connection, or the connection was already closed
    #[error("connection closed")]
    ConnectionClosed,

    /// Frame without a `:` delimiter, or not valid UTF-8
    #[error("invalid message")]
    InvalidMessage,

    /// Frame longer than the connection's maximum frame length
    #[error("message too long")]
    FrameTooLong,

    /// First message was neither SLOGIN nor RLOGIN
    #[error("expected slogin or rlogin")]
    ExpectedLogin,

    /// Login carried an empty username
    #[error("empty username")]
    EmptyUsername,

    /// Receiver sent something other than JOIN after logging in
    #[error("Expected JOIN")]
    ExpectedJoin,

    /// JOIN carried an empty room name
    #[error("empty room name")]
    EmptyRoomName,

    /// SENDALL or LEAVE while not in any room
    #[error("not in a room")]
    NotInRoom,

    /// Tag not valid for a sender session
    #[error("invalid command")]
    InvalidCommand,
}

impl AppError {
    /// Connection-level failure: no reply can be delivered.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::Io(_) | AppError::ConnectionClosed)
    }

    /// Malformed frame on the wire.
    pub fn is_protocol(&self) -> bool {
        matches!(self, AppError::InvalidMessage | AppError::FrameTooLong)
    }
}
