//! Message protocol definitions
//!
//! Line-oriented text protocol: one frame per line, `TAG:payload\n`.
//! Only the first `:` is significant; the payload may contain more.

use std::fmt;

use crate::error::AppError;

/// Field delimiter between tag and payload
pub const DELIMITER: char = ':';

/// Protocol message-type discriminator
///
/// Tags are uppercase and matched exactly. Anything else is kept verbatim
/// as `Other` so the session can answer it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    /// Log in as a sender (client → server)
    SLogin,
    /// Log in as a receiver (client → server)
    RLogin,
    /// Join or create a room (client → server)
    Join,
    /// Leave the current room (client → server)
    Leave,
    /// Broadcast to the current room (client → server)
    SendAll,
    /// End the session (client → server)
    Quit,
    /// Success acknowledgment (server → client)
    Ok,
    /// Failure acknowledgment (server → client)
    Err,
    /// Broadcast chat message, payload `room:sender:text` (server → receiver)
    Delivery,
    /// Anything else
    Other(String),
}

impl Tag {
    pub fn as_str(&self) -> &str {
        match self {
            Tag::SLogin => "SLOGIN",
            Tag::RLogin => "RLOGIN",
            Tag::Join => "JOIN",
            Tag::Leave => "LEAVE",
            Tag::SendAll => "SENDALL",
            Tag::Quit => "QUIT",
            Tag::Ok => "OK",
            Tag::Err => "ERR",
            Tag::Delivery => "DELIVERY",
            Tag::Other(s) => s.as_str(),
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "SLOGIN" => Tag::SLogin,
            "RLOGIN" => Tag::RLogin,
            "JOIN" => Tag::Join,
            "LEAVE" => Tag::Leave,
            "SENDALL" => Tag::SendAll,
            "QUIT" => Tag::Quit,
            "OK" => Tag::Ok,
            "ERR" => Tag::Err,
            "DELIVERY" => Tag::Delivery,
            _ => Tag::Other(s.to_string()),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One protocol message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub tag: Tag,
    pub data: String,
}

impl Message {
    /// Longest accepted inbound frame, excluding the trailing newline
    pub const MAX_LEN: usize = 255;

    pub fn new(tag: Tag, data: impl Into<String>) -> Self {
        Self {
            tag,
            data: data.into(),
        }
    }

    pub fn ok(data: impl Into<String>) -> Self {
        Self::new(Tag::Ok, data)
    }

    pub fn err(data: impl Into<String>) -> Self {
        Self::new(Tag::Err, data)
    }

    /// Build a DELIVERY message with payload `room:sender:text`
    pub fn delivery(room: &str, sender: &str, text: &str) -> Self {
        Self::new(
            Tag::Delivery,
            format!("{room}{DELIMITER}{sender}{DELIMITER}{text}"),
        )
    }

    /// Serialize as a wire frame, including the trailing newline
    pub fn to_frame(&self) -> String {
        format!("{}{}{}\n", self.tag, DELIMITER, self.data)
    }

    /// Parse one line (without its newline) into a message
    ///
    /// Splits at the first delimiter only.
    pub fn parse_frame(line: &str) -> Result<Self, AppError> {
        let (tag, data) = line
            .split_once(DELIMITER)
            .ok_or(AppError::InvalidMessage)?;
        Ok(Self::new(Tag::parse(tag), data))
    }
}

/// Render an error as an `ERR` frame for the peer
impl From<AppError> for Message {
    fn from(err: AppError) -> Self {
        Message::err(err.to_string())
    }
}
