//! Server configuration

use std::time::Duration;

use crate::message::Message;
use crate::queue::DEFAULT_DEQUEUE_TIMEOUT;

/// Default server address
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Runtime settings for `ChatServer`
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind, `host:port`
    pub bind_addr: String,
    /// Wait used by every session queue before retrying
    pub dequeue_timeout: Duration,
    /// Longest accepted inbound frame, excluding the newline
    pub max_frame_len: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_ADDR.to_string(),
            dequeue_timeout: DEFAULT_DEQUEUE_TIMEOUT,
            max_frame_len: Message::MAX_LEN,
        }
    }
}

impl ServerConfig {
    /// Build from command-line arguments (program name already skipped)
    ///
    /// The first argument is either a bare port, bound on all interfaces,
    /// or a full `host:port`.
    pub fn from_args<I>(mut args: I) -> Self
    where
        I: Iterator<Item = String>,
    {
        let mut config = Self::default();
        if let Some(arg) = args.next() {
            config.bind_addr = match arg.parse::<u16>() {
                Ok(port) => format!("0.0.0.0:{port}"),
                Err(_) => arg,
            };
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_args(args(&[]));
        assert_eq!(config.bind_addr, DEFAULT_ADDR);
        assert_eq!(config.dequeue_timeout, Duration::from_secs(1));
        assert_eq!(config.max_frame_len, 255);
    }

    #[test]
    fn test_bare_port() {
        let config = ServerConfig::from_args(args(&["9000"]));
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
    }

    #[test]
    fn test_full_address() {
        let config = ServerConfig::from_args(args(&["127.0.0.1:7000"]));
        assert_eq!(config.bind_addr, "127.0.0.1:7000");
    }
}
