//! Wire framing over a TCP stream
//!
//! A `Connection` sends and receives exactly one `Message` per call.
//! Read buffering lives inside the connection and persists across calls.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::AppError;
use crate::message::Message;

/// Result of the last send/receive on a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Success,
    EofOrError,
    InvalidMsg,
}

/// Framed message connection
#[derive(Debug)]
pub struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    peer_addr: Option<SocketAddr>,
    max_frame_len: usize,
    last_result: ConnectionStatus,
    open: bool,
}

impl Connection {
    /// Wrap an accepted or connected stream
    pub fn new(stream: TcpStream) -> Self {
        let peer_addr = stream.peer_addr().ok();
        let (read_half, write_half) = stream.into_split();
        Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            peer_addr,
            max_frame_len: Message::MAX_LEN,
            last_result: ConnectionStatus::Success,
            open: true,
        }
    }

    /// Open a connection to `host:port`
    pub async fn connect(host: &str, port: u16) -> Result<Self, AppError> {
        let stream = TcpStream::connect((host, port)).await?;
        Ok(Self::new(stream))
    }

    /// Override the longest accepted inbound frame
    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    pub fn last_result(&self) -> ConnectionStatus {
        self.last_result
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Write one frame in full
    pub async fn send(&mut self, msg: &Message) -> Result<(), AppError> {
        if !self.open {
            self.last_result = ConnectionStatus::EofOrError;
            return Err(AppError::ConnectionClosed);
        }

        let frame = msg.to_frame();
        if let Err(e) = self.writer.write_all(frame.as_bytes()).await {
            self.last_result = ConnectionStatus::EofOrError;
            return Err(e.into());
        }

        self.last_result = ConnectionStatus::Success;
        Ok(())
    }

    /// Read exactly one frame
    ///
    /// Blocks until a full line arrives. A line longer than the maximum
    /// frame length is rejected rather than buffered.
    pub async fn receive(&mut self) -> Result<Message, AppError> {
        match self.read_frame().await {
            Ok(msg) => {
                self.last_result = ConnectionStatus::Success;
                Ok(msg)
            }
            Err(e) => {
                self.last_result = if e.is_protocol() {
                    ConnectionStatus::InvalidMsg
                } else {
                    ConnectionStatus::EofOrError
                };
                Err(e)
            }
        }
    }

    async fn read_frame(&mut self) -> Result<Message, AppError> {
        if !self.open {
            return Err(AppError::ConnectionClosed);
        }

        let limit = self.max_frame_len as u64 + 1;
        let mut buf = Vec::new();
        let n = (&mut self.reader)
            .take(limit)
            .read_until(b'\n', &mut buf)
            .await?;

        if n == 0 {
            return Err(AppError::ConnectionClosed);
        }

        if buf.last() == Some(&b'\n') {
            buf.pop();
        } else if n as u64 == limit {
            return Err(AppError::FrameTooLong);
        }

        let line = String::from_utf8(buf).map_err(|_| AppError::InvalidMessage)?;
        Message::parse_frame(&line)
    }

    /// Check, without waiting, whether the peer has closed its side
    ///
    /// Peeks the socket, so unread input is left in place. Returns `false`
    /// when nothing can be decided yet.
    pub async fn peer_closed(&mut self) -> bool {
        if !self.open {
            return true;
        }
        if !self.reader.buffer().is_empty() {
            return false;
        }

        let mut byte = [0u8; 1];
        match tokio::time::timeout(Duration::ZERO, self.reader.get_mut().peek(&mut byte)).await {
            Ok(Ok(0)) | Ok(Err(_)) => {
                self.last_result = ConnectionStatus::EofOrError;
                true
            }
            Ok(Ok(_)) | Err(_) => false,
        }
    }

    /// Flush and shut down the write side
    ///
    /// Dropping the connection closes the socket as well.
    pub async fn close(&mut self) {
        if self.open {
            self.open = false;
            if let Err(e) = self.writer.shutdown().await {
                debug!("Shutdown error on {:?}: {}", self.peer_addr, e);
            }
        }
    }
}
