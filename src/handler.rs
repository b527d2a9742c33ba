//! Session protocol handler
//!
//! Drives one client connection through login and then either the sender
//! command loop or the receiver delivery loop. Once logged in, every exit
//! path drops the `Session`, which performs cleanup.

use std::sync::Arc;

use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::connection::Connection;
use crate::error::AppError;
use crate::message::{Message, Tag};
use crate::room::RoomRegistry;
use crate::session::Session;

/// Handle a new TCP connection
///
/// Returns `Ok` when the session ended normally (QUIT, peer gone, or a
/// rejected login/join that was answered with `ERR`).
pub async fn handle_connection(
    stream: TcpStream,
    rooms: Arc<RoomRegistry>,
    config: ServerConfig,
) -> Result<(), AppError> {
    let mut conn = Connection::new(stream).with_max_frame_len(config.max_frame_len);
    let peer_addr = conn
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let login_msg = match receive(&mut conn).await? {
        Some(msg) => msg,
        None => return Ok(()),
    };

    let is_sender = match login_msg.tag {
        Tag::SLogin => true,
        Tag::RLogin => false,
        _ => return reject(&mut conn, AppError::ExpectedLogin).await,
    };
    if login_msg.data.is_empty() {
        return reject(&mut conn, AppError::EmptyUsername).await;
    }

    let mut session = Session::login(conn, rooms, &login_msg.data, config.dequeue_timeout);
    info!(
        "{} logged in as {} from {}",
        login_msg.data,
        if is_sender { "sender" } else { "receiver" },
        peer_addr
    );
    session
        .conn
        .send(&Message::ok(format!("logged in as {}", login_msg.data)))
        .await?;

    if is_sender {
        chat_with_sender(&mut session).await
    } else {
        chat_with_receiver(&mut session).await
    }
}

/// Receive the next message, answering protocol errors with `ERR`
///
/// Returns `Ok(None)` when the session should end after a protocol error.
async fn receive(conn: &mut Connection) -> Result<Option<Message>, AppError> {
    match conn.receive().await {
        Ok(msg) => {
            debug!("Received {}:{}", msg.tag, msg.data);
            Ok(Some(msg))
        }
        Err(e) if e.is_protocol() => {
            warn!("Protocol error from {:?}: {}", conn.peer_addr(), e);
            reject(conn, e).await?;
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Reply with `ERR` and end the session
async fn reject(conn: &mut Connection, err: AppError) -> Result<(), AppError> {
    conn.send(&Message::from(err)).await?;
    conn.close().await;
    Ok(())
}

/// Sender command loop: runs until QUIT or connection failure
async fn chat_with_sender(session: &mut Session) -> Result<(), AppError> {
    loop {
        let Some(msg) = receive(&mut session.conn).await? else {
            return Ok(());
        };

        let reply = match msg.tag {
            Tag::SendAll => session
                .send_all(&msg.data)
                .map(|_| Message::ok("message sent")),
            Tag::Join => session
                .join(&msg.data)
                .map(|room| Message::ok(format!("joined room {}", room.name()))),
            Tag::Leave => session
                .leave()
                .map(|room| Message::ok(format!("left room {}", room.name())))
                .ok_or(AppError::NotInRoom),
            Tag::Quit => {
                session.conn.send(&Message::ok("bye!")).await?;
                session.conn.close().await;
                return Ok(());
            }
            _ => Err(AppError::InvalidCommand),
        };

        let reply = reply.unwrap_or_else(Message::from);
        session.conn.send(&reply).await?;
    }
}

/// Receiver loop: JOIN once, then forward deliveries until the peer is gone
///
/// Each dequeue timeout re-checks whether the peer has disconnected, so a
/// receiver in a quiet room still ends.
async fn chat_with_receiver(session: &mut Session) -> Result<(), AppError> {
    let join_msg = match session.conn.receive().await {
        Ok(msg) => msg,
        Err(e) if e.is_fatal() => return Err(e),
        Err(_) => return reject(&mut session.conn, AppError::InvalidMessage).await,
    };

    if join_msg.tag != Tag::Join {
        return reject(&mut session.conn, AppError::ExpectedJoin).await;
    }
    if let Err(e) = session.join(&join_msg.data) {
        return reject(&mut session.conn, e).await;
    }
    session.conn.send(&Message::ok("welcome")).await?;

    let queue = Arc::clone(session.queue());
    loop {
        match queue.dequeue().await {
            Some(msg) => session.conn.send(&msg).await?,
            None if session.conn.peer_closed().await => {
                debug!("Receiver {} disconnected", session.user().username);
                return Ok(());
            }
            None => {}
        }
    }
}
