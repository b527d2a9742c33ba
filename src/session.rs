//! Per-connection session state
//!
//! A `Session` exists from a successful login until the connection ends.
//! It owns the framed connection, the logged-in user with its private
//! queue, and the current room. Cleanup lives in `Drop`, so it runs
//! exactly once on every exit path.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::connection::Connection;
use crate::error::AppError;
use crate::queue::MessageQueue;
use crate::room::{Room, RoomRegistry};
use crate::types::User;

/// One logged-in client connection on the server
#[derive(Debug)]
pub struct Session {
    pub(crate) conn: Connection,
    rooms: Arc<RoomRegistry>,
    user: User,
    queue: Arc<MessageQueue>,
    room: Option<Arc<Room>>,
}

impl Session {
    /// Start a session for `username`, creating its private queue
    ///
    /// The username must already have been checked as non-empty.
    pub fn login(
        conn: Connection,
        rooms: Arc<RoomRegistry>,
        username: &str,
        dequeue_timeout: Duration,
    ) -> Self {
        Self {
            conn,
            rooms,
            user: User::new(username),
            queue: Arc::new(MessageQueue::with_timeout(dequeue_timeout)),
            room: None,
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn queue(&self) -> &Arc<MessageQueue> {
        &self.queue
    }

    pub fn current_room(&self) -> Option<&Arc<Room>> {
        self.room.as_ref()
    }

    /// Leave any current room, then subscribe to `room_name`
    pub fn join(&mut self, room_name: &str) -> Result<Arc<Room>, AppError> {
        if room_name.is_empty() {
            return Err(AppError::EmptyRoomName);
        }
        let room = self.rooms.find_or_create_room(room_name);
        self.leave();

        room.add_member(&self.user, Arc::clone(&self.queue));
        self.room = Some(Arc::clone(&room));
        Ok(room)
    }

    /// Unsubscribe from the current room, returning it
    pub fn leave(&mut self) -> Option<Arc<Room>> {
        let room = self.room.take()?;
        room.remove_member(self.user.id);
        Some(room)
    }

    /// Broadcast `text` to the current room as this session's user
    pub fn send_all(&self, text: &str) -> Result<usize, AppError> {
        let room = self.room.as_ref().ok_or(AppError::NotInRoom)?;
        Ok(room.broadcast_message(&self.user.username, text))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.leave();
        debug!(
            "Session for {} ({}) cleaned up, {} undelivered messages discarded",
            self.user.username,
            self.user.id,
            self.queue.len()
        );
    }
}
