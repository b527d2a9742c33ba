//! Rooms and the global room registry
//!
//! A room is a named set of subscriptions, each mapping a logged-in user to
//! that session's message queue. Rooms are created on first join and live
//! as long as the server.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::message::Message;
use crate::queue::MessageQueue;
use crate::types::{User, UserId};

/// One subscription in a room
#[derive(Debug)]
struct Member {
    username: String,
    queue: Arc<MessageQueue>,
}

/// Named broadcast group
///
/// The membership lock serializes joins, leaves and broadcasts, so a
/// broadcast always sees a consistent membership snapshot.
#[derive(Debug)]
pub struct Room {
    name: String,
    members: Mutex<HashMap<UserId, Member>>,
}

impl Room {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Mutex::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<UserId, Member>> {
        self.members.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe `user` with its queue, replacing any previous entry
    pub fn add_member(&self, user: &User, queue: Arc<MessageQueue>) {
        let mut members = self.lock();
        members.insert(
            user.id,
            Member {
                username: user.username.clone(),
                queue,
            },
        );
        info!("{} joined room {} ({} members)", user.username, self.name, members.len());
    }

    /// Unsubscribe `user_id`; returns whether it was a member
    pub fn remove_member(&self, user_id: UserId) -> bool {
        let mut members = self.lock();
        match members.remove(&user_id) {
            Some(member) => {
                info!("{} left room {} ({} members)", member.username, self.name, members.len());
                true
            }
            None => false,
        }
    }

    /// Enqueue a DELIVERY copy of `text` into every member's queue
    ///
    /// Every member receives it, including the broadcasting session if it
    /// is itself subscribed. Returns the number of queues delivered to.
    pub fn broadcast_message(&self, sender_username: &str, text: &str) -> usize {
        let members = self.lock();
        let msg = Message::delivery(&self.name, sender_username, text);
        for member in members.values() {
            member.queue.enqueue(msg.clone());
        }
        debug!(
            "Broadcast from {} in room {} to {} members",
            sender_username,
            self.name,
            members.len()
        );
        members.len()
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.lock().contains_key(&user_id)
    }

    pub fn member_count(&self) -> usize {
        self.lock().len()
    }
}

/// Global registry: room name -> room
///
/// Only grows. Handles returned from it stay valid for the server's
/// lifetime.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: Mutex<HashMap<String, Arc<Room>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<Room>>> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the room called `name`, creating it if needed
    pub fn find_or_create_room(&self, name: &str) -> Arc<Room> {
        let mut rooms = self.lock();
        if let Some(room) = rooms.get(name) {
            return Arc::clone(room);
        }
        let room = Arc::new(Room::new(name));
        rooms.insert(name.to_string(), Arc::clone(&room));
        debug!("Room {} created (total rooms: {})", name, rooms.len());
        room
    }

    pub fn get(&self, name: &str) -> Option<Arc<Room>> {
        self.lock().get(name).cloned()
    }

    pub fn room_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(name: &str) -> (User, Arc<MessageQueue>) {
        (User::new(name), Arc::new(MessageQueue::new()))
    }

    #[test]
    fn test_add_member_idempotent() {
        let room = Room::new("lobby");
        let (alice, queue) = member("alice");

        room.add_member(&alice, Arc::clone(&queue));
        room.add_member(&alice, Arc::clone(&queue));
        assert_eq!(room.member_count(), 1);
        assert!(room.contains(alice.id));
    }

    #[test]
    fn test_remove_member() {
        let room = Room::new("lobby");
        let (alice, queue) = member("alice");
        room.add_member(&alice, queue);

        assert!(room.remove_member(alice.id));
        assert!(!room.contains(alice.id));

        // Removing again is a no-op
        assert!(!room.remove_member(alice.id));
    }

    #[tokio::test]
    async fn test_broadcast_fan_out() {
        let room = Room::new("room");
        let members: Vec<_> = ["a", "b", "c"].into_iter().map(member).collect();
        for (user, queue) in &members {
            room.add_member(user, Arc::clone(queue));
        }
        let (_outsider, outsider_queue) = member("d");

        assert_eq!(room.broadcast_message("alice", "hi"), 3);

        let expected = Message::delivery("room", "alice", "hi");
        assert_eq!(expected.data, "room:alice:hi");
        for (_, queue) in &members {
            assert_eq!(queue.len(), 1);
            assert_eq!(queue.dequeue().await, Some(expected.clone()));
        }
        assert!(outsider_queue.is_empty());
    }

    #[test]
    fn test_broadcast_reaches_own_subscription() {
        let room = Room::new("lobby");
        let (alice, queue) = member("alice");
        room.add_member(&alice, Arc::clone(&queue));

        room.broadcast_message(&alice.username, "echo");
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_same_username_separate_members() {
        let room = Room::new("lobby");
        let (first, q1) = member("bob");
        let (second, q2) = member("bob");
        room.add_member(&first, Arc::clone(&q1));
        room.add_member(&second, Arc::clone(&q2));
        assert_eq!(room.member_count(), 2);

        room.remove_member(first.id);
        room.broadcast_message("carol", "hi");
        assert!(q1.is_empty());
        assert_eq!(q2.len(), 1);
    }

    #[test]
    fn test_registry_find_or_create() {
        let registry = RoomRegistry::new();
        assert!(registry.is_empty());

        let a = registry.find_or_create_room("lobby");
        let b = registry.find_or_create_room("lobby");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.name(), "lobby");

        registry.find_or_create_room("games");
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.room_names(), vec!["games", "lobby"]);
        assert!(registry.get("nowhere").is_none());
    }

    #[test]
    fn test_registry_concurrent_creation_single_room() {
        let registry = Arc::new(RoomRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.find_or_create_room("shared"))
            })
            .collect();
        let rooms: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(registry.len(), 1);
        assert!(rooms.iter().all(|r| Arc::ptr_eq(r, &rooms[0])));
    }
}
