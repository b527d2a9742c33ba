//! Blocking FIFO of owned messages with a bounded wait
//!
//! One queue per logged-in session. Many sessions enqueue into it through
//! room broadcasts; only the owning session dequeues.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::message::Message;

/// How long `dequeue` waits before giving up and returning `None`
pub const DEFAULT_DEQUEUE_TIMEOUT: Duration = Duration::from_secs(1);

/// Per-session message queue
///
/// The semaphore counts available messages: one permit per enqueued item.
#[derive(Debug)]
pub struct MessageQueue {
    messages: Mutex<VecDeque<Message>>,
    available: Semaphore,
    timeout: Duration,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_DEQUEUE_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            messages: Mutex::new(VecDeque::new()),
            available: Semaphore::new(0),
            timeout,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Message>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a message and wake at most one waiter. Never blocks.
    pub fn enqueue(&self, msg: Message) {
        self.lock().push_back(msg);
        self.available.add_permits(1);
    }

    /// Wait up to the queue's timeout for the next message
    ///
    /// Returns `None` on timeout; callers are expected to retry.
    pub async fn dequeue(&self) -> Option<Message> {
        let permit = tokio::time::timeout(self.timeout, self.available.acquire())
            .await
            .ok()?
            .ok()?;
        permit.forget();
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Default for MessageQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Instant;

    use super::*;
    use crate::message::Tag;

    #[tokio::test]
    async fn test_enqueue_then_dequeue() {
        let queue = MessageQueue::new();
        let msg = Message::delivery("lobby", "alice", "hi");
        queue.enqueue(msg.clone());

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.dequeue().await, Some(msg));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = MessageQueue::new();
        for i in 0..5 {
            queue.enqueue(Message::new(Tag::Delivery, i.to_string()));
        }
        for i in 0..5 {
            let msg = queue.dequeue().await.unwrap();
            assert_eq!(msg.data, i.to_string());
        }
    }

    #[tokio::test]
    async fn test_idle_dequeue_waits_for_timeout() {
        let timeout = Duration::from_millis(100);
        let queue = MessageQueue::with_timeout(timeout);

        let start = Instant::now();
        assert!(queue.dequeue().await.is_none());
        assert!(start.elapsed() >= timeout);
    }

    #[tokio::test]
    async fn test_dequeue_wakes_on_enqueue() {
        let queue = Arc::new(MessageQueue::with_timeout(Duration::from_secs(5)));

        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.dequeue().await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        queue.enqueue(Message::ok("wake"));

        let msg = consumer.await.unwrap();
        assert_eq!(msg, Some(Message::ok("wake")));
    }

    #[tokio::test]
    async fn test_concurrent_producers_no_loss_no_duplication() {
        const PRODUCERS: usize = 8;
        const PER_PRODUCER: usize = 50;

        let queue = Arc::new(MessageQueue::new());
        let handles: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let queue = Arc::clone(&queue);
                std::thread::spawn(move || {
                    for i in 0..PER_PRODUCER {
                        queue.enqueue(Message::new(Tag::Delivery, format!("{p}-{i}")));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut seen = HashSet::new();
        for _ in 0..PRODUCERS * PER_PRODUCER {
            let msg = queue.dequeue().await.unwrap();
            assert!(seen.insert(msg.data));
        }
        assert_eq!(seen.len(), PRODUCERS * PER_PRODUCER);
        assert!(queue.is_empty());
    }
}
