//! In-memory FIFO of mail awaiting redrive.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

/// A queue entry wrapping a caller-owned stored mail record.
#[derive(Debug, Clone)]
pub struct QueuedMail<M> {
    /// The caller-owned record.
    pub mail: M,
    /// When the entry was first queued.
    pub queued_at: DateTime<Utc>,
    /// Dispatch attempts so far, including the one that queued it.
    pub attempts: u32,
}

impl<M> QueuedMail<M> {
    /// Wraps a record that just failed its first dispatch.
    #[must_use]
    pub fn new(mail: M) -> Self {
        Self {
            mail,
            queued_at: Utc::now(),
            attempts: 1,
        }
    }

    /// Re-wraps the record after another failed attempt, keeping the
    /// original queue timestamp.
    #[must_use]
    pub fn retried(self) -> Self {
        Self {
            attempts: self.attempts + 1,
            ..self
        }
    }
}

/// FIFO of mail not yet confirmed sent.
///
/// Access is serialized through an async mutex: failed dispatches
/// append at the tail, redrive passes pop from the head. The lock is
/// taken per operation, never across a dispatch, so a pass can requeue
/// its own failures behind the entries it has yet to process.
#[derive(Debug)]
pub struct DeliveryQueue<M> {
    entries: Mutex<VecDeque<QueuedMail<M>>>,
}

impl<M> DeliveryQueue<M> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
        }
    }

    /// Appends an entry at the tail.
    pub async fn push_back(&self, entry: QueuedMail<M>) {
        self.entries.lock().await.push_back(entry);
    }

    /// Removes and returns the head entry.
    pub async fn pop_front(&self) -> Option<QueuedMail<M>> {
        self.entries.lock().await.pop_front()
    }

    /// Number of entries currently queued.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Returns true when nothing is queued.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

impl<M> Default for DeliveryQueue<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = DeliveryQueue::new();
        queue.push_back(QueuedMail::new("first")).await;
        queue.push_back(QueuedMail::new("second")).await;

        assert_eq!(queue.len().await, 2);
        assert_eq!(queue.pop_front().await.unwrap().mail, "first");
        assert_eq!(queue.pop_front().await.unwrap().mail, "second");
        assert!(queue.pop_front().await.is_none());
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn test_retried_increments_attempts_and_keeps_timestamp() {
        let entry = QueuedMail::new("mail");
        let queued_at = entry.queued_at;

        let retried = entry.retried();
        assert_eq!(retried.attempts, 2);
        assert_eq!(retried.queued_at, queued_at);
    }
}
