use crate::message::Frame;
use dashmap::DashMap;
use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedSender;

// Type alias for user IDs (web layer converts domain::Id to String)
pub type UserId = String;

/// Unique identifier for a connection (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-connection queue that the registry pushes frames onto.
pub type FrameSender = UnboundedSender<Frame>;

/// Topic-keyed registry of live subscriber queues.
///
/// Every operation touches a single topic entry, so the critical section is
/// one shard lock held while reading or mutating that topic's subscriber set.
/// Topics are removed as soon as their last subscriber leaves.
pub struct ConnectionRegistry {
    topics: DashMap<UserId, HashMap<ConnectionId, FrameSender>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            topics: DashMap::new(),
        }
    }

    /// Register a new subscriber queue under `user_id` - O(1)
    pub fn register(&self, user_id: UserId, sender: FrameSender) -> ConnectionId {
        let connection_id = ConnectionId::new();

        self.topics
            .entry(user_id)
            .or_default()
            .insert(connection_id.clone(), sender);

        connection_id
    }

    /// Unregister a subscriber - O(1). Returns `false` when it was already gone,
    /// which makes repeated or racing unregistrations harmless.
    pub fn unregister(&self, user_id: &UserId, connection_id: &ConnectionId) -> bool {
        let removed = match self.topics.get_mut(user_id) {
            Some(mut subscribers) => subscribers.remove(connection_id).is_some(),
            None => false,
        };

        // Re-checked under the shard lock so a concurrent register is never lost
        self.topics
            .remove_if(user_id, |_, subscribers| subscribers.is_empty());

        removed
    }

    /// Push a frame onto every queue registered under `user_id`.
    ///
    /// The subscriber set is snapshotted in one read and the lock released
    /// before any send. Queues whose receiver is gone are pruned afterwards;
    /// their failure never reaches the caller. Returns the number of queues
    /// that accepted the frame.
    pub fn send_to_user(&self, user_id: &UserId, frame: &Frame) -> usize {
        let snapshot: Vec<(ConnectionId, FrameSender)> = match self.topics.get(user_id) {
            Some(subscribers) => subscribers
                .iter()
                .map(|(id, sender)| (id.clone(), sender.clone()))
                .collect(),
            None => return 0,
        };

        let mut delivered = 0;
        let mut closed = Vec::new();
        for (connection_id, sender) in snapshot {
            match sender.send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(_) => closed.push(connection_id),
            }
        }

        for connection_id in closed {
            self.unregister(user_id, &connection_id);
        }

        delivered
    }

    /// Number of live subscribers for `user_id`.
    pub fn subscriber_count(&self, user_id: &UserId) -> usize {
        self.topics
            .get(user_id)
            .map(|subscribers| subscribers.len())
            .unwrap_or(0)
    }

    /// Whether `connection_id` is currently registered under `user_id`.
    pub fn contains(&self, user_id: &UserId, connection_id: &ConnectionId) -> bool {
        self.topics
            .get(user_id)
            .map(|subscribers| subscribers.contains_key(connection_id))
            .unwrap_or(false)
    }

    /// Number of topics with at least one subscriber.
    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn frame() -> Frame {
        Frame::new("server-change", "marker")
    }

    #[test]
    fn unregister_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let user = "user-a".to_string();
        let id = registry.register(user.clone(), tx);

        assert!(registry.unregister(&user, &id));
        assert!(!registry.unregister(&user, &id));
        assert!(!registry.unregister(&user, &id));
        assert_eq!(registry.subscriber_count(&user), 0);
        assert_eq!(registry.topic_count(), 0);
    }

    #[test]
    fn last_unregister_prunes_the_topic() {
        let registry = ConnectionRegistry::new();
        let user = "user-a".to_string();
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();
        let first = registry.register(user.clone(), tx1);
        let second = registry.register(user.clone(), tx2);

        registry.unregister(&user, &first);
        assert_eq!(registry.topic_count(), 1);
        assert!(registry.contains(&user, &second));

        registry.unregister(&user, &second);
        assert_eq!(registry.topic_count(), 0);
    }

    #[test]
    fn send_to_unknown_topic_is_a_noop() {
        let registry = ConnectionRegistry::new();
        assert_eq!(registry.send_to_user(&"nobody".to_string(), &frame()), 0);
        assert_eq!(registry.topic_count(), 0);
    }

    #[test]
    fn closed_queue_is_pruned_without_blocking_others() {
        let registry = ConnectionRegistry::new();
        let user = "user-a".to_string();
        let (dead_tx, dead_rx) = mpsc::unbounded_channel();
        let (live_tx, mut live_rx) = mpsc::unbounded_channel();
        let dead = registry.register(user.clone(), dead_tx);
        let live = registry.register(user.clone(), live_tx);
        drop(dead_rx);

        assert_eq!(registry.send_to_user(&user, &frame()), 1);
        assert_eq!(live_rx.try_recv().ok(), Some(frame()));
        assert!(!registry.contains(&user, &dead));
        assert!(registry.contains(&user, &live));
    }
}
