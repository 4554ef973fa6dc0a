use crate::connection::{ConnectionRegistry, UserId};
use crate::message::{EventType, Frame, Message as SseMessage};
use crate::subscription::{Subscription, SubscriptionHandle};
use log::*;
use std::sync::Arc;
use tokio::sync::mpsc;

/// The process-wide event bus.
///
/// Constructed once at startup and shared through application state; every
/// component that publishes or subscribes holds an `Arc<Manager>`.
pub struct Manager {
    registry: Arc<ConnectionRegistry>,
}

impl Manager {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
        }
    }

    /// Register a new subscriber queue for `user_id`.
    ///
    /// Each call creates a distinct subscriber; calling it twice for the same
    /// connection registers it twice.
    pub fn subscribe(&self, user_id: UserId) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection_id = self.registry.register(user_id.clone(), tx);
        info!(
            "Registered new SSE connection {} for user {user_id}",
            connection_id.as_str()
        );

        let handle = SubscriptionHandle::new(self.registry.clone(), user_id, connection_id);
        Subscription::new(handle, rx)
    }

    /// Remove a subscriber. No-op when it is already gone.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) -> bool {
        handle.unsubscribe()
    }

    /// Push `(event, data)` to every subscriber registered under `user_id` when
    /// the call begins. Never fails; returns how many subscribers accepted it.
    pub fn publish(&self, user_id: &UserId, event: &str, data: &str) -> usize {
        let frame = Frame::new(event, data);
        let delivered = self.registry.send_to_user(user_id, &frame);
        trace!("Published {event} to {delivered} connection(s) of user {user_id}");
        delivered
    }

    /// Send a typed message to all connections of its user.
    pub fn send_message(&self, message: SseMessage) -> usize {
        self.publish(
            &message.user_id,
            message.event.event_type(),
            message.event.data(),
        )
    }

    pub fn subscriber_count(&self, user_id: &UserId) -> usize {
        self.registry.subscriber_count(user_id)
    }

    pub fn topic_count(&self) -> usize {
        self.registry.topic_count()
    }

    pub fn is_subscribed(&self, handle: &SubscriptionHandle) -> bool {
        self.registry
            .contains(handle.user_id(), handle.connection_id())
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}
