//! Subscriptions handed out by the [`Manager`](crate::Manager).
//!
//! A [`Subscription`] pairs the receive end of a connection's frame queue
//! with a [`SubscriptionHandle`]. The handle is a drop guard: whichever way
//! the owning connection ends (normal return, error, or the response body
//! being dropped on client disconnect) the registry entry is removed exactly
//! once.

use crate::connection::{ConnectionId, ConnectionRegistry, UserId};
use crate::message::Frame;
use log::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc::UnboundedReceiver;

/// Capability to remove one subscriber from the registry. Nothing else.
pub struct SubscriptionHandle {
    registry: Arc<ConnectionRegistry>,
    user_id: UserId,
    connection_id: ConnectionId,
    released: AtomicBool,
}

impl SubscriptionHandle {
    pub(crate) fn new(
        registry: Arc<ConnectionRegistry>,
        user_id: UserId,
        connection_id: ConnectionId,
    ) -> Self {
        Self {
            registry,
            user_id,
            connection_id,
            released: AtomicBool::new(false),
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn connection_id(&self) -> &ConnectionId {
        &self.connection_id
    }

    /// Remove the subscriber from the registry.
    ///
    /// Only the first call does any work; later or concurrent calls are
    /// no-ops. Returns `true` for the call that released the subscriber.
    pub fn unsubscribe(&self) -> bool {
        if self.released.swap(true, Ordering::AcqRel) {
            return false;
        }

        info!(
            "Unregistering SSE connection {} for user {}",
            self.connection_id.as_str(),
            self.user_id
        );
        self.registry.unregister(&self.user_id, &self.connection_id);
        true
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// A live subscription: the connection's frame queue plus its handle.
pub struct Subscription {
    handle: SubscriptionHandle,
    receiver: UnboundedReceiver<Frame>,
}

impl Subscription {
    pub(crate) fn new(handle: SubscriptionHandle, receiver: UnboundedReceiver<Frame>) -> Self {
        Self { handle, receiver }
    }

    pub fn handle(&self) -> &SubscriptionHandle {
        &self.handle
    }

    pub fn user_id(&self) -> &UserId {
        self.handle.user_id()
    }

    /// Wait for the next frame published to this subscriber's topic.
    /// Returns `None` once the subscription has been released.
    pub async fn recv(&mut self) -> Option<Frame> {
        if self.handle.is_released() {
            return None;
        }
        self.receiver.recv().await
    }

    /// Take a frame if one is already queued.
    pub fn try_recv(&mut self) -> Option<Frame> {
        if self.handle.is_released() {
            return None;
        }
        self.receiver.try_recv().ok()
    }

    pub fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<Frame>> {
        if self.handle.is_released() {
            return Poll::Ready(None);
        }
        self.receiver.poll_recv(cx)
    }

    /// Release the subscription and stop accepting frames.
    pub fn unsubscribe(&mut self) -> bool {
        let released = self.handle.unsubscribe();
        self.receiver.close();
        released
    }

    #[cfg(test)]
    pub(crate) fn into_parts(self) -> (SubscriptionHandle, UnboundedReceiver<Frame>) {
        (self.handle, self.receiver)
    }
}
