//! Per-connection stream controller.
//!
//! A connection moves through `Pending → Streaming → Closed`. The controller
//! starts `Pending`, is handed the outcome of the authentication gate, and
//! either closes without touching the bus or subscribes and yields an
//! [`EventStream`]. The stream is the response body: when the client goes
//! away the HTTP server drops it, and dropping it unsubscribes.

use crate::connection::UserId;
use crate::subscription::Subscription;
use crate::Manager;
use axum::response::sse::Event;
use futures::Stream;
use log::*;
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Pending,
    Streaming,
    Closed,
}

pub struct StreamController {
    manager: Arc<Manager>,
    state: StreamState,
}

impl StreamController {
    pub fn new(manager: Arc<Manager>) -> Self {
        Self {
            manager,
            state: StreamState::Pending,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Leave `Pending` using the authentication gate's verdict.
    ///
    /// A rejected identity moves the controller to `Closed` and hands the
    /// rejection back untouched; no subscriber is ever registered for it.
    /// An accepted one moves it to `Streaming`; from then on the returned
    /// [`EventStream`] tracks the connection's own lifecycle.
    pub fn open<E>(&mut self, identity: Result<UserId, E>) -> Result<EventStream, E> {
        match identity {
            Ok(user_id) => {
                debug!("Establishing SSE connection for user {user_id}");
                let subscription = self.manager.subscribe(user_id);
                self.state = StreamState::Streaming;
                Ok(EventStream {
                    subscription,
                    state: self.state,
                })
            }
            Err(rejection) => {
                self.state = StreamState::Closed;
                debug!("Rejected unauthenticated SSE connection");
                Err(rejection)
            }
        }
    }
}

/// The streaming half of an open connection.
pub struct EventStream {
    subscription: Subscription,
    state: StreamState,
}

impl EventStream {
    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn user_id(&self) -> &UserId {
        self.subscription.user_id()
    }

    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    /// Move to `Closed`, unsubscribing on the first call only.
    pub fn close(&mut self) {
        if self.state == StreamState::Closed {
            return;
        }
        self.state = StreamState::Closed;
        if self.subscription.unsubscribe() {
            debug!(
                "SSE connection closed for user {}, cleaned up",
                self.subscription.user_id()
            );
        }
    }
}

impl Stream for EventStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.state == StreamState::Closed {
            return Poll::Ready(None);
        }

        match this.subscription.poll_recv(cx) {
            Poll::Ready(Some(frame)) => Poll::Ready(Some(Ok(frame.into()))),
            Poll::Ready(None) => {
                this.close();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.close();
    }
}
