//! Event system infrastructure for BeeRich.
//!
//! This crate provides the event system that decouples record mutations
//! from infrastructure concerns like live-update notifications.
//!
//! # Architecture
//!
//! - **DomainEvent**: Enum representing all business events in the system
//! - **EventHandler**: Trait for implementing event handlers
//! - **EventPublisher**: Publishes events to registered handlers
//!
//! This crate has no dependencies on internal crates (domain, sse, etc.),
//! avoiding circular dependencies.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// A type alias that represents any record's or user's id field data type.
pub type Id = Uuid;

/// The kind of change a committed record mutation made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mutation {
    Created,
    Updated,
    Deleted,
    AttachmentRemoved,
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Mutation::Created => write!(f, "created"),
            Mutation::Updated => write!(f, "updated"),
            Mutation::Deleted => write!(f, "deleted"),
            Mutation::AttachmentRemoved => write!(f, "attachment_removed"),
        }
    }
}

/// Domain events that represent business-level changes in the system.
/// These events are emitted only after the storage commit they describe
/// has succeeded.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    /// Emitted when a record owned by `user_id` was created, updated, deleted
    /// or lost its attachment. Carries no diff: listeners refetch.
    RecordMutated {
        /// Owner of the record and the only user to be notified.
        user_id: Id,
        record_id: Id,
        mutation: Mutation,
    },
}

impl DomainEvent {
    /// The user whose open connections should hear about this event.
    pub fn user_id(&self) -> Id {
        match self {
            DomainEvent::RecordMutated { user_id, .. } => *user_id,
        }
    }
}

/// Trait for handling domain events.
/// Implementations perform side effects like sending notifications.
/// Handlers must not fail the mutation that produced the event, so `handle`
/// has no error channel.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DomainEvent);
}

/// Publishes domain events to registered handlers.
/// Handlers are called sequentially in registration order.
#[derive(Clone)]
pub struct EventPublisher {
    handlers: Arc<Vec<Arc<dyn EventHandler>>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Vec::new()),
        }
    }

    /// Register a new event handler.
    /// Note: This creates a new publisher instance with the additional handler.
    /// Store the returned publisher in your application state.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        let mut handlers = (*self.handlers).clone();
        handlers.push(handler);
        self.handlers = Arc::new(handlers);
        self
    }

    /// Publish an event to all registered handlers.
    /// Every handler has run by the time this returns.
    pub async fn publish(&self, event: DomainEvent) {
        for handler in self.handlers.iter() {
            handler.handle(&event).await;
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
