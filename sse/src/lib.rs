//! Server-Sent Events (SSE) infrastructure for live updates.
//!
//! This crate provides the process-local event bus that tells a user's open
//! browser connections that their data changed, so the client can refetch
//! instead of polling.
//!
//! # Architecture
//!
//! - **Topic per user**: subscribers are grouped by user id. Every tab or
//!   device of a user subscribes to the same topic and every mutation by that
//!   user publishes to it.
//! - **Queue per connection**: `subscribe` registers an unbounded queue and
//!   hands back its receive end; `publish` snapshots a topic's queues and
//!   pushes a frame onto each. No callbacks run under the registry lock.
//! - **Drop-guarded cleanup**: the subscription handle unsubscribes when
//!   dropped, so a client disconnect, an error, or a normal end all run the
//!   same teardown exactly once.
//! - **Ephemeral messages**: nothing is persisted or replayed. A user who is
//!   offline misses the event and sees fresh data on the next page load.
//!
//! # Message Flow
//!
//! 1. Frontend opens `/sse`
//! 2. Backend resolves the user from the session cookie; unauthenticated
//!    requests are rejected before touching the bus
//! 3. `StreamController` subscribes the user and streams frames
//! 4. A record mutation commits and publishes a `DomainEvent`
//! 5. `SseDomainEventHandler` publishes `server-change` to the owner's topic
//! 6. Frontend receives the event and revalidates its data
//!
//! # Modules
//!
//! - `connection`: topic-keyed `ConnectionRegistry` and `ConnectionId`
//! - `subscription`: `Subscription` and its drop-guard `SubscriptionHandle`
//! - `manager`: the bus service object (`Manager`)
//! - `message`: event names, typed events and wire frames
//! - `stream`: per-connection `StreamController` state machine
//! - `domain_event_handler`: bridge from `events::DomainEvent` to the bus

pub mod connection;
pub mod domain_event_handler;
pub mod manager;
pub mod message;
pub mod stream;
pub mod subscription;

pub use domain_event_handler::SseDomainEventHandler;
pub use manager::Manager;
pub use stream::{EventStream, StreamController, StreamState};
pub use subscription::{Subscription, SubscriptionHandle};
