use crate::connection::UserId;
use axum::response::sse::Event as SseEvent;

/// Event name sent whenever a user's data changed and views should refetch.
pub const SERVER_CHANGE: &str = "server-change";

/// Trait for getting the SSE event type name
pub trait EventType {
    fn event_type(&self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Something changed for the user; the payload is an opaque marker.
    ServerChange { marker: String },
}

impl Event {
    /// Marker announcing a change for `user_id`.
    pub fn server_change_for(user_id: &str) -> Self {
        Event::ServerChange {
            marker: format!("Data change for {user_id}"),
        }
    }

    /// The `data:` line payload.
    pub fn data(&self) -> &str {
        match self {
            Event::ServerChange { marker } => marker,
        }
    }
}

impl EventType for Event {
    fn event_type(&self) -> &'static str {
        match self {
            Event::ServerChange { .. } => SERVER_CHANGE,
        }
    }
}

/// A message addressed to every open connection of one user.
#[derive(Debug, Clone)]
pub struct Message {
    pub user_id: UserId,
    pub event: Event,
}

/// One wire-level event: `event: <event>\ndata: <data>\n\n`.
///
/// Frames are what subscriber queues carry; they are turned into axum SSE
/// events only when written to a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub event: String,
    pub data: String,
}

impl Frame {
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
        }
    }
}

impl From<&Event> for Frame {
    fn from(event: &Event) -> Self {
        Frame::new(event.event_type(), event.data())
    }
}

impl From<Frame> for SseEvent {
    fn from(frame: Frame) -> Self {
        // The event line must precede the data line on the wire
        SseEvent::default().event(frame.event).data(frame.data)
    }
}
