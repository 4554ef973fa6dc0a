use crate::message::{Event as SseEvent, Message as SseMessage};
use crate::Manager;
use async_trait::async_trait;
use events::{DomainEvent, EventHandler};
use log::*;
use std::sync::Arc;

/// Turns committed record mutations into `server-change` notifications for
/// the owning user's open connections.
pub struct SseDomainEventHandler {
    sse_manager: Arc<Manager>,
}

impl SseDomainEventHandler {
    pub fn new(sse_manager: Arc<Manager>) -> Self {
        Self { sse_manager }
    }
}

#[async_trait]
impl EventHandler for SseDomainEventHandler {
    async fn handle(&self, event: &DomainEvent) {
        match event {
            DomainEvent::RecordMutated {
                user_id,
                record_id,
                mutation,
            } => {
                let user_id = user_id.to_string();
                let delivered = self.sse_manager.send_message(SseMessage {
                    event: SseEvent::server_change_for(&user_id),
                    user_id,
                });

                debug!(
                    "Record {record_id} {mutation}: notified {delivered} SSE connection(s)"
                );
            }
        }
    }
}
