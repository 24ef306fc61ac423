use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::SyncEvent;
use crate::domain::error::DomainResult;

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish_event(&self, event: SyncEvent) -> DomainResult<()>;
}

pub type DynEventPublisher = Arc<dyn EventPublisher>;

#[derive(Default)]
pub struct NoopEventPublisher;

#[async_trait]
impl EventPublisher for NoopEventPublisher {
    async fn publish_event(&self, _event: SyncEvent) -> DomainResult<()> {
        Ok(())
    }
}

/// Fans events out to every live subscriber. Slow subscribers lag and skip
/// events instead of blocking the publisher.
#[derive(Debug, Clone)]
pub struct BroadcastEventPublisher {
    sender: broadcast::Sender<SyncEvent>,
}

impl BroadcastEventPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.sender.subscribe()
    }
}

/// Waits for the next event, skipping over anything a lagging receiver
/// missed. Returns `None` once every publisher is gone.
pub async fn next_event(receiver: &mut broadcast::Receiver<SyncEvent>) -> Option<SyncEvent> {
    loop {
        match receiver.recv().await {
            Ok(event) => return Some(event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Sync event subscriber lagged, skipped {} events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}

impl Default for BroadcastEventPublisher {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl EventPublisher for BroadcastEventPublisher {
    async fn publish_event(&self, event: SyncEvent) -> DomainResult<()> {
        if self.sender.send(event).is_err() {
            debug!("No subscribers for sync event");
        }
        Ok(())
    }
}
