//! Event feeds
//!
//! The chain observer delivers finalized, normalized events per chain role.
//! A [`RoleEngine`](crate::RoleEngine) pulls from an [`EventFeed`]; the
//! in-process implementation is a bounded `mpsc` channel, fed through an
//! [`EventRouter`] that sends each event to its source role's channel.

use std::future::Future;
use tokio::sync::mpsc;
use tracing::warn;
use witness_core::{ChainEvent, ChainRole};

/// Source of finalized events for one chain role.
pub trait EventFeed: Send {
    /// Wait for the next event. `None` means the feed is closed.
    ///
    /// Must be cancel safe: the engine drops the future when shutdown is
    /// signalled.
    fn next_event(&mut self) -> impl Future<Output = Option<ChainEvent>> + Send;
}

impl EventFeed for mpsc::Receiver<ChainEvent> {
    fn next_event(&mut self) -> impl Future<Output = Option<ChainEvent>> + Send {
        self.recv()
    }
}

/// Error returned when an event cannot be routed.
#[derive(Debug, thiserror::Error)]
#[error("Feed for {role} is closed")]
pub struct FeedClosed {
    pub role: ChainRole,
    pub event: Box<ChainEvent>,
}

/// Routes events to the channel of their source role.
#[derive(Debug, Clone)]
pub struct EventRouter {
    locking: mpsc::Sender<ChainEvent>,
    issuing: mpsc::Sender<ChainEvent>,
}

impl EventRouter {
    /// Create a router and the two receiving feeds.
    pub fn channel(
        capacity: usize,
    ) -> (Self, mpsc::Receiver<ChainEvent>, mpsc::Receiver<ChainEvent>) {
        let (locking, locking_rx) = mpsc::channel(capacity);
        let (issuing, issuing_rx) = mpsc::channel(capacity);
        (Self { locking, issuing }, locking_rx, issuing_rx)
    }

    fn sender(&self, role: ChainRole) -> &mpsc::Sender<ChainEvent> {
        match role {
            ChainRole::Locking => &self.locking,
            ChainRole::Issuing => &self.issuing,
        }
    }

    /// Send `event` to the feed of its source role, waiting for capacity.
    pub async fn route(&self, event: ChainEvent) -> Result<(), FeedClosed> {
        let role = event.source();
        self.sender(role).send(event).await.map_err(|e| {
            warn!(chain = %role, "Dropping event for closed feed");
            FeedClosed {
                role,
                event: Box::new(e.0),
            }
        })
    }
}
