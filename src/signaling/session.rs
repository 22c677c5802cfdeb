use std::sync::Arc;
use tokio::sync::{
    mpsc::{self, error::TrySendError},
    Notify,
};
use tracing::{debug, warn};

use super::messages::OutboundFrame;
use super::socket::FrameSink;
use crate::config::{SlowConsumerPolicy, MIN_QUEUE_CAPACITY};

/// Process-unique identity of a connection session. Room membership is keyed
/// by this, never by peer id.
pub type SessionId = u64;

/// Result of handing a frame to a session's outbound queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Queued,
    /// Queue full; the frame was discarded
    Dropped,
    /// Queue full; the frame was discarded and the session told to terminate
    Evicted,
    /// The session's writer is already gone
    Closed,
}

/// Sending side of a session: its bounded outbound queue plus the signal used
/// to evict it when it stops draining that queue.
#[derive(Debug, Clone)]
pub struct Outbound {
    sender: mpsc::Sender<OutboundFrame>,
    evict: Arc<Notify>,
}

impl Outbound {
    /// Creates the queue for a new session. Capacity is raised to
    /// `MIN_QUEUE_CAPACITY` so `id` and `peers` always fit.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<OutboundFrame>, Arc<Notify>) {
        let (sender, receiver) = mpsc::channel(capacity.max(MIN_QUEUE_CAPACITY));
        let evict = Arc::new(Notify::new());
        (
            Self {
                sender,
                evict: Arc::clone(&evict),
            },
            receiver,
            evict,
        )
    }

    /// Enqueues without waiting; a full queue is handled per `policy`
    pub fn deliver(&self, frame: &OutboundFrame, policy: SlowConsumerPolicy) -> Delivery {
        match self.sender.try_send(Arc::clone(frame)) {
            Ok(()) => Delivery::Queued,
            Err(TrySendError::Full(_)) => match policy {
                SlowConsumerPolicy::Drop => Delivery::Dropped,
                SlowConsumerPolicy::Disconnect => {
                    self.evict.notify_one();
                    Delivery::Evicted
                }
            },
            Err(TrySendError::Closed(_)) => Delivery::Closed,
        }
    }
}

/// A session admitted to a room
#[derive(Debug, Clone)]
pub struct ActiveSession {
    pub id: SessionId,
    pub peer_id: String,
    pub name: String,
    pub room_id: String,
}

/// Drains the outbound queue into the connection until the queue closes or a
/// write fails, then closes the connection.
pub async fn write_loop(
    session_id: SessionId,
    mut sink: Box<dyn FrameSink>,
    mut outbound: mpsc::Receiver<OutboundFrame>,
) {
    while let Some(frame) = outbound.recv().await {
        if let Err(e) = sink.send_text(&frame).await {
            warn!(session_id, error = %e, "Write to connection failed");
            break;
        }
    }

    if let Err(e) = sink.close().await {
        debug!(session_id, error = %e, "Close frame not delivered");
    }
    debug!(session_id, "Writer stopped");
}
