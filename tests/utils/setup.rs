#![allow(dead_code)] // Not every test uses every helper

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use signalroom::{
    FrameSink, RoomRegistry, SignalingConfig, SignalingRouter, SlowConsumerPolicy,
};

use super::mocks::{ClientFrame, MockSink, MockStream, SinkEvent, StalledSink};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub router: Arc<SignalingRouter>,
    pub registry: Arc<RoomRegistry>,
}

pub struct TestSetupBuilder {
    config: SignalingConfig,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            config: SignalingConfig {
                handshake_timeout: Duration::from_secs(2),
                ..SignalingConfig::default()
            },
        }
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    pub fn with_max_room_members(mut self, max_members: usize) -> Self {
        self.config.max_room_members = max_members;
        self
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.config.handshake_timeout = timeout;
        self
    }

    pub fn with_slow_consumer_policy(mut self, policy: SlowConsumerPolicy) -> Self {
        self.config.slow_consumer_policy = policy;
        self
    }

    pub fn build(self) -> TestSetup {
        let registry = Arc::new(RoomRegistry::new(self.config));
        let router = Arc::new(SignalingRouter::new(Arc::clone(&registry), self.config));
        TestSetup { router, registry }
    }
}

/// One simulated client connection served by the router
pub struct TestClient {
    frames: Option<mpsc::UnboundedSender<ClientFrame>>,
    events: mpsc::UnboundedReceiver<SinkEvent>,
    session: JoinHandle<()>,
}

impl TestSetup {
    /// Open a connection whose client reads everything it is sent
    pub fn connect(&self) -> TestClient {
        let (sink, events) = MockSink::new();
        self.spawn_session(Box::new(sink), events)
    }

    /// Open a connection whose client never reads
    pub fn connect_stalled(&self) -> TestClient {
        let (_unused, events) = mpsc::unbounded_channel();
        self.spawn_session(Box::new(StalledSink), events)
    }

    fn spawn_session(
        &self,
        sink: Box<dyn FrameSink>,
        events: mpsc::UnboundedReceiver<SinkEvent>,
    ) -> TestClient {
        let (stream, frames) = MockStream::new();
        let router = Arc::clone(&self.router);
        let session = tokio::spawn(async move {
            router.serve(sink, Box::new(stream)).await;
        });

        TestClient {
            frames: Some(frames),
            events,
            session,
        }
    }

    pub fn member_count(&self, room_id: &str) -> usize {
        self.registry
            .get(room_id)
            .map(|room| room.member_count())
            .unwrap_or(0)
    }
}

impl TestClient {
    pub(crate) fn push(&self, frame: ClientFrame) {
        if let Some(frames) = &self.frames {
            // the server may already have dropped the session
            let _ = frames.send(frame);
        }
    }

    pub(crate) fn events(&mut self) -> &mut mpsc::UnboundedReceiver<SinkEvent> {
        &mut self.events
    }

    pub(crate) fn session(&mut self) -> &mut JoinHandle<()> {
        &mut self.session
    }

    /// True while the server is still serving this connection
    pub fn is_session_running(&self) -> bool {
        !self.session.is_finished()
    }

    pub(crate) fn hang_up(&mut self) {
        self.frames = None;
    }
}
