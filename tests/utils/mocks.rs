#![allow(dead_code)] // Not every test uses every helper

use async_trait::async_trait;
use tokio::sync::mpsc;

use signalroom::{FrameSink, FrameStream, InboundFrame, SocketError};

// ============================================================================
// Mock Connection Halves
// ============================================================================

/// What the server did to the client side of a mock connection
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Text(String),
    Closed,
}

/// What a mock client pushes into the server
#[derive(Debug, Clone)]
pub enum ClientFrame {
    Text(String),
    Binary,
    Reset,
}

/// Write half that records every frame the server sends
pub struct MockSink {
    events: mpsc::UnboundedSender<SinkEvent>,
}

impl MockSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SinkEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        (Self { events }, receiver)
    }
}

#[async_trait]
impl FrameSink for MockSink {
    async fn send_text(&mut self, text: &str) -> Result<(), SocketError> {
        self.events
            .send(SinkEvent::Text(text.to_string()))
            .map_err(|_| SocketError::SendFailed("client gone".to_string()))
    }

    async fn close(&mut self) -> Result<(), SocketError> {
        self.events
            .send(SinkEvent::Closed)
            .map_err(|_| SocketError::SendFailed("client gone".to_string()))
    }
}

/// Write half of a client that never reads: every send hangs
pub struct StalledSink;

#[async_trait]
impl FrameSink for StalledSink {
    async fn send_text(&mut self, _text: &str) -> Result<(), SocketError> {
        std::future::pending().await
    }

    async fn close(&mut self) -> Result<(), SocketError> {
        Ok(())
    }
}

/// Read half fed by the test
pub struct MockStream {
    frames: mpsc::UnboundedReceiver<ClientFrame>,
}

impl MockStream {
    pub fn new() -> (Self, mpsc::UnboundedSender<ClientFrame>) {
        let (sender, frames) = mpsc::unbounded_channel();
        (Self { frames }, sender)
    }
}

#[async_trait]
impl FrameStream for MockStream {
    async fn next_frame(&mut self) -> Result<Option<InboundFrame>, SocketError> {
        match self.frames.recv().await {
            Some(ClientFrame::Text(text)) => Ok(Some(InboundFrame::Text(text))),
            Some(ClientFrame::Binary) => Ok(Some(InboundFrame::Ignored)),
            Some(ClientFrame::Reset) => Err(SocketError::ReceiveFailed(
                "connection reset by peer".to_string(),
            )),
            None => Ok(None),
        }
    }
}
