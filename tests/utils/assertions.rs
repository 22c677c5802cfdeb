//! Test assertion helpers for what a client observes
#![allow(dead_code)] // Test utilities may not all be used in every test

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};

use super::mocks::SinkEvent;
use super::setup::TestClient;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

// ============================================================================
// Assertion Helpers
// ============================================================================

#[async_trait]
pub trait FrameAssertion {
    /// Next text frame, failing the test if none arrives in time
    async fn recv_text(&mut self) -> String;

    /// Next text frame parsed as JSON
    async fn recv_json(&mut self) -> Value;

    /// Assert that nothing arrives within `window`
    async fn expect_silence(&mut self, window: Duration);

    /// Assert the server closed the connection without sending any text
    async fn expect_closed(&mut self);

    /// Wait for the server side of the session to finish
    async fn expect_session_ended(&mut self);
}

#[async_trait]
impl FrameAssertion for TestClient {
    async fn recv_text(&mut self) -> String {
        match timeout(RECV_TIMEOUT, self.events().recv()).await {
            Ok(Some(SinkEvent::Text(text))) => text,
            Ok(Some(SinkEvent::Closed)) => panic!("connection closed while waiting for a frame"),
            Ok(None) => panic!("connection dropped while waiting for a frame"),
            Err(_) => panic!("no frame within {:?}", RECV_TIMEOUT),
        }
    }

    async fn recv_json(&mut self) -> Value {
        let text = self.recv_text().await;
        serde_json::from_str(&text).unwrap_or_else(|e| panic!("frame {:?} is not JSON: {}", text, e))
    }

    async fn expect_silence(&mut self, window: Duration) {
        if let Ok(Some(event)) = timeout(window, self.events().recv()).await {
            panic!("expected silence, got {:?}", event);
        }
    }

    async fn expect_closed(&mut self) {
        match timeout(RECV_TIMEOUT, self.events().recv()).await {
            Ok(Some(SinkEvent::Closed)) | Ok(None) => {}
            Ok(Some(SinkEvent::Text(text))) => panic!("expected close, got frame {}", text),
            Err(_) => panic!("connection not closed within {:?}", RECV_TIMEOUT),
        }
    }

    async fn expect_session_ended(&mut self) {
        timeout(RECV_TIMEOUT, self.session())
            .await
            .expect("session did not end in time")
            .expect("session task panicked");
    }
}

/// Polls `condition` until it holds or the deadline passes
pub async fn eventually<F>(description: &str, mut condition: F)
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + RECV_TIMEOUT;
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", description);
        sleep(Duration::from_millis(10)).await;
    }
}
