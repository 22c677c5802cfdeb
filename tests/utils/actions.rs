#![allow(dead_code)] // Not every test uses every helper

use serde_json::{json, Value};

use super::assertions::FrameAssertion;
use super::mocks::ClientFrame;
use super::setup::{TestClient, TestSetup};

// ============================================================================
// Action Helpers
// ============================================================================

impl TestClient {
    pub fn send_text(&self, text: &str) {
        self.push(ClientFrame::Text(text.to_string()));
    }

    pub fn send_json(&self, value: Value) {
        self.send_text(&value.to_string());
    }

    pub fn send_join(&self, room_id: &str, name: &str) {
        self.send_json(json!({"type": "join", "roomId": room_id, "name": name}));
    }

    pub fn send_binary(&self) {
        self.push(ClientFrame::Binary);
    }

    /// Make the next read fail as if the transport broke
    pub fn reset(&self) {
        self.push(ClientFrame::Reset);
    }

    /// Close the client side; the server sees end of stream
    pub fn disconnect(&mut self) {
        self.hang_up();
    }
}

impl TestSetup {
    /// Connect, join and consume the `id` and `peers` frames. Returns the
    /// client and its assigned peer id.
    pub async fn join(&self, room_id: &str, name: &str) -> (TestClient, String) {
        let mut client = self.connect();
        client.send_join(room_id, name);

        let id = client.recv_json().await;
        assert_eq!(id["type"], "id", "first frame should be id, got {}", id);
        let peer_id = id["id"].as_str().unwrap().to_string();

        let peers = client.recv_json().await;
        assert_eq!(peers["type"], "peers", "second frame should be peers, got {}", peers);

        (client, peer_id)
    }
}
