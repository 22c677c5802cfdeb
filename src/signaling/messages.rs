use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

/// A frame queued for delivery to one session. Shared so fan-out does not
/// copy the payload per member.
pub type OutboundFrame = Arc<str>;

/// Messages a client may send before it is admitted to a room
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    Join {
        #[serde(rename = "roomId")]
        room_id: String,
        name: String,
    },
}

/// Control messages generated by the server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Assigned peer identifier, sent once right after join
    Id { id: String },
    /// Members already in the room at join time
    Peers { peers: Vec<PeerInfo> },
    NewPeer {
        #[serde(rename = "peerId")]
        peer_id: String,
        name: String,
    },
    PeerLeft {
        #[serde(rename = "peerId")]
        peer_id: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeerInfo {
    #[serde(rename = "peerId")]
    pub peer_id: String,
    pub name: String,
}

impl ServerMessage {
    pub fn to_frame(&self) -> Result<OutboundFrame, serde_json::Error> {
        serde_json::to_string(self).map(OutboundFrame::from)
    }
}

/// A validated join request
#[derive(Debug, Clone, PartialEq)]
pub struct JoinRequest {
    pub room_id: String,
    pub name: String,
}

#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("join message is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("join message has no type")]
    MissingType,

    #[error("expected a join message, got type {0:?}")]
    UnexpectedType(String),

    #[error("join message has a blank room id")]
    BlankRoomId,

    #[error("first frame was not a text frame")]
    NonText,

    #[error("connection closed before join")]
    Closed,

    #[error("no join message within {0:?}")]
    Timeout(std::time::Duration),

    #[error("transport error during handshake: {0}")]
    Transport(String),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type", default)]
    message_type: Option<String>,
}

/// Decodes the first frame of a connection into a join request
pub fn parse_join(text: &str) -> Result<JoinRequest, HandshakeError> {
    let envelope: Envelope = serde_json::from_str(text)?;
    match envelope.message_type.as_deref().map(str::trim) {
        None | Some("") => return Err(HandshakeError::MissingType),
        Some("join") => {}
        Some(other) => return Err(HandshakeError::UnexpectedType(other.to_string())),
    }

    let message: ClientMessage = serde_json::from_str(text)?;
    let ClientMessage::Join { room_id, name } = message;
    if room_id.trim().is_empty() {
        return Err(HandshakeError::BlankRoomId);
    }

    Ok(JoinRequest { room_id, name })
}

/// Where a post-join frame should go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Deliver to the member holding this peer id only
    To(String),
    /// Deliver to every other member of the room
    Broadcast,
}

/// Extracts the routing target of an opaque relay frame.
///
/// The frame must be a JSON object; only a string-valued `to` field is
/// considered, anything else broadcasts.
pub fn route_of(text: &str) -> Result<Route, serde_json::Error> {
    let fields: Map<String, Value> = serde_json::from_str(text)?;
    Ok(match fields.get("to").and_then(Value::as_str) {
        Some(peer_id) => Route::To(peer_id.to_string()),
        None => Route::Broadcast,
    })
}
