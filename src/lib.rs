// Library crate for the signaling server
// This file exposes the public API for integration tests

pub mod config;
pub mod meeting;
pub mod routes;
pub mod shared;
pub mod signaling;

// Re-export commonly used types for easier access in tests
pub use config::{Config, SignalingConfig, SlowConsumerPolicy};
pub use meeting::repository::{InMemoryMeetingRepository, MeetingRepository};
pub use routes::app;
pub use shared::{AppError, AppState};
pub use signaling::{FrameSink, FrameStream, InboundFrame, RoomRegistry, SignalingRouter, SocketError};
