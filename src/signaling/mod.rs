// Public API
pub use handler::signaling_handler;
pub use messages::{ClientMessage, OutboundFrame, PeerInfo, ServerMessage};
pub use registry::RoomRegistry;
pub use room::{Departure, JoinError, JoinedRoom, Room};
pub use router::SignalingRouter;
pub use session::{Delivery, Outbound, SessionId};
pub use socket::{FrameSink, FrameStream, InboundFrame, SocketError};

// Internal modules
mod handler;
pub mod messages;
mod registry;
mod room;
mod router;
mod session;
mod socket;
