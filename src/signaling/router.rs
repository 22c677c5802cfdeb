use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::{sync::Notify, task::JoinHandle, time::timeout};
use tracing::{debug, info, instrument, warn, Span};

use super::messages::{parse_join, route_of, HandshakeError, JoinRequest, OutboundFrame, Route};
use super::registry::RoomRegistry;
use super::room::{JoinError, JoinedRoom, Room};
use super::session::{write_loop, ActiveSession, Outbound, SessionId};
use super::socket::{FrameSink, FrameStream, InboundFrame};
use crate::config::SignalingConfig;

/// How long a departing session's writer gets to flush before it is aborted
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Drives every signaling connection through handshake, relay and teardown.
pub struct SignalingRouter {
    registry: Arc<RoomRegistry>,
    config: SignalingConfig,
    next_session: AtomicU64,
}

impl SignalingRouter {
    pub fn new(registry: Arc<RoomRegistry>, config: SignalingConfig) -> Self {
        Self {
            registry,
            config,
            next_session: AtomicU64::new(0),
        }
    }

    /// Runs one connection to completion
    pub async fn serve(&self, sink: Box<dyn FrameSink>, stream: Box<dyn FrameStream>) {
        let session_id = self.next_session.fetch_add(1, Ordering::Relaxed) + 1;
        self.run_session(session_id, sink, stream).await;
    }

    #[instrument(
        name = "signaling_session",
        skip(self, sink, stream),
        fields(room_id = tracing::field::Empty, peer_id = tracing::field::Empty)
    )]
    async fn run_session(
        &self,
        session_id: SessionId,
        mut sink: Box<dyn FrameSink>,
        mut stream: Box<dyn FrameStream>,
    ) {
        let request = match timeout(self.config.handshake_timeout, read_join(stream.as_mut())).await
        {
            Ok(Ok(request)) => request,
            Ok(Err(e)) => return reject(sink, e).await,
            Err(_) => return reject(sink, HandshakeError::Timeout(self.config.handshake_timeout)).await,
        };

        let (outbound, receiver, evict) = Outbound::channel(self.config.queue_capacity);
        let (room, joined) = match self.admit(session_id, &request, outbound) {
            Ok(admitted) => admitted,
            Err(e) => {
                warn!(room_id = %request.room_id, error = %e, "Join refused");
                if let Err(e) = sink.close().await {
                    debug!(error = %e, "Close frame not delivered");
                }
                return;
            }
        };

        let session = ActiveSession {
            id: session_id,
            peer_id: joined.peer_id,
            name: request.name,
            room_id: request.room_id,
        };
        Span::current().record("room_id", session.room_id.as_str());
        Span::current().record("peer_id", session.peer_id.as_str());
        info!(name = %session.name, "Session admitted");

        let mut writer = tokio::spawn(write_loop(session_id, sink, receiver));

        relay(&session, &room, stream.as_mut(), &evict, &mut writer).await;

        let emptied = room
            .leave(session_id)
            .is_some_and(|departure| departure.room_emptied);
        // only the departure that emptied the room touches the registry
        if emptied {
            self.registry.evict_if_empty(&room);
        }

        // Leaving dropped the last queue sender, so the writer ends once it
        // has flushed what is already queued
        if !writer.is_finished() && timeout(WRITER_DRAIN_TIMEOUT, &mut writer).await.is_err() {
            warn!("Writer did not drain in time, aborting");
            writer.abort();
        }
        info!("Session ended");
    }

    /// Joins the requested room, retrying when the room closed underneath us
    fn admit(
        &self,
        session_id: SessionId,
        request: &JoinRequest,
        outbound: Outbound,
    ) -> Result<(Arc<Room>, JoinedRoom), JoinError> {
        loop {
            let room = self.registry.get_or_create(&request.room_id);
            match room.join(session_id, request.name.clone(), outbound.clone()) {
                Ok(joined) => return Ok((room, joined)),
                Err(JoinError::RoomClosed(_)) => {
                    debug!(room_id = %request.room_id, "Room closed during join, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }
}

async fn read_join(stream: &mut dyn FrameStream) -> Result<JoinRequest, HandshakeError> {
    match stream.next_frame().await {
        Ok(Some(InboundFrame::Text(text))) => parse_join(&text),
        Ok(Some(InboundFrame::Ignored)) => Err(HandshakeError::NonText),
        Ok(None) => Err(HandshakeError::Closed),
        Err(e) => Err(HandshakeError::Transport(e.to_string())),
    }
}

async fn reject(mut sink: Box<dyn FrameSink>, error: HandshakeError) {
    warn!(error = %error, "Handshake failed, closing connection");
    if let Err(e) = sink.close().await {
        debug!(error = %e, "Close frame not delivered");
    }
}

/// Forwards the session's frames until it disconnects, is evicted, or its
/// writer dies
async fn relay(
    session: &ActiveSession,
    room: &Room,
    stream: &mut dyn FrameStream,
    evict: &Notify,
    writer: &mut JoinHandle<()>,
) {
    loop {
        tokio::select! {
            frame = stream.next_frame() => match frame {
                Ok(Some(InboundFrame::Text(text))) => dispatch(session, room, text),
                Ok(Some(InboundFrame::Ignored)) => {}
                Ok(None) => {
                    debug!("Client disconnected");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Read from connection failed");
                    break;
                }
            },
            _ = evict.notified() => {
                warn!("Disconnecting slow consumer");
                break;
            }
            _ = &mut *writer => {
                debug!("Writer stopped first");
                break;
            }
        }
    }
}

fn dispatch(session: &ActiveSession, room: &Room, text: String) {
    let route = match route_of(&text) {
        Ok(route) => route,
        Err(e) => {
            debug!(error = %e, "Skipping malformed frame");
            return;
        }
    };

    let frame = OutboundFrame::from(text);
    match route {
        Route::To(target) => {
            if !room.send_to(&target, &frame) {
                debug!(to_peer = %target, "No such peer, frame discarded");
            }
        }
        Route::Broadcast => {
            let delivered = room.broadcast(session.id, &frame);
            debug!(delivered, "Broadcast frame");
        }
    }
}
