use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::messages::{OutboundFrame, PeerInfo, ServerMessage};
use super::session::{Delivery, Outbound, SessionId};
use crate::config::SlowConsumerPolicy;

#[derive(Debug, Error)]
pub enum JoinError {
    #[error("room {0} is full")]
    RoomFull(String),

    /// The room emptied and was evicted between lookup and join
    #[error("room {0} is closed")]
    RoomClosed(String),

    #[error("failed to encode control message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// What a successful join hands back to the router
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRoom {
    pub peer_id: String,
    /// Other members at the instant of insertion, in join order
    pub peers: Vec<PeerInfo>,
}

/// A member that was removed from the room
#[derive(Debug, Clone, PartialEq)]
pub struct Departure {
    pub peer_id: String,
    /// The room became empty and is now closed
    pub room_emptied: bool,
}

struct Member {
    seq: u64,
    peer_id: String,
    name: String,
    outbound: Outbound,
}

#[derive(Default)]
struct Members {
    by_session: HashMap<SessionId, Member>,
    next_seq: u64,
    closed: bool,
}

/// A named set of sessions. Every membership change and every fan-out read
/// happens under one lock; nothing under the lock awaits.
pub struct Room {
    id: String,
    max_members: usize,
    policy: SlowConsumerPolicy,
    members: Mutex<Members>,
}

impl Room {
    pub fn new(id: String, max_members: usize, policy: SlowConsumerPolicy) -> Self {
        Self {
            id,
            max_members,
            policy,
            members: Mutex::new(Members::default()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn lock(&self) -> MutexGuard<'_, Members> {
        self.members.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admits a session: assigns its peer id, queues `id` and `peers` to it,
    /// and queues `new-peer` to everyone else, all under one lock acquisition.
    pub fn join(
        &self,
        session_id: SessionId,
        name: String,
        outbound: Outbound,
    ) -> Result<JoinedRoom, JoinError> {
        let mut members = self.lock();

        if members.closed {
            return Err(JoinError::RoomClosed(self.id.clone()));
        }
        if members.by_session.len() >= self.max_members {
            return Err(JoinError::RoomFull(self.id.clone()));
        }

        let seq = members.next_seq + 1;
        let peer_id = format!("p{}", seq);

        let mut existing: Vec<&Member> = members.by_session.values().collect();
        existing.sort_by_key(|m| m.seq);
        let peers: Vec<PeerInfo> = existing
            .iter()
            .map(|m| PeerInfo {
                peer_id: m.peer_id.clone(),
                name: m.name.clone(),
            })
            .collect();

        let id_frame = ServerMessage::Id {
            id: peer_id.clone(),
        }
        .to_frame()?;
        let peers_frame = ServerMessage::Peers {
            peers: peers.clone(),
        }
        .to_frame()?;
        let new_peer_frame = ServerMessage::NewPeer {
            peer_id: peer_id.clone(),
            name: name.clone(),
        }
        .to_frame()?;

        // A fresh queue always has room for these two
        outbound.deliver(&id_frame, self.policy);
        outbound.deliver(&peers_frame, self.policy);

        for member in members.by_session.values() {
            self.deliver_to(member, &new_peer_frame);
        }

        members.next_seq = seq;
        members.by_session.insert(
            session_id,
            Member {
                seq,
                peer_id: peer_id.clone(),
                name,
                outbound,
            },
        );

        info!(
            room_id = %self.id,
            peer_id = %peer_id,
            member_count = members.by_session.len(),
            "Peer joined room"
        );

        Ok(JoinedRoom { peer_id, peers })
    }

    /// Removes a session if present. Remaining members are told with
    /// `peer-left`; the last departure closes the room.
    pub fn leave(&self, session_id: SessionId) -> Option<Departure> {
        let mut members = self.lock();
        let member = members.by_session.remove(&session_id)?;

        let room_emptied = members.by_session.is_empty();
        if room_emptied {
            members.closed = true;
        } else {
            match (ServerMessage::PeerLeft {
                peer_id: member.peer_id.clone(),
            })
            .to_frame()
            {
                Ok(frame) => {
                    for remaining in members.by_session.values() {
                        self.deliver_to(remaining, &frame);
                    }
                }
                Err(e) => warn!(room_id = %self.id, error = %e, "Failed to encode peer-left"),
            }
        }

        info!(
            room_id = %self.id,
            peer_id = %member.peer_id,
            remaining = members.by_session.len(),
            "Peer left room"
        );

        Some(Departure {
            peer_id: member.peer_id,
            room_emptied,
        })
    }

    /// Queues `frame` for every member except `exclude`; returns how many
    /// members accepted it
    pub fn broadcast(&self, exclude: SessionId, frame: &OutboundFrame) -> usize {
        let members = self.lock();
        members
            .by_session
            .iter()
            .filter(|(session_id, _)| **session_id != exclude)
            .filter(|(_, member)| self.deliver_to(member, frame) == Delivery::Queued)
            .count()
    }

    /// Queues `frame` for the member holding `peer_id`. Returns false when no
    /// such member exists.
    pub fn send_to(&self, peer_id: &str, frame: &OutboundFrame) -> bool {
        let members = self.lock();
        match members.by_session.values().find(|m| m.peer_id == peer_id) {
            Some(member) => {
                self.deliver_to(member, frame);
                true
            }
            None => false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn member_count(&self) -> usize {
        self.lock().by_session.len()
    }

    fn deliver_to(&self, member: &Member, frame: &OutboundFrame) -> Delivery {
        let delivery = member.outbound.deliver(frame, self.policy);
        match delivery {
            Delivery::Queued => {}
            Delivery::Dropped => warn!(
                room_id = %self.id,
                peer_id = %member.peer_id,
                "Outbound queue full, dropping frame"
            ),
            Delivery::Evicted => warn!(
                room_id = %self.id,
                peer_id = %member.peer_id,
                "Outbound queue full, disconnecting slow consumer"
            ),
            Delivery::Closed => debug!(
                room_id = %self.id,
                peer_id = %member.peer_id,
                "Member writer already stopped"
            ),
        }
        delivery
    }
}
