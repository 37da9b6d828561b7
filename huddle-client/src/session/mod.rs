mod rtc_session;

pub use rtc_session::*;

use crate::error::NegotiationError;
use crate::media::{LocalTrack, TrackKind};
use crate::orchestrator::EngineEvent;
use async_trait::async_trait;
use huddle_core::{ConnectionId, IceCandidate, IceServerConfig, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Connectivity of one negotiation session, as reported by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// An inbound track announced by the remote side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub stream_id: String,
    pub track_id: String,
    pub kind: TrackKind,
}

/// The remote participant's media stream, grown one track at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStream {
    pub id: String,
    pub tracks: Vec<RemoteTrack>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    LocalCandidate(IceCandidate),
    Connectivity(Connectivity),
    RemoteTrack(RemoteTrack),
}

/// Sink a session reports into. Stamped with the peer and the session
/// generation so events from a replaced session can be told apart.
#[derive(Clone)]
pub struct SessionEvents {
    peer: ConnectionId,
    generation: u64,
    tx: mpsc::UnboundedSender<EngineEvent>,
}

impl SessionEvents {
    pub fn new(peer: ConnectionId, generation: u64, tx: mpsc::UnboundedSender<EngineEvent>) -> Self {
        Self {
            peer,
            generation,
            tx,
        }
    }

    pub fn peer(&self) -> ConnectionId {
        self.peer
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn emit(&self, event: SessionEvent) {
        let _ = self.tx.send(EngineEvent::Session {
            peer: self.peer,
            generation: self.generation,
            event,
        });
    }
}

/// One peer-to-peer negotiation session.
#[async_trait]
pub trait NegotiationSession: Send + Sync {
    /// Creates an offer and sets it as the local description.
    async fn create_offer(&self, ice_restart: bool) -> Result<SessionDescription, NegotiationError>;

    /// Creates an answer and sets it as the local description.
    async fn create_answer(&self) -> Result<SessionDescription, NegotiationError>;

    async fn set_remote_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), NegotiationError>;

    /// Discards a pending local offer.
    async fn rollback(&self) -> Result<(), NegotiationError>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), NegotiationError>;

    async fn attach_track(&self, track: &LocalTrack) -> Result<(), NegotiationError>;

    /// Swaps what an attached slot sends. Never renegotiates.
    async fn replace_track(&self, track: &LocalTrack) -> Result<(), NegotiationError>;

    async fn close(&self) -> Result<(), NegotiationError>;
}

#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn create(
        &self,
        ice_servers: &[IceServerConfig],
        events: SessionEvents,
    ) -> Result<Arc<dyn NegotiationSession>, NegotiationError>;
}
