use crate::error::NegotiationError;
use crate::media::{LocalMedia, LocalTrack, TrackKind};
use crate::peer_link::{PeerLink, PeerState};
use crate::session::{
    NegotiationSession, RemoteStream, SessionEvent, SessionEvents, SessionFactory,
};
use huddle_core::{ClientMessage, ConnectionId, IceCandidate, IceServerConfig, RoomId, ServerMessage};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

mod handle_candidate_impl;
mod handle_remote_answer_impl;
mod handle_remote_offer_impl;
mod handle_signal_impl;
mod init_connection_impl;
mod media_impl;
mod membership_impl;
mod session_event_impl;

/// Everything the orchestrator reacts to, drained one at a time.
pub enum EngineEvent {
    Relay(ServerMessage),
    RelayConnected,
    RelayDisconnected,
    Session {
        peer: ConnectionId,
        generation: u64,
        event: SessionEvent,
    },
    Command(EngineCommand),
}

pub enum EngineCommand {
    Join(RoomId),
    Leave,
    SetTrackEnabled {
        kind: TrackKind,
        enabled: bool,
        reply: oneshot::Sender<bool>,
    },
    ReplaceTrack {
        track: LocalTrack,
        reply: oneshot::Sender<Result<(), NegotiationError>>,
    },
    Shutdown,
}

/// What the orchestrator reports to the application.
#[derive(Debug, Clone, PartialEq)]
pub enum PeerUpdate {
    PeerAdded(ConnectionId),
    StateChanged {
        peer: ConnectionId,
        state: PeerState,
    },
    RemoteStream {
        peer: ConnectionId,
        stream: RemoteStream,
    },
    /// An ICE restart did not bring the link back.
    PeerFailed(ConnectionId),
    NegotiationFailed {
        peer: ConnectionId,
        reason: String,
    },
    PeerRemoved(ConnectionId),
}

/// Outbound side of the relay connection.
pub trait RelaySink: Send + Sync {
    fn send(&self, msg: ClientMessage);
}

impl RelaySink for mpsc::UnboundedSender<ClientMessage> {
    fn send(&self, msg: ClientMessage) {
        if mpsc::UnboundedSender::send(self, msg).is_err() {
            warn!("Relay controller is gone, dropping outbound signal");
        }
    }
}

/// Owns every [`PeerLink`] and drives their negotiation.
pub struct Orchestrator {
    local_id: ConnectionId,
    room: Option<RoomId>,
    peers: HashMap<ConnectionId, PeerLink>,
    media: LocalMedia,
    ice_servers: Vec<IceServerConfig>,
    factory: Arc<dyn SessionFactory>,
    relay: Arc<dyn RelaySink>,
    events: mpsc::UnboundedSender<EngineEvent>,
    updates: mpsc::UnboundedSender<PeerUpdate>,
    next_generation: u64,
    /// Set while signals may have been lost to a relay outage; cleared by the
    /// next roster.
    resync_pending: bool,
}

impl Orchestrator {
    /// `events` is the sender half of the queue later passed to [`Self::run`];
    /// sessions report through it.
    pub fn new(
        local_id: ConnectionId,
        media: LocalMedia,
        ice_servers: Vec<IceServerConfig>,
        factory: Arc<dyn SessionFactory>,
        relay: Arc<dyn RelaySink>,
        events: mpsc::UnboundedSender<EngineEvent>,
    ) -> (Self, mpsc::UnboundedReceiver<PeerUpdate>) {
        let (updates, updates_rx) = mpsc::unbounded_channel();

        let orchestrator = Self {
            local_id,
            room: None,
            peers: HashMap::new(),
            media,
            ice_servers,
            factory,
            relay,
            events,
            updates,
            next_generation: 0,
            resync_pending: false,
        };

        (orchestrator, updates_rx)
    }

    pub fn local_id(&self) -> ConnectionId {
        self.local_id
    }

    pub fn room(&self) -> Option<&RoomId> {
        self.room.as_ref()
    }

    pub fn peer(&self, id: &ConnectionId) -> Option<&PeerLink> {
        self.peers.get(id)
    }

    pub fn peer_ids(&self) -> Vec<ConnectionId> {
        let mut ids: Vec<ConnectionId> = self.peers.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn media(&self) -> &LocalMedia {
        &self.media
    }

    pub fn ice_servers(&self) -> &[IceServerConfig] {
        &self.ice_servers
    }

    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<EngineEvent>) {
        info!("Orchestrator for {} started", self.local_id);

        while let Some(event) = rx.recv().await {
            if !self.handle_event(event).await {
                break;
            }
        }

        info!("Orchestrator for {} stopped", self.local_id);
    }

    /// Applies one event. Returns `false` once shut down.
    pub async fn handle_event(&mut self, event: EngineEvent) -> bool {
        match event {
            EngineEvent::Relay(msg) => self.handle_signal(msg).await,
            EngineEvent::RelayConnected => info!("Relay connected"),
            EngineEvent::RelayDisconnected => {
                warn!("Relay lost, keeping {} peer links", self.peers.len());
                self.resync_pending = true;
            }
            EngineEvent::Session {
                peer,
                generation,
                event,
            } => self.handle_session_event(peer, generation, event).await,
            EngineEvent::Command(command) => return self.handle_command(command).await,
        }
        true
    }

    async fn handle_command(&mut self, command: EngineCommand) -> bool {
        match command {
            EngineCommand::Join(room) => self.join_room(room).await,
            EngineCommand::Leave => self.leave_room().await,
            EngineCommand::SetTrackEnabled {
                kind,
                enabled,
                reply,
            } => {
                let _ = reply.send(self.set_track_enabled(kind, enabled));
            }
            EngineCommand::ReplaceTrack { track, reply } => {
                let _ = reply.send(self.replace_track(track).await);
            }
            EngineCommand::Shutdown => {
                self.leave_room().await;
                self.media.release();
                return false;
            }
        }
        true
    }

    fn emit(&self, update: PeerUpdate) {
        let _ = self.updates.send(update);
    }

    fn in_room(&self) -> bool {
        self.room.is_some()
    }

    fn transition(&mut self, peer: ConnectionId, state: PeerState) {
        let changed = match self.peers.get_mut(&peer) {
            Some(link) => link.set_state(state),
            None => false,
        };

        if changed {
            debug!("Link to {} is now {:?}", peer, state);
            self.emit(PeerUpdate::StateChanged { peer, state });
        }
    }

    /// Returns `true` if a link had to be created.
    fn ensure_peer(&mut self, peer: ConnectionId) -> bool {
        if self.peers.contains_key(&peer) {
            return false;
        }

        self.peers.insert(peer, PeerLink::new(peer));
        self.emit(PeerUpdate::PeerAdded(peer));
        true
    }

    async fn ensure_session(
        &mut self,
        peer: ConnectionId,
    ) -> Result<Arc<dyn NegotiationSession>, NegotiationError> {
        match self.peers.get(&peer).and_then(|link| link.session()) {
            Some(session) => Ok(session),
            None => self.new_session(peer).await,
        }
    }

    /// Builds a session for `peer` with every local track attached, muted or
    /// not, closing the one it replaces. Muted tracks send no frames.
    async fn new_session(
        &mut self,
        peer: ConnectionId,
    ) -> Result<Arc<dyn NegotiationSession>, NegotiationError> {
        self.next_generation += 1;
        let generation = self.next_generation;

        let events = SessionEvents::new(peer, generation, self.events.clone());
        let session = self.factory.create(&self.ice_servers, events).await?;

        for track in self.media.tracks() {
            if let Err(e) = session.attach_track(track).await {
                let _ = session.close().await;
                return Err(e);
            }
        }

        let Some(link) = self.peers.get_mut(&peer) else {
            let _ = session.close().await;
            return Err(NegotiationError::Closed);
        };

        if let Some(old) = link.replace_session(session.clone(), generation) {
            if let Err(e) = old.close().await {
                warn!("Failed to close replaced session for {}: {}", peer, e);
            }
        }

        debug!("Session generation {} for {}", generation, peer);
        Ok(session)
    }

    async fn close_peer(&mut self, peer: ConnectionId, reason: &str) {
        let Some(mut link) = self.peers.remove(&peer) else {
            return;
        };

        if link.set_state(PeerState::Closed) {
            self.emit(PeerUpdate::StateChanged {
                peer,
                state: PeerState::Closed,
            });
        }

        if let Some(session) = link.take_session() {
            if let Err(e) = session.close().await {
                warn!("Failed to close session for {}: {}", peer, e);
            }
        }

        info!("Closed link to {} ({})", peer, reason);
        self.emit(PeerUpdate::PeerRemoved(peer));
    }

    fn fail_negotiation(&mut self, peer: ConnectionId, prior: PeerState, error: NegotiationError) {
        error!("Negotiation with {} failed: {}", peer, error);
        self.transition(peer, prior);
        self.emit(PeerUpdate::NegotiationFailed {
            peer,
            reason: error.to_string(),
        });
    }

    async fn apply_candidates(
        &self,
        peer: ConnectionId,
        session: &Arc<dyn NegotiationSession>,
        candidates: Vec<IceCandidate>,
    ) {
        if !candidates.is_empty() {
            debug!("Flushing {} buffered candidates from {}", candidates.len(), peer);
        }

        for candidate in candidates {
            if let Err(e) = session.add_ice_candidate(candidate).await {
                warn!("Error adding ICE from {}: {}", peer, e);
            }
        }
    }
}
