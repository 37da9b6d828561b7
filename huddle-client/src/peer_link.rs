use crate::session::{NegotiationSession, RemoteStream, RemoteTrack};
use huddle_core::{ConnectionId, IceCandidate};
use std::collections::VecDeque;
use std::sync::Arc;

/// Negotiation state of one [`PeerLink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    New,
    OfferSent,
    OfferReceived,
    Answering,
    Connected,
    Disconnected,
    Failed,
    Restarting,
    Closed,
}

impl PeerState {
    /// Negotiation finished at least once on the current session.
    pub fn is_established(self) -> bool {
        matches!(self, Self::Connected | Self::Disconnected | Self::Failed)
    }

    /// A local offer is outstanding.
    pub fn awaits_answer(self) -> bool {
        matches!(self, Self::OfferSent | Self::Restarting)
    }
}

/// Everything the local participant knows about one remote participant.
pub struct PeerLink {
    remote: ConnectionId,
    state: PeerState,
    session: Option<Arc<dyn NegotiationSession>>,
    generation: u64,
    pending_candidates: VecDeque<IceCandidate>,
    remote_description_applied: bool,
    remote_stream: Option<RemoteStream>,
    restart_pending: bool,
    failed: bool,
}

impl PeerLink {
    pub fn new(remote: ConnectionId) -> Self {
        Self {
            remote,
            state: PeerState::New,
            session: None,
            generation: 0,
            pending_candidates: VecDeque::new(),
            remote_description_applied: false,
            remote_stream: None,
            restart_pending: false,
            failed: false,
        }
    }

    pub fn remote(&self) -> ConnectionId {
        self.remote
    }

    pub fn state(&self) -> PeerState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: PeerState) -> bool {
        let changed = self.state != state;
        self.state = state;
        changed
    }

    pub fn session(&self) -> Option<Arc<dyn NegotiationSession>> {
        self.session.clone()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Installs a fresh session. Candidate bookkeeping starts over; the
    /// remote stream survives until the new session announces its own.
    pub(crate) fn replace_session(
        &mut self,
        session: Arc<dyn NegotiationSession>,
        generation: u64,
    ) -> Option<Arc<dyn NegotiationSession>> {
        self.generation = generation;
        self.pending_candidates.clear();
        self.remote_description_applied = false;
        self.restart_pending = false;
        self.session.replace(session)
    }

    pub(crate) fn take_session(&mut self) -> Option<Arc<dyn NegotiationSession>> {
        self.session.take()
    }

    pub fn remote_description_applied(&self) -> bool {
        self.remote_description_applied
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending_candidates.len()
    }

    /// Queues `candidate` until a remote description is applied. Hands it
    /// back when it can be applied right away.
    pub(crate) fn buffer_candidate(&mut self, candidate: IceCandidate) -> Option<IceCandidate> {
        if self.remote_description_applied && self.session.is_some() {
            return Some(candidate);
        }
        self.pending_candidates.push_back(candidate);
        None
    }

    /// Records that a remote description was applied. Returns the queued
    /// candidates, in arrival order, the first time only.
    pub(crate) fn mark_remote_applied(&mut self) -> Vec<IceCandidate> {
        if self.remote_description_applied {
            return Vec::new();
        }
        self.remote_description_applied = true;
        self.pending_candidates.drain(..).collect()
    }

    pub fn remote_stream(&self) -> Option<&RemoteStream> {
        self.remote_stream.as_ref()
    }

    /// Folds an inbound track into the stored stream. A track of another
    /// stream replaces it.
    pub(crate) fn observe_track(&mut self, track: RemoteTrack) -> &RemoteStream {
        let stream = match self.remote_stream.take() {
            Some(mut stream) if stream.id == track.stream_id => {
                stream.tracks.retain(|t| t.track_id != track.track_id);
                stream.tracks.push(track);
                stream
            }
            _ => RemoteStream {
                id: track.stream_id.clone(),
                tracks: vec![track],
            },
        };
        self.remote_stream.insert(stream)
    }

    pub fn restart_pending(&self) -> bool {
        self.restart_pending
    }

    pub(crate) fn set_restart_pending(&mut self, pending: bool) {
        self.restart_pending = pending;
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Returns `true` when the indicator flips.
    pub(crate) fn set_failed(&mut self, failed: bool) -> bool {
        let changed = self.failed != failed;
        self.failed = failed;
        changed
    }
}
