use huddle_core::{ClientMessage, ConnectionId};
use tracing::{debug, error, info, warn};

use crate::orchestrator::{Orchestrator, PeerUpdate};
use crate::peer_link::PeerState;
use crate::session::{Connectivity, SessionEvent};

impl Orchestrator {
    pub(super) async fn handle_session_event(
        &mut self,
        peer: ConnectionId,
        generation: u64,
        event: SessionEvent,
    ) {
        let Some(link) = self.peers.get_mut(&peer) else {
            debug!("Session event for unknown peer {}", peer);
            return;
        };

        if link.generation() != generation {
            debug!(
                "Ignoring event from replaced session {} of {}",
                generation, peer
            );
            return;
        }

        match event {
            SessionEvent::LocalCandidate(candidate) => {
                self.relay
                    .send(ClientMessage::IceCandidate { candidate, to: peer });
            }
            SessionEvent::RemoteTrack(track) => {
                let stream = link.observe_track(track).clone();
                self.emit(PeerUpdate::RemoteStream { peer, stream });
            }
            SessionEvent::Connectivity(connectivity) => {
                self.handle_connectivity(peer, connectivity).await
            }
        }
    }

    async fn handle_connectivity(&mut self, peer: ConnectionId, connectivity: Connectivity) {
        let Some(link) = self.peers.get_mut(&peer) else {
            return;
        };
        let state = link.state();

        match connectivity {
            Connectivity::Connected => {
                if link.set_failed(false) {
                    info!("Link to {} recovered", peer);
                }
                if matches!(
                    state,
                    PeerState::Restarting | PeerState::Disconnected | PeerState::Failed
                ) {
                    self.transition(peer, PeerState::Connected);
                }
            }

            Connectivity::Disconnected | Connectivity::Failed => {
                if state == PeerState::Connected {
                    warn!("Link to {} is {:?}, restarting ICE", peer, connectivity);
                    let next = if connectivity == Connectivity::Failed {
                        PeerState::Failed
                    } else {
                        PeerState::Disconnected
                    };
                    self.transition(peer, next);
                    self.restart(peer).await;
                } else if state == PeerState::Restarting && connectivity == Connectivity::Failed {
                    if link.set_failed(true) {
                        error!("ICE restart with {} did not recover the link", peer);
                        self.emit(PeerUpdate::PeerFailed(peer));
                    }
                } else {
                    debug!("{:?} from {} while {:?}", connectivity, peer, state);
                }
            }

            Connectivity::Closed => self.close_peer(peer, "session closed").await,

            Connectivity::New | Connectivity::Connecting => {}
        }
    }

    /// ICE restart on the existing session.
    pub(super) async fn restart(&mut self, peer: ConnectionId) {
        let Some(link) = self.peers.get(&peer) else {
            return;
        };
        let prior = link.state();
        let Some(session) = link.session() else {
            return;
        };

        match session.create_offer(true).await {
            Ok(offer) => {
                if let Some(link) = self.peers.get_mut(&peer) {
                    link.set_restart_pending(true);
                }
                self.transition(peer, PeerState::Restarting);
                self.relay.send(ClientMessage::Offer {
                    offer,
                    to: peer,
                    restart: true,
                });
                info!("Restart offer sent to {}", peer);
            }
            Err(e) => self.fail_negotiation(peer, prior, e),
        }
    }
}
