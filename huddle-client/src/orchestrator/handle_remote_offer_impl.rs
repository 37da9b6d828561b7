use huddle_core::{ClientMessage, ConnectionId, SessionDescription};
use tracing::{debug, info};

use crate::orchestrator::Orchestrator;
use crate::peer_link::PeerState;

impl Orchestrator {
    pub(super) async fn handle_remote_offer(
        &mut self,
        from: ConnectionId,
        offer: SessionDescription,
        restart: bool,
    ) {
        if !self.in_room() || from == self.local_id {
            debug!("Dropping offer from {}", from);
            return;
        }

        self.ensure_peer(from);
        let Some(link) = self.peers.get(&from) else {
            return;
        };
        let state = link.state();

        let collision = match state {
            PeerState::OfferSent => true,
            PeerState::Restarting => restart,
            _ => false,
        };

        if collision {
            // The smaller id yields.
            if self.local_id > from {
                info!("Offer collision with {}, keeping ours", from);
                return;
            }

            info!("Offer collision with {}, rolling back ours", from);
            if let Some(session) = link.session() {
                if let Err(e) = session.rollback().await {
                    return self.fail_negotiation(from, state, e);
                }
            }
            if let Some(link) = self.peers.get_mut(&from) {
                link.set_restart_pending(false);
            }
        }

        let mut prior = state;
        let started_over = state.is_established() || state == PeerState::Restarting;
        if !collision && !restart && started_over {
            info!("{} started over, replacing its session", from);
            if let Err(e) = self.new_session(from).await {
                return self.fail_negotiation(from, state, e);
            }
            // A failure below leaves the fresh session unnegotiated
            prior = PeerState::New;
        }

        self.accept_offer(from, offer, prior).await;
    }

    async fn accept_offer(
        &mut self,
        from: ConnectionId,
        offer: SessionDescription,
        prior: PeerState,
    ) {
        let session = match self.ensure_session(from).await {
            Ok(session) => session,
            Err(e) => return self.fail_negotiation(from, prior, e),
        };

        self.transition(from, PeerState::OfferReceived);
        if let Err(e) = session.set_remote_description(offer).await {
            return self.fail_negotiation(from, prior, e);
        }

        let queued = self
            .peers
            .get_mut(&from)
            .map(|link| link.mark_remote_applied())
            .unwrap_or_default();
        self.apply_candidates(from, &session, queued).await;

        self.transition(from, PeerState::Answering);
        let answer = match session.create_answer().await {
            Ok(answer) => answer,
            Err(e) => return self.fail_negotiation(from, prior, e),
        };

        self.relay.send(ClientMessage::Answer { answer, to: from });
        self.transition(from, PeerState::Connected);
        info!("Answered offer from {}", from);
    }
}
