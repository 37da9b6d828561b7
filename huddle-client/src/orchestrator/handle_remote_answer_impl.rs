use huddle_core::{ConnectionId, SessionDescription};
use tracing::{debug, info, warn};

use crate::orchestrator::Orchestrator;
use crate::peer_link::PeerState;

impl Orchestrator {
    pub(super) async fn handle_remote_answer(
        &mut self,
        from: ConnectionId,
        answer: SessionDescription,
    ) {
        if !self.in_room() {
            debug!("Dropping answer from {}", from);
            return;
        }

        let Some(link) = self.peers.get(&from) else {
            warn!("Answer from unknown peer {}", from);
            return;
        };

        let state = link.state();
        if !state.awaits_answer() && !link.restart_pending() {
            warn!("Ignoring answer from {} in state {:?}", from, state);
            return;
        }

        let Some(session) = link.session() else {
            warn!("Answer from {} but no session is open", from);
            return;
        };

        if let Err(e) = session.set_remote_description(answer).await {
            return self.fail_negotiation(from, state, e);
        }

        let queued = match self.peers.get_mut(&from) {
            Some(link) => {
                link.set_restart_pending(false);
                link.mark_remote_applied()
            }
            None => Vec::new(),
        };
        self.apply_candidates(from, &session, queued).await;

        self.transition(from, PeerState::Connected);
        info!("Remote description set (Answer) for {}", from);
    }
}
