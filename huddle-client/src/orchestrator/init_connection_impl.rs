use huddle_core::{ClientMessage, ConnectionId};
use tracing::info;

use crate::orchestrator::Orchestrator;
use crate::peer_link::PeerState;

impl Orchestrator {
    /// Sends the first offer to `peer`. With `fresh` any existing session is
    /// replaced first.
    pub(super) async fn init_connection(&mut self, peer: ConnectionId, fresh: bool) {
        let Some(prior) = self.peers.get(&peer).map(|link| link.state()) else {
            return;
        };

        let session = if fresh {
            self.new_session(peer).await
        } else {
            self.ensure_session(peer).await
        };
        let session = match session {
            Ok(session) => session,
            Err(e) => return self.fail_negotiation(peer, prior, e),
        };

        match session.create_offer(false).await {
            Ok(offer) => {
                self.transition(peer, PeerState::OfferSent);
                self.relay.send(ClientMessage::Offer {
                    offer,
                    to: peer,
                    restart: false,
                });
                info!("Offer sent to {}", peer);
            }
            Err(e) => self.fail_negotiation(peer, prior, e),
        }
    }
}
