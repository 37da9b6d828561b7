use huddle_core::{ConnectionId, IceCandidate};
use tracing::{debug, warn};

use crate::orchestrator::Orchestrator;

impl Orchestrator {
    pub(super) async fn handle_remote_candidate(
        &mut self,
        from: ConnectionId,
        candidate: IceCandidate,
    ) {
        if !self.in_room() || from == self.local_id {
            debug!("Dropping candidate from {}", from);
            return;
        }

        self.ensure_peer(from);
        let Some(link) = self.peers.get_mut(&from) else {
            return;
        };

        let Some(candidate) = link.buffer_candidate(candidate) else {
            debug!(
                "Buffered candidate from {} ({} queued)",
                from,
                link.pending_candidates()
            );
            return;
        };

        if let Some(session) = link.session() {
            if let Err(e) = session.add_ice_candidate(candidate).await {
                warn!("Error adding ICE from {}: {}", from, e);
            }
        }
    }
}
