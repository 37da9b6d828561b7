use std::sync::Arc;
use tracing::{info, warn};

use crate::error::NegotiationError;
use crate::media::{LocalTrack, TrackKind};
use crate::orchestrator::Orchestrator;
use crate::session::NegotiationSession;

impl Orchestrator {
    /// Local mute toggle. Never renegotiates.
    pub(super) fn set_track_enabled(&self, kind: TrackKind, enabled: bool) -> bool {
        self.media.set_enabled(kind, enabled)
    }

    /// Swaps the `track.kind()` slot on every live session. Never renegotiates.
    pub(super) async fn replace_track(&mut self, track: LocalTrack) -> Result<(), NegotiationError> {
        let kind = track.kind();
        let Some(previous) = self.media.track(kind) else {
            return Err(NegotiationError::NoSuchTrack(kind));
        };
        track.set_enabled(previous.is_enabled());
        self.media.replace(track.clone());

        let sessions: Vec<(_, Arc<dyn NegotiationSession>)> = self
            .peers
            .values()
            .filter_map(|link| link.session().map(|s| (link.remote(), s)))
            .collect();

        for (peer, session) in sessions {
            if let Err(e) = session.replace_track(&track).await {
                warn!("Failed to replace {} track for {}: {}", kind, peer, e);
            }
        }

        info!("Replaced local {} track", kind);
        Ok(())
    }
}
