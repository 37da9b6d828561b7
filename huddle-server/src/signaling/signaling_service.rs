use crate::room::RoomManager;
use crate::signaling::MessageRelay;
use crate::transport::SessionRegistry;
use huddle_core::{ClientMessage, ConnectionId, IceServerConfig, ServerMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

struct SignalingInner {
    sessions: Arc<SessionRegistry>,
    relay: MessageRelay,
    ice_servers: Vec<IceServerConfig>,
}

/// Ties the session registry, room manager and relay together. Cheap to clone.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        let sessions = Arc::new(SessionRegistry::new());
        let relay = MessageRelay::new(RoomManager::new(), sessions.clone());

        Self {
            inner: Arc::new(SignalingInner {
                sessions,
                relay,
                ice_servers,
            }),
        }
    }

    pub fn get_ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.ice_servers.clone()
    }

    pub fn rooms(&self) -> &RoomManager {
        self.inner.relay.rooms()
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.inner.sessions
    }

    /// Registers a new transport and greets it. Returns the registration
    /// generation to hand back to [`Self::disconnect`].
    pub fn connect(&self, id: ConnectionId, tx: mpsc::UnboundedSender<ServerMessage>) -> u64 {
        let generation = self.inner.sessions.register(id, tx);

        self.inner
            .sessions
            .send(&id, ServerMessage::Welcome { connection_id: id });
        self.inner.sessions.send(
            &id,
            ServerMessage::IceConfig {
                ice_servers: self.get_ice_servers(),
            },
        );

        generation
    }

    pub async fn handle_text(&self, from: ConnectionId, text: &str) {
        match ClientMessage::decode(text) {
            Ok(msg) => self.handle_message(from, msg).await,
            Err(e) => warn!("Invalid signal from {}: {}", from, e),
        }
    }

    pub async fn handle_message(&self, from: ConnectionId, msg: ClientMessage) {
        self.inner.relay.handle_message(from, msg).await;
    }

    pub async fn disconnect(&self, id: ConnectionId, generation: u64) {
        if self.inner.sessions.unregister(&id, generation) {
            self.inner.relay.handle_disconnect(id).await;
        } else {
            debug!(
                "Stale transport for {} closed (generation {}), keeping memberships",
                id, generation
            );
        }
    }
}
