use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use dashmap::DashMap;
use huddle_core::{ConnectionId, ServerMessage};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{error, info};

struct Session {
    generation: u64,
    tx: mpsc::UnboundedSender<ServerMessage>,
}

/// Live transport handles keyed by connection id.
///
/// A connection id may be registered again (a client reconnecting under the
/// same id); the newer registration wins and the older transport can no
/// longer unregister it.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<ConnectionId, Session>,
    next_generation: AtomicU64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the generation that must be presented to [`Self::unregister`].
    pub fn register(&self, id: ConnectionId, tx: mpsc::UnboundedSender<ServerMessage>) -> u64 {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;

        if let Some(previous) = self.sessions.insert(id, Session { generation, tx }) {
            info!(
                "Connection {} re-registered (generation {} replaces {})",
                id, generation, previous.generation
            );
        }

        generation
    }

    /// Removes the registration if `generation` is still the current one.
    pub fn unregister(&self, id: &ConnectionId, generation: u64) -> bool {
        self.sessions
            .remove_if(id, |_, session| session.generation == generation)
            .is_some()
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn send(&self, id: &ConnectionId, msg: ServerMessage) -> bool {
        let Some(session) = self.sessions.get(id) else {
            return false;
        };

        if let Err(e) = session.tx.send(msg) {
            error!("Failed to queue message for {}: {}", id, e);
            return false;
        }
        true
    }
}

#[async_trait]
impl SignalingOutput for SessionRegistry {
    async fn send_signal(&self, to: ConnectionId, msg: ServerMessage) -> bool {
        self.send(&to, msg)
    }
}
