use crate::room::RoomManager;
use crate::signaling::SignalingOutput;
use huddle_core::{ClientMessage, ConnectionId, RoomId, ServerMessage};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Forwards point-to-point negotiation messages and fans out membership
/// notifications to the recipients the [`RoomManager`] computed.
#[derive(Clone)]
pub struct MessageRelay {
    rooms: RoomManager,
    output: Arc<dyn SignalingOutput>,
}

impl MessageRelay {
    pub fn new(rooms: RoomManager, output: Arc<dyn SignalingOutput>) -> Self {
        Self { rooms, output }
    }

    pub fn rooms(&self) -> &RoomManager {
        &self.rooms
    }

    pub async fn handle_message(&self, from: ConnectionId, msg: ClientMessage) {
        match msg {
            ClientMessage::JoinRoom { room_id } => self.join(from, room_id).await,
            ClientMessage::LeaveRoom { room_id } => self.leave(from, room_id).await,
            other => self.forward(from, other).await,
        }
    }

    /// Transport-close cleanup: drop `connection` from all its rooms and tell
    /// the members left behind.
    pub async fn handle_disconnect(&self, connection: ConnectionId) {
        for (room_id, remaining) in self.rooms.remove_everywhere(connection) {
            info!("{} disconnected from room {}", connection, room_id);
            self.broadcast(&remaining, ServerMessage::UserLeft { user_id: connection })
                .await;
        }
    }

    async fn join(&self, from: ConnectionId, room_id: RoomId) {
        let outcome = self.rooms.join(from, &room_id);
        info!(
            "{} joined room {} ({} already present)",
            from,
            room_id,
            outcome.existing.len()
        );

        self.output
            .send_signal(
                from,
                ServerMessage::RoomUsers {
                    users: outcome.existing.clone(),
                },
            )
            .await;

        if outcome.newly_joined {
            self.broadcast(&outcome.existing, ServerMessage::UserJoined { user_id: from })
                .await;
        }
    }

    async fn leave(&self, from: ConnectionId, room_id: RoomId) {
        let Some(remaining) = self.rooms.leave(from, &room_id) else {
            debug!("{} asked to leave room {} it is not in", from, room_id);
            return;
        };

        info!("{} left room {}", from, room_id);
        self.broadcast(&remaining, ServerMessage::UserLeft { user_id: from })
            .await;
    }

    async fn forward(&self, from: ConnectionId, msg: ClientMessage) {
        let Some(to) = msg.target() else {
            return;
        };

        if to == from {
            warn!("Dropping self-addressed signal from {}", from);
            return;
        }

        let Some(relayed) = msg.into_relayed(from) else {
            return;
        };

        if !self.output.send_signal(to, relayed).await {
            debug!("Dropping signal from {}: target {} is gone", from, to);
        }
    }

    async fn broadcast(&self, recipients: &[ConnectionId], msg: ServerMessage) {
        for recipient in recipients {
            self.output.send_signal(*recipient, msg.clone()).await;
        }
    }
}
