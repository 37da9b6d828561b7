use huddle_core::ServerMessage;
use tracing::{info, warn};

use crate::orchestrator::Orchestrator;

impl Orchestrator {
    pub(super) async fn handle_signal(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::Welcome { connection_id } => {
                if connection_id == self.local_id {
                    info!("Received Welcome as {}", connection_id);
                } else {
                    warn!(
                        "Relay greeted us as {} but we are {}",
                        connection_id, self.local_id
                    );
                }
            }

            ServerMessage::IceConfig { ice_servers } => {
                info!("Received ICE Config: {} servers", ice_servers.len());
                if !ice_servers.is_empty() {
                    self.ice_servers = ice_servers;
                }
            }

            ServerMessage::RoomUsers { users } => self.handle_room_users(users).await,

            ServerMessage::UserJoined { user_id } => self.handle_user_joined(user_id).await,

            ServerMessage::UserLeft { user_id } => self.close_peer(user_id, "left the room").await,

            ServerMessage::Offer {
                offer,
                from,
                restart,
            } => self.handle_remote_offer(from, offer, restart).await,

            ServerMessage::Answer { answer, from } => self.handle_remote_answer(from, answer).await,

            ServerMessage::IceCandidate { candidate, from } => {
                self.handle_remote_candidate(from, candidate).await
            }
        }
    }
}
