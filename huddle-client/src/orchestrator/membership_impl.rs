use huddle_core::{ClientMessage, ConnectionId, RoomId};
use std::collections::HashSet;
use tracing::{debug, info};

use crate::orchestrator::Orchestrator;
use crate::peer_link::PeerState;

impl Orchestrator {
    pub(super) async fn join_room(&mut self, room: RoomId) {
        if let Some(current) = &self.room {
            if *current == room {
                debug!("Already in room {}, asking for the roster again", room);
                self.relay.send(ClientMessage::JoinRoom { room_id: room });
                return;
            }
            self.leave_room().await;
        }

        info!("Joining room {}", room);
        self.room = Some(room.clone());
        self.relay.send(ClientMessage::JoinRoom { room_id: room });
    }

    pub(super) async fn leave_room(&mut self) {
        let Some(room) = self.room.take() else {
            return;
        };

        for peer in self.peer_ids() {
            self.close_peer(peer, "leaving room").await;
        }

        self.relay.send(ClientMessage::LeaveRoom {
            room_id: room.clone(),
        });
        info!("Left room {}", room);
    }

    /// Reconciles links with the roster: links to listed peers are kept,
    /// links to anyone else are closed. Newly listed peers get a passive link
    /// and are expected to send the offer.
    pub(super) async fn handle_room_users(&mut self, users: Vec<ConnectionId>) {
        if !self.in_room() {
            debug!("Not in a room, ignoring roster");
            return;
        }

        let listed: HashSet<ConnectionId> = users
            .into_iter()
            .filter(|id| *id != self.local_id)
            .collect();

        let absent: Vec<ConnectionId> = self
            .peer_ids()
            .into_iter()
            .filter(|id| !listed.contains(id))
            .collect();
        for peer in absent {
            self.close_peer(peer, "absent from roster").await;
        }

        let mut listed: Vec<ConnectionId> = listed.into_iter().collect();
        listed.sort();
        for peer in listed {
            if self.ensure_peer(peer) {
                debug!("Waiting for an offer from {}", peer);
            }
        }

        info!("Room roster has {} peers", self.peers.len());

        if std::mem::take(&mut self.resync_pending) {
            self.resume_negotiations().await;
        }
    }

    /// Re-sends offers that may have been dropped while the relay was down.
    /// Settled links are left alone.
    async fn resume_negotiations(&mut self) {
        for peer in self.peer_ids() {
            let Some(link) = self.peers.get(&peer) else {
                continue;
            };

            match link.state() {
                PeerState::OfferSent => {
                    info!("Offer to {} may have been lost, sending it again", peer);
                    self.init_connection(peer, false).await;
                }
                PeerState::Restarting => {
                    info!("Restart offer to {} may have been lost, restarting again", peer);
                    self.restart(peer).await;
                }
                state if link.restart_pending() => {
                    debug!("{} recovered as {:?} without an answer, restarting again", peer, state);
                    self.restart(peer).await;
                }
                _ => {}
            }
        }
    }

    pub(super) async fn handle_user_joined(&mut self, peer: ConnectionId) {
        if !self.in_room() || peer == self.local_id {
            return;
        }

        let fresh = !self.ensure_peer(peer);
        if fresh {
            info!("{} joined again, renegotiating from scratch", peer);
        } else {
            info!("{} joined, initiating connection", peer);
        }

        self.init_connection(peer, fresh).await;
    }
}
