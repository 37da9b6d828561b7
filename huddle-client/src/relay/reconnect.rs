use crate::orchestrator::EngineEvent;
use crate::relay::{Backoff, RelayChannel, RelayConnector};
use huddle_core::{ClientMessage, RoomId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Keeps exactly one relay connection alive and restores room membership
/// after every reconnect.
///
/// Stops once every sender of the outbound queue is dropped.
pub struct ReconnectionController {
    connector: Arc<dyn RelayConnector>,
    outbound: mpsc::UnboundedReceiver<ClientMessage>,
    events: mpsc::UnboundedSender<EngineEvent>,
    backoff: Backoff,
    room: Option<RoomId>,
}

enum SessionEnd {
    Lost,
    Shutdown,
}

impl ReconnectionController {
    pub fn new(
        connector: Arc<dyn RelayConnector>,
        outbound: mpsc::UnboundedReceiver<ClientMessage>,
        events: mpsc::UnboundedSender<EngineEvent>,
        backoff: Backoff,
    ) -> Self {
        Self {
            connector,
            outbound,
            events,
            backoff,
            room: None,
        }
    }

    pub async fn run(mut self) {
        loop {
            let Some(mut channel) = self.connect().await else {
                break;
            };

            self.backoff.reset();
            self.discard_queued();
            if self.events.send(EngineEvent::RelayConnected).is_err() {
                channel.close().await;
                break;
            }

            if let Some(room) = self.room.clone() {
                info!("Rejoining room {}", room);
                if let Err(e) = channel.send(&ClientMessage::JoinRoom { room_id: room }).await {
                    warn!("Failed to rejoin: {}", e);
                }
            }

            match self.pump(channel.as_mut()).await {
                SessionEnd::Shutdown => {
                    channel.close().await;
                    break;
                }
                SessionEnd::Lost => {
                    warn!("Relay connection lost");
                    if self.events.send(EngineEvent::RelayDisconnected).is_err() {
                        break;
                    }
                }
            }
        }

        info!("Reconnection controller stopped");
    }

    /// Retries until connected. `None` on shutdown.
    async fn connect(&mut self) -> Option<Box<dyn RelayChannel>> {
        loop {
            match self.connector.connect().await {
                Ok(channel) => return Some(channel),
                Err(e) => {
                    let delay = self.backoff.next_delay();
                    warn!("Relay connect failed: {}. Retrying in {:?}", e, delay);

                    let sleep = tokio::time::sleep(delay);
                    tokio::pin!(sleep);
                    loop {
                        tokio::select! {
                            _ = &mut sleep => break,
                            msg = self.outbound.recv() => match msg {
                                Some(msg) => self.drop_offline(msg),
                                None => return None,
                            },
                        }
                    }
                }
            }
        }
    }

    async fn pump(&mut self, channel: &mut dyn RelayChannel) -> SessionEnd {
        loop {
            tokio::select! {
                inbound = channel.recv() => match inbound {
                    Some(msg) => {
                        if self.events.send(EngineEvent::Relay(msg)).is_err() {
                            return SessionEnd::Shutdown;
                        }
                    }
                    None => return SessionEnd::Lost,
                },
                outbound = self.outbound.recv() => match outbound {
                    Some(msg) => {
                        self.track_room(&msg);
                        if let Err(e) = channel.send(&msg).await {
                            warn!("Relay send failed: {}", e);
                            return SessionEnd::Lost;
                        }
                    }
                    None => return SessionEnd::Shutdown,
                },
            }
        }
    }

    /// Drops what piled up while offline; only room membership survives.
    fn discard_queued(&mut self) {
        while let Ok(msg) = self.outbound.try_recv() {
            self.drop_offline(msg);
        }
    }

    fn drop_offline(&mut self, msg: ClientMessage) {
        if !self.track_room(&msg) {
            debug!("Relay offline, dropping {:?}", msg);
        }
    }

    /// Returns `true` for membership messages.
    fn track_room(&mut self, msg: &ClientMessage) -> bool {
        match msg {
            ClientMessage::JoinRoom { room_id } => {
                self.room = Some(room_id.clone());
                true
            }
            ClientMessage::LeaveRoom { room_id } => {
                if self.room.as_ref() == Some(room_id) {
                    self.room = None;
                }
                true
            }
            _ => false,
        }
    }
}
