use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::media::{LocalMedia, LocalTrack, TrackKind};
use crate::orchestrator::{EngineCommand, EngineEvent, Orchestrator, PeerUpdate};
use crate::relay::{Backoff, ReconnectionController, RelayConnector, WsConnector};
use crate::session::{RtcSessionFactory, SessionFactory};
use huddle_core::{ConnectionId, RoomId};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// A running participant: orchestrator plus relay supervision.
pub struct Engine {
    local_id: ConnectionId,
    events: mpsc::UnboundedSender<EngineEvent>,
    orchestrator: JoinHandle<()>,
    controller: JoinHandle<()>,
}

impl Engine {
    /// Starts a participant on the WebSocket relay and webrtc-rs sessions.
    pub fn connect(
        config: ClientConfig,
        media: LocalMedia,
    ) -> Result<(Self, mpsc::UnboundedReceiver<PeerUpdate>), ClientError> {
        let local_id = ConnectionId::new();
        let factory = Arc::new(RtcSessionFactory::new()?);
        let connector = Arc::new(WsConnector::new(&config.relay_url, local_id));

        Ok(Self::start(local_id, config, media, factory, connector))
    }

    /// Starts a participant on caller-supplied seams.
    pub fn start(
        local_id: ConnectionId,
        config: ClientConfig,
        media: LocalMedia,
        factory: Arc<dyn SessionFactory>,
        connector: Arc<dyn RelayConnector>,
    ) -> (Self, mpsc::UnboundedReceiver<PeerUpdate>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        let (orchestrator, updates) = Orchestrator::new(
            local_id,
            media,
            config.ice_servers.clone(),
            factory,
            Arc::new(outbound_tx),
            events_tx.clone(),
        );
        let controller = ReconnectionController::new(
            connector,
            outbound_rx,
            events_tx.clone(),
            Backoff::new(config.initial_backoff, config.max_backoff),
        );

        info!("Starting participant {}", local_id);
        let engine = Self {
            local_id,
            events: events_tx,
            orchestrator: tokio::spawn(orchestrator.run(events_rx)),
            controller: tokio::spawn(controller.run()),
        };

        (engine, updates)
    }

    pub fn local_id(&self) -> ConnectionId {
        self.local_id
    }

    pub fn join(&self, room: impl Into<RoomId>) -> Result<(), ClientError> {
        self.command(EngineCommand::Join(room.into()))
    }

    pub fn leave(&self) -> Result<(), ClientError> {
        self.command(EngineCommand::Leave)
    }

    /// Mutes or unmutes the local `kind` track. `false` if there is none.
    pub async fn set_track_enabled(&self, kind: TrackKind, enabled: bool) -> Result<bool, ClientError> {
        let (reply, rx) = oneshot::channel();
        self.command(EngineCommand::SetTrackEnabled {
            kind,
            enabled,
            reply,
        })?;
        rx.await.map_err(|_| ClientError::Stopped)
    }

    pub async fn replace_track(&self, track: LocalTrack) -> Result<(), ClientError> {
        let (reply, rx) = oneshot::channel();
        self.command(EngineCommand::ReplaceTrack { track, reply })?;
        Ok(rx.await.map_err(|_| ClientError::Stopped)??)
    }

    /// Leaves the room, releases local media and waits for both tasks.
    pub async fn shutdown(self) -> Result<(), ClientError> {
        self.command(EngineCommand::Shutdown)?;

        if let Err(e) = self.orchestrator.await {
            warn!("Orchestrator task failed: {}", e);
        }
        if let Err(e) = self.controller.await {
            warn!("Reconnection task failed: {}", e);
        }

        info!("Participant {} shut down", self.local_id);
        Ok(())
    }

    fn command(&self, command: EngineCommand) -> Result<(), ClientError> {
        self.events
            .send(EngineEvent::Command(command))
            .map_err(|_| ClientError::Stopped)
    }
}
