pub mod engine_tests;
pub mod reconnect_tests;

use huddle_client::{
    EngineCommand, EngineEvent, LocalMedia, LocalTrack, Orchestrator, PeerState, PeerUpdate,
    SessionEvent,
};
use huddle_core::{ClientMessage, ConnectionId, ServerMessage};
use huddle_core::utils::default_ice_servers;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Level;

use crate::utils::{MockFactory, MockSession, RecordingRelay};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn audio_only() -> LocalMedia {
    LocalMedia::new(vec![LocalTrack::audio("local")])
}

/// An orchestrator driven by hand: every event is applied inline and session
/// events are pumped until the queue is empty.
pub struct Harness {
    pub orchestrator: Orchestrator,
    pub events: mpsc::UnboundedReceiver<EngineEvent>,
    pub updates: mpsc::UnboundedReceiver<PeerUpdate>,
    pub factory: MockFactory,
    pub relay: RecordingRelay,
}

impl Harness {
    pub fn new(local_id: ConnectionId, media: LocalMedia) -> Self {
        let (events_tx, events) = mpsc::unbounded_channel();
        let factory = MockFactory::new();
        let relay = RecordingRelay::new();

        let (orchestrator, updates) = Orchestrator::new(
            local_id,
            media,
            default_ice_servers(),
            Arc::new(factory.clone()),
            Arc::new(relay.clone()),
            events_tx,
        );

        Self {
            orchestrator,
            events,
            updates,
            factory,
            relay,
        }
    }

    /// Harness that already joined `r1`, with its join message consumed.
    pub async fn in_room(local_id: ConnectionId, media: LocalMedia) -> Self {
        let mut harness = Self::new(local_id, media);
        harness.command(EngineCommand::Join("r1".into())).await;
        harness.relay.take();
        harness
    }

    pub async fn command(&mut self, command: EngineCommand) -> bool {
        let running = self
            .orchestrator
            .handle_event(EngineEvent::Command(command))
            .await;
        self.pump().await;
        running
    }

    pub async fn signal(&mut self, msg: ServerMessage) {
        self.orchestrator.handle_event(EngineEvent::Relay(msg)).await;
        self.pump().await;
    }

    /// Applies queued session events until none are left.
    pub async fn pump(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.orchestrator.handle_event(event).await;
        }
    }

    /// Emits `event` from the current session of `peer`.
    pub async fn session_event(&mut self, peer: ConnectionId, event: SessionEvent) {
        self.session(peer).await.emit(event);
        self.pump().await;
    }

    pub async fn session(&self, peer: ConnectionId) -> Arc<MockSession> {
        self.factory
            .latest(peer)
            .await
            .expect("No session was created for peer")
    }

    pub fn state(&self, peer: ConnectionId) -> Option<PeerState> {
        self.orchestrator.peer(&peer).map(|link| link.state())
    }

    pub fn sent(&self) -> Vec<ClientMessage> {
        self.relay.take()
    }

    pub fn drain_updates(&mut self) -> Vec<PeerUpdate> {
        let mut updates = Vec::new();
        while let Ok(update) = self.updates.try_recv() {
            updates.push(update);
        }
        updates
    }

    /// Brings the link to `peer` to `Connected` with this side as offerer.
    pub async fn connect_as_offerer(&mut self, peer: ConnectionId) {
        self.signal(ServerMessage::UserJoined { user_id: peer }).await;
        self.signal(ServerMessage::Answer {
            answer: huddle_core::SessionDescription::answer("v=0 answer"),
            from: peer,
        })
        .await;
        assert_eq!(self.state(peer), Some(PeerState::Connected));
        self.relay.take();
        self.drain_updates();
    }

    /// Brings the link to `peer` to `Connected` with this side as answerer.
    pub async fn connect_as_answerer(&mut self, peer: ConnectionId) {
        self.signal(ServerMessage::Offer {
            offer: huddle_core::SessionDescription::offer("v=0 offer"),
            from: peer,
            restart: false,
        })
        .await;
        assert_eq!(self.state(peer), Some(PeerState::Connected));
        self.relay.take();
        self.drain_updates();
    }
}
