
use huddle_client::{Backoff, EngineEvent, ReconnectionController};
use huddle_core::ClientMessage;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::utils::{ChannelHandle, MockConnector};

pub const STEP: Duration = Duration::from_millis(100);

/// A running controller over a [`MockConnector`].
pub struct Controller {
    pub connector: Arc<MockConnector>,
    pub handles: mpsc::UnboundedReceiver<ChannelHandle>,
    pub outbound: mpsc::UnboundedSender<ClientMessage>,
    pub events: mpsc::UnboundedReceiver<EngineEvent>,
    pub task: JoinHandle<()>,
}

impl Controller {
    pub fn start(fail_first: usize, max_backoff: Duration) -> Self {
        let (connector, handles) = MockConnector::new(fail_first);
        let connector = Arc::new(connector);
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (events_tx, events) = mpsc::unbounded_channel();

        let controller = ReconnectionController::new(
            connector.clone(),
            outbound_rx,
            events_tx,
            Backoff::new(STEP, max_backoff),
        );

        Self {
            connector,
            handles,
            outbound,
            events,
            task: tokio::spawn(controller.run()),
        }
    }

    pub async fn accepted(&mut self) -> ChannelHandle {
        self.handles.recv().await.expect("Controller stopped connecting")
    }

    pub fn send(&self, msg: ClientMessage) {
        self.outbound.send(msg).expect("Controller is gone");
    }

    /// Next connectivity event, skipping relayed messages.
    pub async fn next_link_event(&mut self) -> &'static str {
        loop {
            match self.events.recv().await.expect("Controller is gone") {
                EngineEvent::RelayConnected => return "connected",
                EngineEvent::RelayDisconnected => return "disconnected",
                _ => continue,
            }
        }
    }
}
