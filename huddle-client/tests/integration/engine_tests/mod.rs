
use huddle_client::{ClientConfig, Engine, PeerUpdate, WsConnector};
use huddle_core::ConnectionId;
use huddle_server::{ServerConfig, serve_on};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::integration::audio_only;
use crate::utils::{MockFactory, id};

pub const UPDATE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct LocalRelay {
    pub addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl LocalRelay {
    pub async fn start() -> anyhow::Result<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            if let Err(e) = serve_on(listener, ServerConfig::default()).await {
                tracing::error!("Relay stopped: {:?}", e);
            }
        });
        Ok(Self { addr, handle })
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }
}

impl Drop for LocalRelay {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Engine on mock sessions over a real relay.
pub struct Participant {
    pub engine: Engine,
    pub updates: mpsc::UnboundedReceiver<PeerUpdate>,
    pub factory: MockFactory,
}

impl Participant {
    pub fn start(relay: &LocalRelay, n: u128) -> Self {
        let local_id: ConnectionId = id(n);
        let config = ClientConfig {
            relay_url: relay.url(),
            initial_backoff: Duration::from_millis(20),
            max_backoff: Duration::from_millis(200),
            ..Default::default()
        };
        let factory = MockFactory::new();
        let connector = Arc::new(WsConnector::new(&config.relay_url, local_id));

        let (engine, updates) = Engine::start(
            local_id,
            config,
            audio_only(),
            Arc::new(factory.clone()),
            connector,
        );

        Self {
            engine,
            updates,
            factory,
        }
    }

    /// Waits for the first update matching `pred`, skipping the rest.
    pub async fn wait_for(&mut self, pred: impl Fn(&PeerUpdate) -> bool) -> PeerUpdate {
        tokio::time::timeout(UPDATE_TIMEOUT, async {
            loop {
                let update = self.updates.recv().await.expect("Engine stopped");
                tracing::debug!("[{}] {:?}", self.engine.local_id(), update);
                if pred(&update) {
                    return update;
                }
            }
        })
        .await
        .expect("Timed out waiting for a peer update")
    }
}
