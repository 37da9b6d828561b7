use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use huddle_core::{ClientMessage, ConnectionId, ServerMessage};
use huddle_server::{ServerConfig, serve_on};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::utils::SIGNAL_TIMEOUT_MS;

/// A signaling server bound to an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("Failed to bind test listener")?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            if let Err(e) = serve_on(listener, ServerConfig::default()).await {
                tracing::error!("Test server stopped: {:?}", e);
            }
        });

        Ok(Self { addr, handle })
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// WebSocket client speaking the signaling protocol.
pub struct TestClient {
    pub id: ConnectionId,
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    /// Connects to `/ws` and reads the `welcome` greeting to learn its id.
    pub async fn connect(server: &TestServer) -> Result<Self> {
        Self::open(server.ws_url()).await
    }

    /// Connects to `/ws/{id}`.
    pub async fn connect_as(server: &TestServer, id: ConnectionId) -> Result<Self> {
        Self::open(format!("{}/{}", server.ws_url(), id)).await
    }

    async fn open(url: String) -> Result<Self> {
        let (socket, _) = connect_async(url.as_str())
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;

        let mut client = Self {
            id: ConnectionId::default(),
            socket,
        };

        match client.recv().await? {
            ServerMessage::Welcome { connection_id } => client.id = connection_id,
            other => anyhow::bail!("Expected welcome, got {:?}", other),
        }
        match client.recv().await? {
            ServerMessage::IceConfig { .. } => {}
            other => anyhow::bail!("Expected ice-config, got {:?}", other),
        }

        Ok(client)
    }

    pub async fn send(&mut self, msg: &ClientMessage) -> Result<()> {
        self.send_text(msg.encode()?).await
    }

    pub async fn send_text(&mut self, text: impl Into<String>) -> Result<()> {
        self.socket
            .send(Message::text(text.into()))
            .await
            .context("Failed to send frame")
    }

    pub async fn recv(&mut self) -> Result<ServerMessage> {
        loop {
            let frame = tokio::time::timeout(
                Duration::from_millis(SIGNAL_TIMEOUT_MS),
                self.socket.next(),
            )
            .await
            .context("Timeout waiting for frame")?
            .context("Socket closed")??;

            match frame {
                Message::Text(text) => return Ok(ServerMessage::decode(text.as_str())?),
                Message::Close(_) => anyhow::bail!("Socket closed by server"),
                _ => continue,
            }
        }
    }

    pub async fn close(mut self) -> Result<()> {
        self.socket.close(None).await.context("Failed to close socket")
    }
}
