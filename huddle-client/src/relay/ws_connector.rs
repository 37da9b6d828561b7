use crate::error::ClientError;
use crate::relay::{RelayChannel, RelayConnector};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use huddle_core::{ClientMessage, ConnectionId, ServerMessage};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

/// Connects to `{relay_url}/ws/{local_id}` so reconnects keep the same id.
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(relay_url: &str, local_id: ConnectionId) -> Self {
        Self {
            url: format!("{}/ws/{}", relay_url.trim_end_matches('/'), local_id),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RelayConnector for WsConnector {
    async fn connect(&self) -> Result<Box<dyn RelayChannel>, ClientError> {
        let (socket, _) = connect_async(self.url.as_str()).await?;
        info!("Connected to relay at {}", self.url);
        Ok(Box::new(WsChannel { socket }))
    }
}

struct WsChannel {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl RelayChannel for WsChannel {
    async fn send(&mut self, msg: &ClientMessage) -> Result<(), ClientError> {
        let json = msg.encode()?;
        self.socket.send(Message::text(json)).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Option<ServerMessage> {
        while let Some(frame) = self.socket.next().await {
            match frame {
                Ok(Message::Text(text)) => match ServerMessage::decode(text.as_str()) {
                    Ok(msg) => return Some(msg),
                    Err(e) => warn!("JSON Error: {}. Text: {}", e, text.as_str()),
                },
                Ok(Message::Close(frame)) => {
                    debug!("Relay closed the connection: {:?}", frame);
                    return None;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Relay transport error: {}", e);
                    return None;
                }
            }
        }
        None
    }

    async fn close(&mut self) {
        if let Err(e) = self.socket.close(None).await {
            debug!("Error closing relay socket: {}", e);
        }
    }
}
