mod backoff;
mod reconnect;
mod ws_connector;

pub use backoff::*;
pub use reconnect::*;
pub use ws_connector::*;

use crate::error::ClientError;
use async_trait::async_trait;
use huddle_core::{ClientMessage, ServerMessage};

/// Opens connections to the signaling relay.
#[async_trait]
pub trait RelayConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn RelayChannel>, ClientError>;
}

/// One live relay connection.
#[async_trait]
pub trait RelayChannel: Send {
    async fn send(&mut self, msg: &ClientMessage) -> Result<(), ClientError>;

    /// Next decodable message, `None` once the connection is gone.
    async fn recv(&mut self) -> Option<ServerMessage>;

    async fn close(&mut self);
}
