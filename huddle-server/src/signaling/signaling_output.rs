use async_trait::async_trait;
use huddle_core::{ConnectionId, ServerMessage};

/// Delivery side of the relay: whatever owns the live transport handles.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Queue `msg` for `to`. Returns `false` when `to` is no longer registered.
    async fn send_signal(&self, to: ConnectionId, msg: ServerMessage) -> bool;
}
