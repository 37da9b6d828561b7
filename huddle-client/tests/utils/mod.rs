
pub use mock_connector::*;
pub use mock_relay::*;
pub use mock_session::*;

use huddle_core::ConnectionId;
use uuid::Uuid;

/// Deterministic id; order follows `n`.
pub fn id(n: u128) -> ConnectionId {
    ConnectionId(Uuid::from_u128(n))
}
