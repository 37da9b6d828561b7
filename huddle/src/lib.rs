pub use huddle_core::model::{ConnectionId, RoomId};

pub mod model {
    pub use huddle_core::model::*;
    pub use huddle_core::SignalError;
}

pub mod utils {
    pub use huddle_core::utils::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use huddle_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use huddle_client::*;
}
