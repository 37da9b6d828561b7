mod config;
mod engine;
mod error;
mod media;
mod orchestrator;
mod peer_link;
mod relay;
mod session;

pub use config::*;
pub use engine::*;
pub use error::*;
pub use media::*;
pub use orchestrator::*;
pub use peer_link::*;
pub use relay::*;
pub use session::*;
