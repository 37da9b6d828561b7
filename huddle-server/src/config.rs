use huddle_core::IceServerConfig;
use huddle_core::utils::default_ice_servers;
use std::net::SocketAddr;

/// Signaling server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Origin allowed for cross-origin WebSocket upgrades. `None` or `"*"`
    /// allows any origin.
    pub allowed_origin: Option<String>,
    /// Handed to every client in its `ice-config` greeting.
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
            allowed_origin: None,
            ice_servers: default_ice_servers(),
        }
    }
}
