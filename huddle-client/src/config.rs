use huddle_core::IceServerConfig;
use huddle_core::utils::default_ice_servers;
use std::time::Duration;

/// Participant settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the signaling server, e.g. `ws://127.0.0.1:3000`.
    pub relay_url: String,
    /// Used until the server's `ice-config` greeting replaces it.
    pub ice_servers: Vec<IceServerConfig>,
    /// First reconnect delay; doubles per failed attempt.
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay_url: "ws://127.0.0.1:3000".to_string(),
            ice_servers: default_ice_servers(),
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
        }
    }
}
