use anyhow::Result;
use clap::{Parser, Subcommand};
use huddle::model::IceServerConfig;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

mod join;
mod serve;

#[derive(Parser)]
#[command(name = "huddle", version, about = "Multi-party WebRTC signaling")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling server.
    Serve {
        #[arg(long, env = "HUDDLE_BIND", default_value = "0.0.0.0:3000")]
        bind: SocketAddr,

        /// Origin allowed to open the WebSocket. Any origin if unset.
        #[arg(long, env = "HUDDLE_ALLOWED_ORIGIN")]
        allowed_origin: Option<String>,

        #[command(flatten)]
        ice: IceArgs,
    },
    /// Join a room as a headless participant.
    Join {
        room: String,

        #[arg(long, env = "HUDDLE_RELAY_URL", default_value = "ws://127.0.0.1:3000")]
        relay_url: String,

        /// Publish a silent opus track.
        #[arg(long)]
        audio: bool,

        #[command(flatten)]
        ice: IceArgs,
    },
}

#[derive(clap::Args)]
struct IceArgs {
    /// Comma-separated STUN urls. Public STUN servers if unset.
    #[arg(long, env = "HUDDLE_ICE_SERVERS", value_delimiter = ',')]
    ice_servers: Vec<String>,

    #[arg(long, env = "TURN_URL")]
    turn_url: Option<String>,

    #[arg(long, env = "TURN_USERNAME")]
    turn_username: Option<String>,

    #[arg(long, env = "TURN_CREDENTIAL")]
    turn_credential: Option<String>,
}

impl IceArgs {
    fn into_servers(self) -> Vec<IceServerConfig> {
        let mut servers = Vec::new();

        let stun: Vec<String> = self
            .ice_servers
            .into_iter()
            .map(|url| url.trim().to_owned())
            .filter(|url| !url.is_empty())
            .collect();
        if !stun.is_empty() {
            servers.push(IceServerConfig {
                urls: stun,
                username: None,
                credential: None,
            });
        }

        if let Some(turn_url) = self.turn_url {
            servers.push(IceServerConfig {
                urls: vec![turn_url],
                username: self.turn_username,
                credential: self.turn_credential,
            });
        }

        if servers.is_empty() {
            huddle::utils::default_ice_servers()
        } else {
            servers
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Serve {
            bind,
            allowed_origin,
            ice,
        } => serve::run(bind, allowed_origin, ice.into_servers()).await,
        Commands::Join {
            room,
            relay_url,
            audio,
            ice,
        } => join::run(room, relay_url, audio, ice.into_servers()).await,
    }
}
