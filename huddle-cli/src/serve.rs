use anyhow::Result;
use colored::*;
use huddle::model::IceServerConfig;
use huddle::server::{ServerConfig, serve};
use std::net::SocketAddr;

pub async fn run(
    bind: SocketAddr,
    allowed_origin: Option<String>,
    ice_servers: Vec<IceServerConfig>,
) -> Result<()> {
    println!("{}", "Starting huddle signaling server".green().bold());
    println!("   Bind:        {}", bind);
    println!(
        "   Origin:      {}",
        allowed_origin.as_deref().unwrap_or("*")
    );
    for server in &ice_servers {
        println!("   ICE server:  {}", server.urls.join(", "));
    }

    serve(ServerConfig {
        bind,
        allowed_origin,
        ice_servers,
    })
    .await
}
