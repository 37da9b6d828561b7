use anyhow::{Context, Result};
use bytes::Bytes;
use colored::*;
use huddle::client::{
    ClientConfig, Engine, LocalMedia, MediaConstraints, MediaSource, PeerUpdate,
    StaticMediaSource, TrackKind,
};
use huddle::model::IceServerConfig;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::warn;

const FRAME: Duration = Duration::from_millis(20);
/// One 20ms opus frame of silence.
const OPUS_SILENCE: [u8; 3] = [0xf8, 0xff, 0xfe];

pub async fn run(
    room: String,
    relay_url: String,
    audio: bool,
    ice_servers: Vec<IceServerConfig>,
) -> Result<()> {
    let media = if audio {
        StaticMediaSource::new("huddle-cli", true, false)
            .acquire(MediaConstraints {
                audio: true,
                video: false,
            })
            .await
            .context("Failed to acquire local audio")?
    } else {
        LocalMedia::default()
    };
    let pump = audio_pump(&media);

    let config = ClientConfig {
        relay_url,
        ice_servers,
        ..Default::default()
    };
    println!(
        "{} {} via {}",
        "Joining".green().bold(),
        room.bold(),
        config.relay_url
    );

    let (engine, mut updates) = Engine::connect(config, media).context("Failed to start participant")?;
    println!("   Local id: {}", engine.local_id().to_string().cyan());
    engine.join(room.as_str())?;

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Some(update) => print_update(&update),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                println!("{}", "Leaving...".yellow());
                break;
            }
        }
    }

    if let Some(pump) = pump {
        pump.abort();
    }
    engine.shutdown().await.context("Failed to shut down cleanly")?;
    println!("{}", "Bye".green().bold());
    Ok(())
}

/// Feeds silence into the audio track so peers see packets flowing.
fn audio_pump(media: &LocalMedia) -> Option<JoinHandle<()>> {
    let track = media.track(TrackKind::Audio)?.clone();

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(FRAME);
        loop {
            ticker.tick().await;
            if let Err(e) = track
                .write_frame(Bytes::from_static(&OPUS_SILENCE), FRAME)
                .await
            {
                warn!("Audio pump stopped: {}", e);
                break;
            }
        }
    }))
}

fn print_update(update: &PeerUpdate) {
    match update {
        PeerUpdate::PeerAdded(peer) => println!("{} {}", "+".green().bold(), peer),
        PeerUpdate::StateChanged { peer, state } => {
            println!("  {} {:?}", peer.to_string().dimmed(), state)
        }
        PeerUpdate::RemoteStream { peer, stream } => println!(
            "  {} stream {} ({} tracks)",
            peer.to_string().dimmed(),
            stream.id,
            stream.tracks.len()
        ),
        PeerUpdate::PeerFailed(peer) => {
            println!("{} {} unreachable after ICE restart", "!".red().bold(), peer)
        }
        PeerUpdate::NegotiationFailed { peer, reason } => {
            println!("{} {}: {}", "!".red().bold(), peer, reason)
        }
        PeerUpdate::PeerRemoved(peer) => println!("{} {}", "-".yellow().bold(), peer),
    }
}
