use crate::error::MediaError;
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info};
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Audio => write!(f, "audio"),
            Self::Video => write!(f, "video"),
        }
    }
}

/// An outgoing track plus its local mute flag.
///
/// Clones share the flag, so muting through any handle mutes every peer the
/// track is attached to.
#[derive(Clone)]
pub struct LocalTrack {
    kind: TrackKind,
    track: Arc<TrackLocalStaticSample>,
    enabled: Arc<AtomicBool>,
}

impl LocalTrack {
    pub fn new(kind: TrackKind, track: Arc<TrackLocalStaticSample>) -> Self {
        Self {
            kind,
            track,
            enabled: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Opus track.
    pub fn audio(stream_id: &str) -> Self {
        let codec = RTCRtpCodecCapability {
            mime_type: MIME_TYPE_OPUS.to_owned(),
            clock_rate: 48000,
            channels: 2,
            ..Default::default()
        };
        let track = TrackLocalStaticSample::new(codec, "audio".to_owned(), stream_id.to_owned());
        Self::new(TrackKind::Audio, Arc::new(track))
    }

    /// VP8 track.
    pub fn video(stream_id: &str) -> Self {
        let codec = RTCRtpCodecCapability {
            mime_type: MIME_TYPE_VP8.to_owned(),
            clock_rate: 90000,
            ..Default::default()
        };
        let track = TrackLocalStaticSample::new(codec, "video".to_owned(), stream_id.to_owned());
        Self::new(TrackKind::Video, Arc::new(track))
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn rtc_track(&self) -> Arc<TrackLocalStaticSample> {
        self.track.clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    /// Writes one encoded frame. Muted tracks swallow frames.
    pub async fn write_frame(&self, data: Bytes, duration: Duration) -> Result<(), MediaError> {
        if !self.is_enabled() {
            return Ok(());
        }

        let sample = Sample {
            data,
            duration,
            ..Default::default()
        };
        self.track
            .write_sample(&sample)
            .await
            .map_err(|e| MediaError::Capture(e.to_string()))
    }
}

/// Tracks the local participant publishes, at most one per kind.
#[derive(Clone, Default)]
pub struct LocalMedia {
    tracks: Vec<LocalTrack>,
}

impl LocalMedia {
    pub fn new(tracks: Vec<LocalTrack>) -> Self {
        let mut media = Self::default();
        for track in tracks {
            media.replace(track);
        }
        media
    }

    pub fn tracks(&self) -> &[LocalTrack] {
        &self.tracks
    }

    pub fn track(&self, kind: TrackKind) -> Option<&LocalTrack> {
        self.tracks.iter().find(|t| t.kind() == kind)
    }

    /// Flips the mute flag of the `kind` track. Returns `false` if there is none.
    pub fn set_enabled(&self, kind: TrackKind, enabled: bool) -> bool {
        match self.track(kind) {
            Some(track) => {
                track.set_enabled(enabled);
                debug!("Local {} track enabled={}", kind, enabled);
                true
            }
            None => false,
        }
    }

    /// Puts `track` in its kind's slot, returning the previous occupant.
    pub fn replace(&mut self, track: LocalTrack) -> Option<LocalTrack> {
        match self.tracks.iter_mut().find(|t| t.kind() == track.kind()) {
            Some(slot) => Some(std::mem::replace(slot, track)),
            None => {
                self.tracks.push(track);
                None
            }
        }
    }

    /// Mutes and drops every track.
    pub fn release(&mut self) {
        for track in self.tracks.drain(..) {
            track.set_enabled(false);
        }
        info!("Local media released");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

/// Where local tracks come from. Capture itself lives behind this seam.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn acquire(&self, constraints: MediaConstraints) -> Result<LocalMedia, MediaError>;
}

/// Hands out fresh sample-fed tracks for the kinds it was built with.
pub struct StaticMediaSource {
    stream_id: String,
    audio: bool,
    video: bool,
    denied: Vec<TrackKind>,
}

impl StaticMediaSource {
    pub fn new(stream_id: impl Into<String>, audio: bool, video: bool) -> Self {
        Self {
            stream_id: stream_id.into(),
            audio,
            video,
            denied: Vec::new(),
        }
    }

    /// Refuses capture of `kind` as if the user declined the prompt.
    pub fn deny(mut self, kind: TrackKind) -> Self {
        self.denied.push(kind);
        self
    }

    fn check(&self, kind: TrackKind, available: bool) -> Result<(), MediaError> {
        if self.denied.contains(&kind) {
            return Err(MediaError::PermissionDenied(kind));
        }
        if !available {
            return Err(MediaError::DeviceNotFound(kind));
        }
        Ok(())
    }
}

#[async_trait]
impl MediaSource for StaticMediaSource {
    async fn acquire(&self, constraints: MediaConstraints) -> Result<LocalMedia, MediaError> {
        let mut tracks = Vec::new();

        if constraints.audio {
            self.check(TrackKind::Audio, self.audio)?;
            tracks.push(LocalTrack::audio(&self.stream_id));
        }
        if constraints.video {
            self.check(TrackKind::Video, self.video)?;
            tracks.push(LocalTrack::video(&self.stream_id));
        }

        Ok(LocalMedia::new(tracks))
    }
}
