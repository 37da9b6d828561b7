use crate::media::TrackKind;
use huddle_core::{SdpType, SignalError};
use thiserror::Error;

/// Local media acquisition failures. Fatal to starting a call.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Permission to capture {0} was denied")]
    PermissionDenied(TrackKind),
    #[error("No {0} device found")]
    DeviceNotFound(TrackKind),
    #[error("Capture failed: {0}")]
    Capture(String),
}

#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("WebRTC error: {0}")]
    Rtc(#[from] webrtc::Error),
    #[error("Expected {expected:?} description, got {actual:?}")]
    UnexpectedDescription { expected: SdpType, actual: SdpType },
    #[error("No {0} track is attached")]
    NoSuchTrack(TrackKind),
    #[error("Session is closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Relay transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("Signal codec error: {0}")]
    Signal(#[from] SignalError),
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error(transparent)]
    Negotiation(#[from] NegotiationError),
    #[error("Engine stopped")]
    Stopped,
}
