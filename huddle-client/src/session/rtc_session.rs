use crate::error::NegotiationError;
use crate::media::{LocalTrack, TrackKind};
use crate::session::{
    Connectivity, NegotiationSession, RemoteTrack, SessionEvent, SessionEvents, SessionFactory,
};
use async_trait::async_trait;
use huddle_core::{IceCandidate, IceServerConfig, SdpType, SessionDescription};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::{API, APIBuilder};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::offer_answer_options::RTCOfferOptions;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

/// Builds webrtc-rs peer connections sharing one media engine.
pub struct RtcSessionFactory {
    api: API,
}

impl RtcSessionFactory {
    pub fn new() -> Result<Self, NegotiationError> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        Ok(Self { api })
    }
}

#[async_trait]
impl SessionFactory for RtcSessionFactory {
    async fn create(
        &self,
        ice_servers: &[IceServerConfig],
        events: SessionEvents,
    ) -> Result<Arc<dyn NegotiationSession>, NegotiationError> {
        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(self.api.new_peer_connection(rtc_config).await?);
        install_callbacks(&peer_connection, &events);

        Ok(Arc::new(RtcSession {
            peer_connection,
            senders: Mutex::new(HashMap::new()),
        }))
    }
}

fn install_callbacks(peer_connection: &RTCPeerConnection, events: &SessionEvents) {
    let state_events = events.clone();
    peer_connection.on_peer_connection_state_change(Box::new(
        move |s: RTCPeerConnectionState| {
            let events = state_events.clone();
            Box::pin(async move {
                info!("Peer Connection State changed for {}: {:?}", events.peer(), s);
                let connectivity = match s {
                    RTCPeerConnectionState::Unspecified | RTCPeerConnectionState::New => {
                        Connectivity::New
                    }
                    RTCPeerConnectionState::Connecting => Connectivity::Connecting,
                    RTCPeerConnectionState::Connected => Connectivity::Connected,
                    RTCPeerConnectionState::Disconnected => Connectivity::Disconnected,
                    RTCPeerConnectionState::Failed => Connectivity::Failed,
                    RTCPeerConnectionState::Closed => Connectivity::Closed,
                };
                events.emit(SessionEvent::Connectivity(connectivity));
            })
        },
    ));

    let ice_events = events.clone();
    peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
        let events = ice_events.clone();
        Box::pin(async move {
            let Some(candidate) = c else { return };
            let Ok(init) = candidate.to_json() else {
                return;
            };
            events.emit(SessionEvent::LocalCandidate(IceCandidate {
                candidate: init.candidate,
                sdp_mid: init.sdp_mid,
                sdp_m_line_index: init.sdp_mline_index,
                username_fragment: init.username_fragment,
            }));
        })
    }));

    let track_events = events.clone();
    peer_connection.on_track(Box::new(
        move |track: Arc<TrackRemote>,
              _receiver: Arc<RTCRtpReceiver>,
              _transceiver: Arc<RTCRtpTransceiver>| {
            let events = track_events.clone();
            Box::pin(async move {
                let kind = match track.kind() {
                    RTPCodecType::Video => TrackKind::Video,
                    _ => TrackKind::Audio,
                };
                debug!("Remote {} track {} from {}", kind, track.id(), events.peer());
                events.emit(SessionEvent::RemoteTrack(RemoteTrack {
                    stream_id: track.stream_id(),
                    track_id: track.id(),
                    kind,
                }));

                // Nothing renders here; drain so the receive buffers never fill.
                tokio::spawn(async move { while track.read_rtp().await.is_ok() {} });
            })
        },
    ));
}

/// [`NegotiationSession`] over a webrtc-rs peer connection.
pub struct RtcSession {
    peer_connection: Arc<RTCPeerConnection>,
    senders: Mutex<HashMap<TrackKind, Arc<RTCRtpSender>>>,
}

#[async_trait]
impl NegotiationSession for RtcSession {
    async fn create_offer(&self, ice_restart: bool) -> Result<SessionDescription, NegotiationError> {
        let options = ice_restart.then(|| RTCOfferOptions {
            ice_restart: true,
            ..Default::default()
        });
        let offer = self.peer_connection.create_offer(options).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription, NegotiationError> {
        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_remote_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), NegotiationError> {
        let desc = match description.kind {
            SdpType::Offer => RTCSessionDescription::offer(description.sdp)?,
            SdpType::Answer => RTCSessionDescription::answer(description.sdp)?,
        };
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn rollback(&self) -> Result<(), NegotiationError> {
        let Some(pending) = self.peer_connection.pending_local_description().await else {
            debug!("Nothing to roll back");
            return Ok(());
        };

        // The sdp is only parsed, never applied, for a rollback.
        let mut desc = RTCSessionDescription::default();
        desc.sdp_type = RTCSdpType::Rollback;
        desc.sdp = pending.sdp;
        self.peer_connection.set_local_description(desc).await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), NegotiationError> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: candidate.username_fragment,
        };
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn attach_track(&self, track: &LocalTrack) -> Result<(), NegotiationError> {
        let rtc_track: Arc<dyn TrackLocal + Send + Sync> = track.rtc_track();
        let sender = self.peer_connection.add_track(rtc_track).await?;

        // RTCP has to be read for the interceptors to work.
        let rtcp_sender = sender.clone();
        tokio::spawn(async move {
            let mut buf = vec![0u8; 1500];
            while rtcp_sender.read(&mut buf).await.is_ok() {}
        });

        self.senders.lock().await.insert(track.kind(), sender);
        Ok(())
    }

    async fn replace_track(&self, track: &LocalTrack) -> Result<(), NegotiationError> {
        let sender = self
            .senders
            .lock()
            .await
            .get(&track.kind())
            .cloned()
            .ok_or(NegotiationError::NoSuchTrack(track.kind()))?;

        let rtc_track: Arc<dyn TrackLocal + Send + Sync> = track.rtc_track();
        sender.replace_track(Some(rtc_track)).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), NegotiationError> {
        self.peer_connection.close().await?;
        Ok(())
    }
}
