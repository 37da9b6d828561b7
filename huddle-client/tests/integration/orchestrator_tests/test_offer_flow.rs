use huddle_client::{PeerState, PeerUpdate, TrackKind};
use huddle_core::{ClientMessage, ServerMessage, SessionDescription};

use crate::integration::{Harness, audio_only, init_tracing};
use crate::utils::{RecordingRelay, SessionOp, id};

#[tokio::test]
async fn test_existing_member_offers_on_user_joined() {
    init_tracing();

    let (local, remote) = (id(1), id(2));
    let mut harness = Harness::in_room(local, audio_only()).await;

    harness
        .signal(ServerMessage::UserJoined { user_id: remote })
        .await;

    let sent = harness.sent();
    assert_eq!(RecordingRelay::offers(&sent), vec![(remote, false)]);
    assert_eq!(harness.state(remote), Some(PeerState::OfferSent));
    assert_eq!(
        harness.session(remote).await.ops().await,
        vec![
            SessionOp::AttachTrack(TrackKind::Audio),
            SessionOp::CreateOffer { ice_restart: false },
        ]
    );

    harness
        .signal(ServerMessage::Answer {
            answer: SessionDescription::answer("v=0 answer"),
            from: remote,
        })
        .await;

    assert_eq!(harness.state(remote), Some(PeerState::Connected));
    assert_eq!(
        harness.drain_updates(),
        vec![
            PeerUpdate::PeerAdded(remote),
            PeerUpdate::StateChanged {
                peer: remote,
                state: PeerState::OfferSent,
            },
            PeerUpdate::StateChanged {
                peer: remote,
                state: PeerState::Connected,
            },
        ]
    );
}

#[tokio::test]
async fn test_joiner_waits_for_offers() {
    init_tracing();

    let local = id(5);
    let (a, b) = (id(2), id(9));
    let mut harness = Harness::in_room(local, audio_only()).await;

    harness
        .signal(ServerMessage::RoomUsers { users: vec![a, b] })
        .await;

    assert_eq!(harness.state(a), Some(PeerState::New));
    assert_eq!(harness.state(b), Some(PeerState::New));
    assert!(harness.sent().is_empty(), "Joiner must not offer");
    assert_eq!(harness.factory.created().await, 0);

    harness
        .signal(ServerMessage::Offer {
            offer: SessionDescription::offer("v=0 offer"),
            from: a,
            restart: false,
        })
        .await;

    let sent = harness.sent();
    assert_eq!(RecordingRelay::answers(&sent), vec![a]);
    assert_eq!(harness.state(a), Some(PeerState::Connected));
    assert_eq!(harness.state(b), Some(PeerState::New));
    assert_eq!(
        harness.session(a).await.ops().await,
        vec![
            SessionOp::AttachTrack(TrackKind::Audio),
            SessionOp::SetRemote(huddle_core::SdpType::Offer),
            SessionOp::CreateAnswer,
        ]
    );

    let states: Vec<PeerState> = harness
        .drain_updates()
        .into_iter()
        .filter_map(|u| match u {
            PeerUpdate::StateChanged { peer, state } if peer == a => Some(state),
            _ => None,
        })
        .collect();
    assert_eq!(
        states,
        vec![
            PeerState::OfferReceived,
            PeerState::Answering,
            PeerState::Connected,
        ]
    );
}

#[tokio::test]
async fn test_unsolicited_offer_creates_link() {
    init_tracing();

    let mut harness = Harness::in_room(id(1), audio_only()).await;

    harness
        .signal(ServerMessage::Offer {
            offer: SessionDescription::offer("v=0 offer"),
            from: id(7),
            restart: false,
        })
        .await;

    assert_eq!(harness.state(id(7)), Some(PeerState::Connected));
    assert!(matches!(
        harness.sent().as_slice(),
        [ClientMessage::Answer { to, .. }] if *to == id(7)
    ));
}

#[tokio::test]
async fn test_answer_in_wrong_state_ignored() {
    init_tracing();

    let remote = id(2);
    let mut harness = Harness::in_room(id(1), audio_only()).await;
    harness
        .signal(ServerMessage::RoomUsers {
            users: vec![remote],
        })
        .await;

    harness
        .signal(ServerMessage::Answer {
            answer: SessionDescription::answer("v=0 answer"),
            from: remote,
        })
        .await;

    assert_eq!(harness.state(remote), Some(PeerState::New));
    assert_eq!(harness.factory.created().await, 0);
}

#[tokio::test]
async fn test_local_candidates_are_relayed() {
    init_tracing();

    let remote = id(2);
    let mut harness = Harness::in_room(id(1), audio_only()).await;
    harness.connect_as_offerer(remote).await;

    harness
        .session_event(
            remote,
            huddle_client::SessionEvent::LocalCandidate(huddle_core::IceCandidate::new(
                "candidate:local",
            )),
        )
        .await;

    assert!(matches!(
        harness.sent().as_slice(),
        [ClientMessage::IceCandidate { candidate, to }]
            if *to == remote && candidate.candidate == "candidate:local"
    ));
}
