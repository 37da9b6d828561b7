use huddle_client::{PeerState, TrackKind};
use huddle_core::{IceCandidate, SdpType, ServerMessage, SessionDescription};

use crate::integration::{Harness, audio_only, init_tracing};
use crate::utils::{SessionOp, id};

fn candidate(from: huddle_core::ConnectionId, name: &str) -> ServerMessage {
    ServerMessage::IceCandidate {
        candidate: IceCandidate::new(name),
        from,
    }
}

#[tokio::test]
async fn test_candidates_before_offer_are_flushed_once() {
    init_tracing();

    let remote = id(2);
    let mut harness = Harness::in_room(id(5), audio_only()).await;
    harness
        .signal(ServerMessage::RoomUsers {
            users: vec![remote],
        })
        .await;

    harness.signal(candidate(remote, "c1")).await;
    harness.signal(candidate(remote, "c2")).await;
    assert_eq!(
        harness
            .orchestrator
            .peer(&remote)
            .map(|l| l.pending_candidates()),
        Some(2)
    );

    harness
        .signal(ServerMessage::Offer {
            offer: SessionDescription::offer("v=0 offer"),
            from: remote,
            restart: false,
        })
        .await;
    harness.signal(candidate(remote, "c3")).await;

    assert_eq!(
        harness.session(remote).await.ops().await,
        vec![
            SessionOp::AttachTrack(TrackKind::Audio),
            SessionOp::SetRemote(SdpType::Offer),
            SessionOp::AddCandidate("c1".into()),
            SessionOp::AddCandidate("c2".into()),
            SessionOp::CreateAnswer,
            SessionOp::AddCandidate("c3".into()),
        ]
    );
    assert_eq!(
        harness
            .orchestrator
            .peer(&remote)
            .map(|l| l.pending_candidates()),
        Some(0)
    );
}

#[tokio::test]
async fn test_offerer_buffers_until_answer() {
    init_tracing();

    let remote = id(2);
    let mut harness = Harness::in_room(id(1), audio_only()).await;
    harness
        .signal(ServerMessage::UserJoined { user_id: remote })
        .await;

    harness.signal(candidate(remote, "early")).await;
    assert!(harness.session(remote).await.candidates().await.is_empty());

    harness
        .signal(ServerMessage::Answer {
            answer: SessionDescription::answer("v=0 answer"),
            from: remote,
        })
        .await;
    harness.signal(candidate(remote, "late")).await;

    assert_eq!(harness.state(remote), Some(PeerState::Connected));
    assert_eq!(
        harness.session(remote).await.candidates().await,
        vec!["early".to_string(), "late".to_string()]
    );
}

#[tokio::test]
async fn test_restart_does_not_replay_candidates() {
    init_tracing();

    let remote = id(2);
    let mut harness = Harness::in_room(id(1), audio_only()).await;
    harness.signal(candidate(remote, "c1")).await;
    harness.connect_as_answerer(remote).await;

    harness
        .signal(ServerMessage::Offer {
            offer: SessionDescription::offer("v=0 restart"),
            from: remote,
            restart: true,
        })
        .await;

    assert_eq!(
        harness.session(remote).await.candidates().await,
        vec!["c1".to_string()]
    );
}
