use huddle_core::{ClientMessage, ConnectionId, SessionDescription};

use crate::integration::{create_test_service, init_tracing};
use crate::utils::TestPeer;

#[tokio::test]
async fn test_unknown_target_dropped() {
    init_tracing();

    let service = create_test_service();
    let mut a = TestPeer::connect(&service).await.expect("connect a");

    service
        .handle_message(
            a.id,
            ClientMessage::Answer {
                answer: SessionDescription::answer("Y"),
                to: ConnectionId::new(),
            },
        )
        .await;

    // Sender gets no error and stays registered
    a.expect_silence().await.expect("Sender was notified");
    assert!(service.sessions().contains(&a.id));
}

#[tokio::test]
async fn test_malformed_text_ignored() {
    init_tracing();

    let service = create_test_service();
    let mut a = TestPeer::connect(&service).await.expect("connect a");

    service.handle_text(a.id, "{\"event\":\"join-room\"}").await;
    service
        .handle_text(a.id, "{\"event\":\"join-room\",\"data\":{\"roomId\":\"\"}}")
        .await;

    a.expect_silence().await.expect("Malformed frame was answered");
    assert_eq!(service.rooms().room_count(), 0);
}
