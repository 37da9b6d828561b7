use huddle_core::{ClientMessage, ServerMessage};

use crate::integration::{create_test_service, init_tracing, room};
use crate::utils::TestPeer;

#[tokio::test]
async fn test_stale_transport_close_keeps_membership() {
    init_tracing();

    let service = create_test_service();
    let mut a = TestPeer::connect(&service).await.expect("connect a");
    let mut b = TestPeer::connect(&service).await.expect("connect b");

    for peer in [&mut a, &mut b] {
        service
            .handle_message(peer.id, ClientMessage::JoinRoom { room_id: room("r1") })
            .await;
        peer.next().await.expect("room-users");
    }
    a.next().await.expect("a user-joined");

    // b reconnects under the same id before its old transport is reaped
    let old_generation = b.generation;
    let mut b2 = TestPeer::connect_as(&service, b.id)
        .await
        .expect("reconnect b");
    service.disconnect(b.id, old_generation).await;

    a.expect_silence().await.expect("Stale close leaked a user-left");
    assert_eq!(service.rooms().members(&room("r1")).len(), 2);

    // Re-join is idempotent: b gets the roster, a hears nothing
    service
        .handle_message(b2.id, ClientMessage::JoinRoom { room_id: room("r1") })
        .await;
    assert_eq!(
        b2.next().await.expect("b2 room-users"),
        ServerMessage::RoomUsers { users: vec![a.id] }
    );
    a.expect_silence().await.expect("Re-join re-announced b");

    // The live transport still routes
    service
        .handle_text(
            a.id,
            &ClientMessage::IceCandidate {
                candidate: huddle_core::IceCandidate::new("candidate:1"),
                to: b2.id,
            }
            .encode()
            .expect("encode"),
        )
        .await;
    assert!(matches!(
        b2.next().await.expect("b2 candidate"),
        ServerMessage::IceCandidate { from, .. } if from == a.id
    ));
}
