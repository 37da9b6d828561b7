use huddle_core::{ClientMessage, ConnectionId, ServerMessage, SessionDescription};
use huddle_server::{MessageRelay, RoomManager};
use std::sync::Arc;

use crate::integration::{init_tracing, room};
use crate::utils::MockSignalingOutput;

#[tokio::test]
async fn test_relay_announces_and_forwards() {
    init_tracing();

    let (output, _rx) = MockSignalingOutput::new();
    let relay = MessageRelay::new(RoomManager::new(), Arc::new(output.clone()));
    let (a, b) = (ConnectionId::new(), ConnectionId::new());
    output.connect(a).await;
    output.connect(b).await;

    relay
        .handle_message(a, ClientMessage::JoinRoom { room_id: room("r1") })
        .await;
    relay
        .handle_message(b, ClientMessage::JoinRoom { room_id: room("r1") })
        .await;
    relay
        .handle_message(
            b,
            ClientMessage::Offer {
                offer: SessionDescription::offer("X"),
                to: a,
                restart: true,
            },
        )
        .await;

    assert_eq!(
        output.delivered_to(&a).await,
        vec![
            ServerMessage::RoomUsers { users: vec![] },
            ServerMessage::UserJoined { user_id: b },
            ServerMessage::Offer {
                offer: SessionDescription::offer("X"),
                from: b,
                restart: true,
            },
        ]
    );
    assert_eq!(
        output.delivered_to(&b).await,
        vec![ServerMessage::RoomUsers { users: vec![a] }]
    );
}

#[tokio::test]
async fn test_relay_drops_to_departed_target() {
    init_tracing();

    let (output, _rx) = MockSignalingOutput::new();
    let relay = MessageRelay::new(RoomManager::new(), Arc::new(output.clone()));
    let (a, b) = (ConnectionId::new(), ConnectionId::new());
    output.connect(a).await;

    relay
        .handle_message(
            a,
            ClientMessage::Answer {
                answer: SessionDescription::answer("Y"),
                to: b,
            },
        )
        .await;

    assert_eq!(output.dropped_count().await, 1);
    assert!(output.delivered_to(&a).await.is_empty());
}
