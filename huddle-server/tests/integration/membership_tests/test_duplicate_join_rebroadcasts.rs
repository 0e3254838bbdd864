use huddle_core::{RoomId, ServerEvent};

use crate::integration::{create_relay, init_tracing};
use crate::utils::TestPeer;

#[tokio::test]
async fn test_duplicate_join_rebroadcasts() {
    init_tracing();

    let service = create_relay();
    let room = RoomId::from("r1");

    let mut alice = TestPeer::connect(&service);
    let mut bob = TestPeer::connect(&service);

    alice.join(&service, "r1", "Alice").await;
    bob.join(&service, "r1", "Bob").await;

    // rejoining the same room keeps membership unique...
    alice.join(&service, "r1", "Alice").await;
    let members = service.directory().members_of(&room).await;
    assert_eq!(members.len(), 2);

    // ...but presence is announced again
    match bob.recv().await {
        ServerEvent::PeerJoined { name } => assert_eq!(name, "Alice"),
        other => panic!("unexpected event: {other:?}"),
    }
    match bob.recv().await {
        ServerEvent::PeerJoined { name } => assert_eq!(name, "Alice"),
        other => panic!("unexpected event: {other:?}"),
    }
    bob.expect_silence().await;
}
