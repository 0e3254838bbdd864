use huddle_core::{RoomId, ServerEvent};

use crate::integration::{create_relay, init_tracing};
use crate::utils::TestPeer;

#[tokio::test]
async fn test_join_tracks_membership() {
    init_tracing();

    let service = create_relay();
    let room = RoomId::from("r1");

    let mut alice = TestPeer::connect(&service);
    let mut bob = TestPeer::connect(&service);

    alice.join(&service, "r1", "Alice").await;
    bob.join(&service, "r1", "Bob").await;

    let members = service.directory().members_of(&room).await;
    assert_eq!(members.len(), 2);
    assert!(members.contains(&alice.id));
    assert!(members.contains(&bob.id));

    // presence flowed both ways: the newcomer is announced to alice, and
    // bob learns who was already present
    match alice.recv().await {
        ServerEvent::PeerJoined { name } => assert_eq!(name, "Bob"),
        other => panic!("unexpected event: {other:?}"),
    }
    match bob.recv().await {
        ServerEvent::PeerJoined { name } => assert_eq!(name, "Alice"),
        other => panic!("unexpected event: {other:?}"),
    }

    alice.leave(&service, "r1", "Alice").await;

    let members = service.directory().members_of(&room).await;
    assert_eq!(members, vec![bob.id.clone()]);

    match bob.recv().await {
        ServerEvent::PeerLeft { name } => assert_eq!(name, "Alice"),
        other => panic!("unexpected event: {other:?}"),
    }
}
