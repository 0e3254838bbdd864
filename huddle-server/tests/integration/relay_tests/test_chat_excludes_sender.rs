use huddle_core::ServerEvent;

use crate::integration::{create_relay, init_tracing};
use crate::utils::TestPeer;

#[tokio::test]
async fn test_chat_excludes_sender() {
    init_tracing();

    let service = create_relay();

    let mut alice = TestPeer::connect(&service);
    let mut bob = TestPeer::connect(&service);

    alice.join(&service, "r1", "Alice").await;
    bob.join(&service, "r1", "Bob").await;

    // drain the presence exchange
    match alice.recv().await {
        ServerEvent::PeerJoined { name } => assert_eq!(name, "Bob"),
        other => panic!("unexpected event: {other:?}"),
    }
    match bob.recv().await {
        ServerEvent::PeerJoined { name } => assert_eq!(name, "Alice"),
        other => panic!("unexpected event: {other:?}"),
    }

    alice.chat(&service, "r1", "Alice", "hi").await;

    match bob.recv().await {
        ServerEvent::Chat { sender, body } => {
            assert_eq!(sender, "Alice");
            assert_eq!(body, "hi");
        }
        other => panic!("unexpected event: {other:?}"),
    }

    // the sender renders its own message locally; the relay must not echo
    alice.expect_silence().await;
}
