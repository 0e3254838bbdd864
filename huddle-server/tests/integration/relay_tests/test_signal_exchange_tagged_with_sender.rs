use serde_json::json;

use huddle_core::ServerEvent;

use crate::integration::{create_relay, init_tracing};
use crate::utils::TestPeer;

#[tokio::test]
async fn test_signal_exchange_tagged_with_sender() {
    init_tracing();

    let service = create_relay();

    let mut alice = TestPeer::connect(&service);
    let mut bob = TestPeer::connect(&service);

    alice.join(&service, "r1", "Alice").await;
    bob.join(&service, "r1", "Bob").await;
    alice.recv().await;
    bob.recv().await;

    // offer goes to bob, tagged with alice's identity, payload untouched
    let offer = json!({"type": "offer", "sdp": "v=0 alice", "custom": {"bitrate": 512}});
    alice.offer(&service, "r1", offer.clone()).await;

    match bob.recv().await {
        ServerEvent::Offer { payload, from } => {
            assert_eq!(payload, offer);
            assert_eq!(from, alice.id);
        }
        other => panic!("unexpected event: {other:?}"),
    }

    // answer comes back tagged with bob's identity
    let answer = json!({"type": "answer", "sdp": "v=0 bob"});
    bob.answer(&service, "r1", answer.clone()).await;

    match alice.recv().await {
        ServerEvent::Answer { payload, from } => {
            assert_eq!(payload, answer);
            assert_eq!(from, bob.id);
        }
        other => panic!("unexpected event: {other:?}"),
    }

    // candidates are delivered in send order
    for index in 0..3 {
        alice
            .ice_candidate(&service, "r1", json!({"candidate": index}))
            .await;
    }
    for index in 0..3 {
        match bob.recv().await {
            ServerEvent::IceCandidate { payload, from } => {
                assert_eq!(payload, json!({"candidate": index}));
                assert_eq!(from, alice.id);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    // neither side ever hears its own signaling back
    alice.expect_silence().await;
    bob.expect_silence().await;
}
