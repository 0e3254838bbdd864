use std::sync::atomic::Ordering;

use serde_json::json;

use huddle_client::{SessionCommand, SessionPhase, SessionUpdate};
use huddle_core::{ConnectionId, ServerEvent};

use crate::integration::init_tracing;
use crate::utils::{MockBackend, SentSignal, spawn_session};

#[tokio::test]
async fn test_answer_without_session_is_recoverable() {
    init_tracing();

    let mut harness = spawn_session(MockBackend::new());

    // an answer with no matching offer is reported, never fatal
    harness
        .relay
        .send(ServerEvent::Answer {
            payload: json!({"type": "answer", "sdp": "stray"}),
            from: ConnectionId::new(),
        })
        .unwrap();

    match harness.next_update().await {
        SessionUpdate::NegotiationFailed(_) => {}
        other => panic!("expected a negotiation failure, got {other:?}"),
    }
    assert!(!harness.task.is_finished());

    // a fresh offer cycle still succeeds afterwards
    harness
        .relay
        .send(ServerEvent::Offer {
            payload: json!({"type": "offer", "sdp": "remote-offer"}),
            from: ConnectionId::new(),
        })
        .unwrap();
    assert!(harness.signaling.wait_for_sent(1, 2000).await);
    assert!(matches!(
        harness.signaling.sent().await[0],
        SentSignal::Answer(_)
    ));
}

#[tokio::test]
async fn test_bad_description_is_recoverable() {
    init_tracing();

    let backend = MockBackend::new();
    let mut harness = spawn_session(backend);

    harness.commands.send(SessionCommand::Join).unwrap();
    harness.wait_for_phase(SessionPhase::Negotiating).await;

    harness
        .backend
        .fail_remote_description
        .store(true, Ordering::SeqCst);
    harness
        .relay
        .send(ServerEvent::Offer {
            payload: json!({"type": "offer", "sdp": "garbled"}),
            from: ConnectionId::new(),
        })
        .unwrap();

    match harness.next_update().await {
        SessionUpdate::NegotiationFailed(_) => {}
        other => panic!("expected a negotiation failure, got {other:?}"),
    }
    assert!(!harness.task.is_finished());

    // retried offer cycle completes once descriptions apply again
    harness
        .backend
        .fail_remote_description
        .store(false, Ordering::SeqCst);
    harness
        .relay
        .send(ServerEvent::Offer {
            payload: json!({"type": "offer", "sdp": "retried"}),
            from: ConnectionId::new(),
        })
        .unwrap();
    assert!(harness.signaling.wait_for_sent(1, 2000).await);
    assert!(matches!(
        harness.signaling.sent().await[0],
        SentSignal::Answer(_)
    ));
}
