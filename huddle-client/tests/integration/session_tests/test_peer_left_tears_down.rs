use std::time::Duration;

use huddle_client::{SessionCommand, SessionPhase, SessionUpdate};
use huddle_core::ServerEvent;

use crate::integration::init_tracing;
use crate::utils::{MockBackend, SessionOp, spawn_session, wait_until};

#[tokio::test]
async fn test_peer_left_tears_down() {
    init_tracing();

    let mut harness = spawn_session(MockBackend::new());

    harness.commands.send(SessionCommand::Join).unwrap();
    harness.wait_for_phase(SessionPhase::Negotiating).await;

    harness
        .relay
        .send(ServerEvent::PeerLeft {
            name: "Bob".to_owned(),
        })
        .unwrap();

    // departure detaches the remote media and closes the session for good
    match harness.next_update().await {
        SessionUpdate::PeerLeft { name } => assert_eq!(name, "Bob"),
        other => panic!("unexpected update: {other:?}"),
    }
    match harness.next_update().await {
        SessionUpdate::RemoteDetached => {}
        other => panic!("unexpected update: {other:?}"),
    }
    harness.wait_for_phase(SessionPhase::Closed).await;

    tokio::time::timeout(Duration::from_secs(2), harness.task)
        .await
        .expect("event loop should exit")
        .expect("event loop should not panic");

    assert!(
        harness
            .backend
            .recorded_ops()
            .await
            .contains(&SessionOp::Close)
    );

    let audio = harness.backend.track("audio").await.unwrap();
    let video = harness.backend.track("video").await.unwrap();
    assert!(wait_until(|| audio.is_stopped() && video.is_stopped(), 1000).await);
}
