use std::sync::atomic::Ordering;

use huddle_client::{MediaError, SessionCommand, SessionPhase, SessionUpdate};

use crate::integration::init_tracing;
use crate::utils::{MockBackend, spawn_session};

#[tokio::test]
async fn test_media_denied_recoverable() {
    init_tracing();

    let backend = MockBackend::new();
    backend.deny_camera.store(true, Ordering::SeqCst);

    let mut harness = spawn_session(backend);

    harness.commands.send(SessionCommand::Join).unwrap();
    harness
        .wait_for_phase(SessionPhase::AwaitingLocalMedia)
        .await;

    // device denied: surfaced locally, back to idle, nothing torn down
    match harness.next_update().await {
        SessionUpdate::MediaFailed(MediaError::PermissionDenied) => {}
        other => panic!("expected a media failure, got {other:?}"),
    }
    harness.wait_for_phase(SessionPhase::Idle).await;
    assert!(!harness.task.is_finished());
    assert_eq!(harness.backend.sessions_opened.load(Ordering::SeqCst), 0);

    // the user grants access and retries
    harness.backend.deny_camera.store(false, Ordering::SeqCst);
    harness.commands.send(SessionCommand::Join).unwrap();
    harness.wait_for_phase(SessionPhase::Negotiating).await;
    assert_eq!(harness.backend.sessions_opened.load(Ordering::SeqCst), 1);
}
