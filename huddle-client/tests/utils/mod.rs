
pub use mock_backend::*;
pub use mock_signaling::*;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use huddle_client::{PeerSession, SessionCommand, SessionPhase, SessionUpdate};
use huddle_core::{RoomId, ServerEvent};

/// A peer session running under test, with both input channels and the
/// update stream in hand.
pub struct SessionHarness {
    pub commands: mpsc::UnboundedSender<SessionCommand>,
    pub relay: mpsc::UnboundedSender<ServerEvent>,
    pub updates: mpsc::UnboundedReceiver<SessionUpdate<String>>,
    pub backend: MockBackend,
    pub signaling: MockSignaling,
    pub task: JoinHandle<()>,
}

pub fn spawn_session(backend: MockBackend) -> SessionHarness {
    let signaling = MockSignaling::new();
    let (session, updates) = PeerSession::new(
        Arc::new(backend.clone()),
        Arc::new(signaling.clone()),
        RoomId::from("r1"),
    );

    let (commands, command_rx) = mpsc::unbounded_channel();
    let (relay, relay_rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(session.run(command_rx, relay_rx));

    SessionHarness {
        commands,
        relay,
        updates,
        backend,
        signaling,
        task,
    }
}

impl SessionHarness {
    pub async fn next_update(&mut self) -> SessionUpdate<String> {
        tokio::time::timeout(Duration::from_secs(2), self.updates.recv())
            .await
            .expect("timed out waiting for update")
            .expect("update stream closed")
    }

    /// Consumes updates until the given phase is reached.
    pub async fn wait_for_phase(&mut self, expected: SessionPhase) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            let update = tokio::time::timeout_at(deadline, self.updates.recv())
                .await
                .unwrap_or_else(|_| panic!("timed out waiting for phase {expected:?}"))
                .expect("update stream closed");
            if let SessionUpdate::PhaseChanged(phase) = update {
                if phase == expected {
                    return;
                }
            }
        }
    }

    /// Asserts no update is surfaced within a short window.
    pub async fn expect_no_update(&mut self, window_ms: u64) {
        match tokio::time::timeout(Duration::from_millis(window_ms), self.updates.recv()).await {
            Err(_) => {}
            Ok(update) => panic!("unexpected update: {update:?}"),
        }
    }
}

/// Polls a condition until it holds or the timeout elapses.
pub async fn wait_until<F>(mut condition: F, timeout_ms: u64) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = Duration::from_millis(timeout_ms);

    loop {
        if condition() {
            return true;
        }
        if start.elapsed() > timeout {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
