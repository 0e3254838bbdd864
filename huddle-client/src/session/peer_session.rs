use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use huddle_core::{IceServerConfig, RoomId, ServerEvent, default_ice_servers};

use crate::backend::{MediaBackend, NegotiationSession};
use crate::error::MediaError;
use crate::media::{LocalMedia, MediaTrack};
use crate::session::session_command::SessionCommand;
use crate::session::session_event::{SessionEvent, TransportState};
use crate::signaling::SignalingOutbound;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    AwaitingLocalMedia,
    Negotiating,
    Connected,
    Closed,
}

/// Notifications surfaced to the embedding application.
#[derive(Debug)]
pub enum SessionUpdate<R> {
    PhaseChanged(SessionPhase),
    PeerJoined { name: String },
    PeerLeft { name: String },
    Chat { sender: String, body: String },
    RemoteTrack(R),
    RemoteDetached,
    MediaFailed(MediaError),
    NegotiationFailed(String),
}

/// Negotiation state machine for one remote participant. Advanced by user
/// commands, inbound relay events, and asynchronous callbacks from the
/// session backend; all three are serialized by the event loop in [`run`].
///
/// [`run`]: PeerSession::run
pub struct PeerSession<B: MediaBackend> {
    backend: Arc<B>,
    signaling: Arc<dyn SignalingOutbound>,
    room: RoomId,
    phase: SessionPhase,
    ice_servers: Vec<IceServerConfig>,
    local: Option<LocalMedia<B::Track>>,
    camera_video: Option<B::Track>,
    screen: Option<B::Track>,
    session: Option<Arc<B::Session>>,
    transport_state: TransportState,
    offer_sent: bool,
    has_remote_description: bool,
    pending_candidates: Vec<Value>,
    events_tx: mpsc::UnboundedSender<SessionEvent<B::RemoteTrack>>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent<B::RemoteTrack>>,
    updates: mpsc::UnboundedSender<SessionUpdate<B::RemoteTrack>>,
}

impl<B: MediaBackend> PeerSession<B> {
    pub fn new(
        backend: Arc<B>,
        signaling: Arc<dyn SignalingOutbound>,
        room: RoomId,
    ) -> (Self, mpsc::UnboundedReceiver<SessionUpdate<B::RemoteTrack>>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();

        let session = Self {
            backend,
            signaling,
            room,
            phase: SessionPhase::Idle,
            ice_servers: default_ice_servers(),
            local: None,
            camera_video: None,
            screen: None,
            session: None,
            transport_state: TransportState::New,
            offer_sent: false,
            has_remote_description: false,
            pending_candidates: Vec::new(),
            events_tx,
            events_rx,
            updates: updates_tx,
        };
        (session, updates_rx)
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Event loop. Exits when the session reaches `Closed`, when the user
    /// leaves, or when either input channel closes; teardown runs on every
    /// one of those paths.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<SessionCommand>,
        mut relay: mpsc::UnboundedReceiver<ServerEvent>,
    ) {
        info!(room = %self.room, "peer session started");

        loop {
            tokio::select! {
                cmd = commands.recv() => {
                    match cmd {
                        Some(cmd) => {
                            if self.handle_command(cmd).await {
                                break;
                            }
                        }
                        None => break,
                    }
                }

                event = relay.recv() => {
                    match event {
                        Some(event) => {
                            if self.handle_relay_event(event).await {
                                break;
                            }
                        }
                        None => break,
                    }
                }

                event = self.events_rx.recv() => {
                    // events_tx is held by self, so this arm never yields None
                    if let Some(event) = event {
                        if self.handle_session_event(event).await {
                            break;
                        }
                    }
                }
            }
        }

        self.shutdown().await;
        info!(room = %self.room, "peer session finished");
    }

    async fn handle_command(&mut self, cmd: SessionCommand) -> bool {
        match cmd {
            SessionCommand::Join => {
                self.begin_join().await;
                false
            }
            SessionCommand::Leave => {
                self.set_phase(SessionPhase::Closed);
                true
            }
            SessionCommand::ToggleAudio => {
                if let Some(local) = &self.local {
                    local.toggle_audio();
                }
                false
            }
            SessionCommand::ToggleVideo => {
                if let Some(local) = &self.local {
                    local.toggle_video();
                }
                false
            }
            SessionCommand::StartScreenShare => {
                self.start_screen_share().await;
                false
            }
            SessionCommand::StopScreenShare => {
                self.stop_screen_share().await;
                false
            }
        }
    }

    async fn handle_relay_event(&mut self, event: ServerEvent) -> bool {
        match event {
            ServerEvent::Welcome { ice_servers, .. } => {
                if !ice_servers.is_empty() {
                    self.ice_servers = ice_servers;
                }
                false
            }
            ServerEvent::PeerJoined { name } => {
                let _ = self.updates.send(SessionUpdate::PeerJoined { name });
                self.initiate_if_fresh().await;
                false
            }
            ServerEvent::PeerLeft { name } => {
                // the session object is per participant; a departure ends it
                let _ = self.updates.send(SessionUpdate::PeerLeft { name });
                let _ = self.updates.send(SessionUpdate::RemoteDetached);
                self.set_phase(SessionPhase::Closed);
                true
            }
            ServerEvent::Chat { sender, body } => {
                let _ = self.updates.send(SessionUpdate::Chat { sender, body });
                false
            }
            ServerEvent::Offer { payload, .. } => {
                self.accept_offer(payload).await;
                false
            }
            ServerEvent::Answer { payload, .. } => {
                self.accept_answer(payload).await;
                false
            }
            ServerEvent::IceCandidate { payload, .. } => {
                self.accept_candidate(payload).await;
                false
            }
        }
    }

    async fn handle_session_event(&mut self, event: SessionEvent<B::RemoteTrack>) -> bool {
        match event {
            SessionEvent::CandidateReady(candidate) => {
                self.signaling
                    .send_ice_candidate(&self.room, candidate)
                    .await;
                false
            }
            SessionEvent::RemoteTrack(track) => {
                let _ = self.updates.send(SessionUpdate::RemoteTrack(track));
                false
            }
            SessionEvent::StateChanged(state) => {
                self.transport_state = state;
                match state {
                    TransportState::Connected => {
                        if self.phase == SessionPhase::Negotiating {
                            self.set_phase(SessionPhase::Connected);
                        }
                        false
                    }
                    TransportState::Failed
                    | TransportState::Disconnected
                    | TransportState::Closed => {
                        if matches!(
                            self.phase,
                            SessionPhase::Negotiating | SessionPhase::Connected
                        ) {
                            warn!(room = %self.room, ?state, "transport ended");
                            let _ = self.updates.send(SessionUpdate::RemoteDetached);
                            self.set_phase(SessionPhase::Closed);
                            return true;
                        }
                        false
                    }
                    _ => false,
                }
            }
        }
    }

    async fn begin_join(&mut self) {
        if self.phase != SessionPhase::Idle {
            warn!(room = %self.room, phase = ?self.phase, "join ignored outside idle");
            return;
        }

        self.set_phase(SessionPhase::AwaitingLocalMedia);
        match self.backend.capture_camera().await {
            Ok(local) => {
                self.local = Some(local);
                if let Err(e) = self.ensure_session().await {
                    self.fail_negotiation(e);
                }
            }
            Err(e) => {
                // recoverable: the user may retry after granting access
                warn!(room = %self.room, "local media unavailable: {e}");
                let _ = self.updates.send(SessionUpdate::MediaFailed(e));
                self.set_phase(SessionPhase::Idle);
            }
        }
    }

    /// Lazily constructs the negotiation session; attaches local media when
    /// it has been captured.
    async fn ensure_session(&mut self) -> Result<()> {
        if self.session.is_none() {
            let session = self
                .backend
                .open_session(&self.ice_servers, self.local.as_ref(), self.events_tx.clone())
                .await?;
            self.session = Some(Arc::new(session));
            self.transport_state = TransportState::New;
            self.offer_sent = false;
            self.has_remote_description = false;
        }
        if matches!(
            self.phase,
            SessionPhase::Idle | SessionPhase::AwaitingLocalMedia
        ) {
            self.set_phase(SessionPhase::Negotiating);
        }
        Ok(())
    }

    /// The side that sees a new participant initiates, but only over a
    /// session that has not negotiated in either direction yet.
    async fn initiate_if_fresh(&mut self) {
        if self.phase != SessionPhase::Negotiating
            || self.transport_state != TransportState::New
            || self.offer_sent
            || self.has_remote_description
        {
            return;
        }
        let Some(session) = self.session.clone() else {
            return;
        };
        match session.create_offer().await {
            Ok(payload) => {
                self.offer_sent = true;
                self.signaling.send_offer(&self.room, payload).await;
            }
            Err(e) => self.fail_negotiation(e),
        }
    }

    async fn accept_offer(&mut self, payload: Value) {
        if self.phase == SessionPhase::Closed {
            return;
        }
        if let Err(e) = self.try_accept_offer(payload).await {
            self.fail_negotiation(e);
        }
    }

    async fn try_accept_offer(&mut self, payload: Value) -> Result<()> {
        self.ensure_session().await?;
        let Some(session) = self.session.clone() else {
            return Ok(());
        };
        session.set_remote_description(payload).await?;
        self.has_remote_description = true;
        self.flush_pending_candidates().await;

        let answer = session.create_answer().await?;
        self.signaling.send_answer(&self.room, answer).await;
        Ok(())
    }

    async fn accept_answer(&mut self, payload: Value) {
        let Some(session) = self.session.clone() else {
            warn!(room = %self.room, "answer received with no open session");
            let _ = self.updates.send(SessionUpdate::NegotiationFailed(
                "answer with no pending offer".to_owned(),
            ));
            return;
        };
        match session.set_remote_description(payload).await {
            Ok(()) => {
                self.has_remote_description = true;
                self.flush_pending_candidates().await;
                // `Connected` arrives asynchronously from the transport
            }
            Err(e) => self.fail_negotiation(e),
        }
    }

    /// Candidates may outrun the offer/answer exchange; those arriving
    /// before a remote description are buffered and applied in order once
    /// one exists.
    async fn accept_candidate(&mut self, payload: Value) {
        if !self.has_remote_description || self.session.is_none() {
            self.pending_candidates.push(payload);
            return;
        }
        let Some(session) = self.session.clone() else {
            return;
        };
        if let Err(e) = session.add_ice_candidate(payload).await {
            warn!(room = %self.room, "failed to apply remote candidate: {e:#}");
        }
    }

    async fn flush_pending_candidates(&mut self) {
        let Some(session) = self.session.clone() else {
            return;
        };
        for candidate in std::mem::take(&mut self.pending_candidates) {
            if let Err(e) = session.add_ice_candidate(candidate).await {
                warn!(room = %self.room, "failed to apply buffered candidate: {e:#}");
            }
        }
    }

    async fn start_screen_share(&mut self) {
        if self.screen.is_some() {
            return;
        }
        let Some(session) = self.session.clone() else {
            warn!(room = %self.room, "screen share requested with no active session");
            return;
        };
        match self.backend.capture_screen().await {
            Ok(track) => {
                // track replacement on the live session, not a re-offer
                if let Err(e) = session.replace_video_track(&track).await {
                    track.stop();
                    warn!(room = %self.room, "failed to switch to screen track: {e:#}");
                    let _ = self
                        .updates
                        .send(SessionUpdate::NegotiationFailed(format!("{e:#}")));
                    return;
                }
                if let Some(local) = &self.local {
                    self.camera_video = Some(local.video.clone());
                }
                self.screen = Some(track);
            }
            Err(e) => {
                warn!(room = %self.room, "screen capture unavailable: {e}");
                let _ = self.updates.send(SessionUpdate::MediaFailed(e));
            }
        }
    }

    async fn stop_screen_share(&mut self) {
        let Some(screen) = self.screen.take() else {
            return;
        };
        screen.stop();
        let (Some(session), Some(camera)) = (self.session.clone(), self.camera_video.take())
        else {
            return;
        };
        if let Err(e) = session.replace_video_track(&camera).await {
            warn!(room = %self.room, "failed to restore camera track: {e:#}");
        }
    }

    /// Releases capture devices and closes the session object. Runs on
    /// every exit path and tolerates nothing having been acquired.
    async fn shutdown(&mut self) {
        if let Some(screen) = self.screen.take() {
            screen.stop();
        }
        if let Some(local) = self.local.take() {
            local.stop();
        }
        self.camera_video = None;
        if let Some(session) = self.session.take() {
            if let Err(e) = session.close().await {
                debug!(room = %self.room, "session close reported: {e:#}");
            }
        }
        self.set_phase(SessionPhase::Closed);
    }

    /// Negotiation errors are recoverable: report them and leave the
    /// machine able to run a fresh offer cycle.
    fn fail_negotiation(&mut self, error: anyhow::Error) {
        warn!(room = %self.room, "negotiation error: {error:#}");
        let _ = self
            .updates
            .send(SessionUpdate::NegotiationFailed(format!("{error:#}")));
    }

    fn set_phase(&mut self, phase: SessionPhase) {
        if self.phase == phase {
            return;
        }
        debug!(room = %self.room, from = ?self.phase, to = ?phase, "session phase changed");
        self.phase = phase;
        let _ = self.updates.send(SessionUpdate::PhaseChanged(phase));
    }
}
