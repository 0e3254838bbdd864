use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use huddle_core::IceServerConfig;

use crate::error::MediaError;
use crate::media::{LocalMedia, MediaTrack};
use crate::session::SessionEvent;

/// Boundary with the media session library. Implementations own capture
/// and the negotiation session object; the peer session state machine
/// drives them and never touches the library directly.
#[async_trait]
pub trait MediaBackend: Send + Sync + 'static {
    type Track: MediaTrack;
    type RemoteTrack: Send + 'static;
    type Session: NegotiationSession<Track = Self::Track>;

    /// Acquires exclusive camera and microphone capture.
    async fn capture_camera(&self) -> Result<LocalMedia<Self::Track>, MediaError>;

    /// Captures the screen as a video track for outgoing substitution.
    async fn capture_screen(&self) -> Result<Self::Track, MediaError>;

    /// Constructs a negotiation session against the given address-discovery
    /// configuration, attaching local media when present. Asynchronous
    /// library callbacks surface on `events`.
    async fn open_session(
        &self,
        ice_servers: &[IceServerConfig],
        local: Option<&LocalMedia<Self::Track>>,
        events: mpsc::UnboundedSender<SessionEvent<Self::RemoteTrack>>,
    ) -> Result<Self::Session>;
}

/// One negotiation session object, exclusive to one peer session.
/// `create_offer` and `create_answer` also apply the description locally
/// before returning it.
#[async_trait]
pub trait NegotiationSession: Send + Sync + 'static {
    type Track: MediaTrack;

    async fn create_offer(&self) -> Result<Value>;
    async fn create_answer(&self) -> Result<Value>;
    async fn set_remote_description(&self, description: Value) -> Result<()>;
    async fn add_ice_candidate(&self, candidate: Value) -> Result<()>;

    /// Swaps the outgoing video track in place without renegotiation.
    async fn replace_video_track(&self, track: &Self::Track) -> Result<()>;

    async fn close(&self) -> Result<()>;
}
