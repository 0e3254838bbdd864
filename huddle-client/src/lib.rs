pub mod backend;
pub mod error;
pub mod media;
pub mod session;
pub mod signaling;

pub use backend::{MediaBackend, NegotiationSession};
pub use error::MediaError;
pub use media::{LocalMedia, MediaTrack, TrackKind};
pub use session::{
    PeerSession, SessionCommand, SessionEvent, SessionPhase, SessionUpdate, TransportState,
};
pub use signaling::{ChannelOutbound, SignalingOutbound};
