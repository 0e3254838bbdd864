mod peer_session;
mod session_command;
mod session_event;

pub use peer_session::{PeerSession, SessionPhase, SessionUpdate};
pub use session_command::SessionCommand;
pub use session_event::{SessionEvent, TransportState};
