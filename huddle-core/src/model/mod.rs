mod connection;
mod room;
mod signaling;

pub use connection::ConnectionId;
pub use room::RoomId;
pub use signaling::{
    ClientMessage, IceServerConfig, ServerEvent, SignalKind, SignalingEnvelope,
    default_ice_servers,
};
