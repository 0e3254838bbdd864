pub mod model;

pub use model::{
    ClientMessage, ConnectionId, IceServerConfig, RoomId, ServerEvent, SignalKind,
    SignalingEnvelope, default_ice_servers,
};
