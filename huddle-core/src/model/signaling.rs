use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::connection::ConnectionId;
use crate::model::room::RoomId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

/// Default network-helper configuration: address discovery only, no relay
/// fallback.
pub fn default_ice_servers() -> Vec<IceServerConfig> {
    vec![
        IceServerConfig::stun("stun:stun.l.google.com:19302"),
        IceServerConfig::stun("stun:stun1.l.google.com:19302"),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

/// One negotiation message in flight through the relay. The payload is an
/// opaque blob; only the sender tag is injected by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalingEnvelope {
    pub kind: SignalKind,
    pub room: RoomId,
    pub sender: ConnectionId,
    pub payload: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", content = "d")]
pub enum ClientMessage {
    Join {
        room: RoomId,
        name: String,
    },
    Leave {
        room: RoomId,
        name: String,
    },
    Chat {
        room: RoomId,
        sender: String,
        body: String,
    },
    Offer {
        room: RoomId,
        payload: Value,
    },
    Answer {
        room: RoomId,
        payload: Value,
    },
    IceCandidate {
        room: RoomId,
        payload: Value,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", content = "d")]
pub enum ServerEvent {
    /// First event on every connection: the assigned identity and the ICE
    /// configuration clients should negotiate with.
    Welcome {
        connection_id: ConnectionId,
        ice_servers: Vec<IceServerConfig>,
    },
    PeerJoined {
        name: String,
    },
    PeerLeft {
        name: String,
    },
    Chat {
        sender: String,
        body: String,
    },
    Offer {
        payload: Value,
        from: ConnectionId,
    },
    Answer {
        payload: Value,
        from: ConnectionId,
    },
    IceCandidate {
        payload: Value,
        from: ConnectionId,
    },
}

impl ServerEvent {
    pub fn from_envelope(envelope: SignalingEnvelope) -> Self {
        match envelope.kind {
            SignalKind::Offer => Self::Offer {
                payload: envelope.payload,
                from: envelope.sender,
            },
            SignalKind::Answer => Self::Answer {
                payload: envelope.payload,
                from: envelope.sender,
            },
            SignalKind::IceCandidate => Self::IceCandidate {
                payload: envelope.payload,
                from: envelope.sender,
            },
        }
    }
}
