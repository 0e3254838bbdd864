use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use huddle_core::{ClientMessage, RoomId};

/// Outbound half of the relay boundary. The transport layer implements
/// this so the peer session can emit negotiation messages without knowing
/// how they are framed or carried.
#[async_trait]
pub trait SignalingOutbound: Send + Sync {
    async fn send_offer(&self, room: &RoomId, payload: Value);
    async fn send_answer(&self, room: &RoomId, payload: Value);
    async fn send_ice_candidate(&self, room: &RoomId, payload: Value);
}

/// `SignalingOutbound` over a plain message channel, for transports that
/// frame `ClientMessage`s themselves.
pub struct ChannelOutbound {
    tx: mpsc::UnboundedSender<ClientMessage>,
}

impl ChannelOutbound {
    pub fn new(tx: mpsc::UnboundedSender<ClientMessage>) -> Self {
        Self { tx }
    }

    fn send(&self, msg: ClientMessage) {
        if self.tx.send(msg).is_err() {
            debug!("signaling channel closed, message dropped");
        }
    }
}

#[async_trait]
impl SignalingOutbound for ChannelOutbound {
    async fn send_offer(&self, room: &RoomId, payload: Value) {
        self.send(ClientMessage::Offer {
            room: room.clone(),
            payload,
        });
    }

    async fn send_answer(&self, room: &RoomId, payload: Value) {
        self.send(ClientMessage::Answer {
            room: room.clone(),
            payload,
        });
    }

    async fn send_ice_candidate(&self, room: &RoomId, payload: Value) {
        self.send(ClientMessage::IceCandidate {
            room: room.clone(),
            payload,
        });
    }
}
