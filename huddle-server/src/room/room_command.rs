use tokio::sync::{mpsc, oneshot};

use huddle_core::{ConnectionId, ServerEvent, SignalingEnvelope};

/// Commands entering a room's event loop from the relay.
#[derive(Debug)]
pub enum RoomCommand {
    /// A connection joins the room. Membership is idempotent, but presence
    /// is re-broadcast even when the member was already present.
    Join {
        connection_id: ConnectionId,
        name: String,
        tx: mpsc::UnboundedSender<ServerEvent>,
    },

    /// A connection leaves. Non-members are ignored without broadcast.
    Leave {
        connection_id: ConnectionId,
        name: String,
    },

    /// Room-scoped chat, delivered to every member except the sender.
    Chat {
        sender_id: ConnectionId,
        sender: String,
        body: String,
    },

    /// A negotiation message, delivered to every member except the sender
    /// and tagged with the sender's connection identity.
    Signal(SignalingEnvelope),

    /// Snapshot of the current member set.
    Members {
        reply: oneshot::Sender<Vec<ConnectionId>>,
    },
}
