use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use huddle_core::{
    ClientMessage, ConnectionId, IceServerConfig, RoomId, ServerEvent, SignalKind,
    SignalingEnvelope,
};

use crate::registry::{ConnectionRegistry, EventSender, Membership};
use crate::room::{RoomCommand, RoomDirectory};

/// Routes validated client messages into rooms and owns the connection
/// lifecycle at the transport boundary. Payloads pass through untouched;
/// the only field the relay injects is the sender's connection identity.
#[derive(Clone)]
pub struct RelayService {
    registry: ConnectionRegistry,
    directory: RoomDirectory,
    ice_servers: Arc<Vec<IceServerConfig>>,
}

impl RelayService {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        let directory = RoomDirectory::new();
        Self {
            registry: ConnectionRegistry::new(directory.clone()),
            directory,
            ice_servers: Arc::new(ice_servers),
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn directory(&self) -> &RoomDirectory {
        &self.directory
    }

    /// Registers a transport connection and queues its welcome event.
    pub fn connect(&self, tx: EventSender) -> ConnectionId {
        let id = self.registry.register(tx.clone());
        let welcome = ServerEvent::Welcome {
            connection_id: id.clone(),
            ice_servers: (*self.ice_servers).clone(),
        };
        let _ = tx.send(welcome);
        info!(connection = %id, "connection established");
        id
    }

    /// Transport closed: implicit leave with departure broadcast.
    pub async fn disconnect(&self, id: &ConnectionId) {
        self.registry.unregister(id).await;
        info!(connection = %id, "connection closed");
    }

    pub async fn handle_message(&self, id: &ConnectionId, msg: ClientMessage) {
        match msg {
            ClientMessage::Join { room, name } => self.join(id, room, name).await,
            ClientMessage::Leave { room, name } => self.leave(id, &room, &name).await,
            ClientMessage::Chat { room, sender, body } => {
                if !check_room(&room) {
                    return;
                }
                self.directory
                    .dispatch(
                        &room,
                        RoomCommand::Chat {
                            sender_id: id.clone(),
                            sender,
                            body,
                        },
                    )
                    .await;
            }
            ClientMessage::Offer { room, payload } => {
                self.signal(id, room, SignalKind::Offer, payload).await;
            }
            ClientMessage::Answer { room, payload } => {
                self.signal(id, room, SignalKind::Answer, payload).await;
            }
            ClientMessage::IceCandidate { room, payload } => {
                self.signal(id, room, SignalKind::IceCandidate, payload).await;
            }
        }
    }

    async fn join(&self, id: &ConnectionId, room: RoomId, name: String) {
        if !check_room(&room) {
            return;
        }
        let Some(tx) = self.registry.sender(id) else {
            warn!(connection = %id, "join from unregistered connection");
            return;
        };

        // One room at a time: joining a new room leaves the previous one,
        // departure broadcast included.
        if let Some(previous) = self.registry.membership(id) {
            if previous.room != room {
                self.directory
                    .leave(&previous.room, id, &previous.display_name)
                    .await;
            }
        }

        self.directory.join(&room, id, &name, tx).await;
        self.registry.set_membership(
            id,
            Membership {
                room: room.clone(),
                display_name: name,
            },
        );
        info!(connection = %id, room = %room, "joined room");
    }

    async fn leave(&self, id: &ConnectionId, room: &RoomId, name: &str) {
        if !check_room(room) {
            return;
        }
        self.directory.leave(room, id, name).await;
        self.registry.clear_membership_if(id, room);
        info!(connection = %id, room = %room, "left room");
    }

    async fn signal(&self, id: &ConnectionId, room: RoomId, kind: SignalKind, payload: Value) {
        if !check_room(&room) {
            return;
        }
        let envelope = SignalingEnvelope {
            kind,
            room: room.clone(),
            sender: id.clone(),
            payload,
        };
        self.directory
            .dispatch(&room, RoomCommand::Signal(envelope))
            .await;
    }
}

fn check_room(room: &RoomId) -> bool {
    if room.is_valid() {
        true
    } else {
        warn!("ignoring operation with malformed room id");
        false
    }
}
