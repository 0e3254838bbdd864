use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use huddle_core::{ConnectionId, RoomId, ServerEvent};

use crate::room::RoomDirectory;

/// Sender half of a connection's outbound event queue. The transport task
/// owns the receiving end and writes each event to the wire.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Room membership held by a connection. At most one at a time.
#[derive(Debug, Clone)]
pub struct Membership {
    pub room: RoomId,
    pub display_name: String,
}

struct ConnectionEntry {
    tx: EventSender,
    membership: Option<Membership>,
}

/// Tracks every live transport connection and its current room. Membership
/// here and the room's member set are kept consistent: all room mutations
/// go through the room directory, and unregistering routes the departure
/// through it before the connection state is discarded.
#[derive(Clone)]
pub struct ConnectionRegistry {
    connections: Arc<DashMap<ConnectionId, ConnectionEntry>>,
    directory: RoomDirectory,
}

impl ConnectionRegistry {
    pub fn new(directory: RoomDirectory) -> Self {
        Self {
            connections: Arc::new(DashMap::new()),
            directory,
        }
    }

    pub fn register(&self, tx: EventSender) -> ConnectionId {
        let id = ConnectionId::new();
        self.connections.insert(
            id.clone(),
            ConnectionEntry {
                tx,
                membership: None,
            },
        );
        debug!(connection = %id, "connection registered");
        id
    }

    /// Removes the connection. A held room membership is released first,
    /// with its departure broadcast, so no room retains a stale member.
    pub async fn unregister(&self, id: &ConnectionId) {
        let membership = self.membership(id);
        if let Some(membership) = membership {
            self.directory
                .leave(&membership.room, id, &membership.display_name)
                .await;
        }
        self.connections.remove(id);
        debug!(connection = %id, "connection unregistered");
    }

    pub fn sender(&self, id: &ConnectionId) -> Option<EventSender> {
        self.connections.get(id).map(|entry| entry.tx.clone())
    }

    pub fn membership(&self, id: &ConnectionId) -> Option<Membership> {
        self.connections
            .get(id)
            .and_then(|entry| entry.membership.clone())
    }

    pub fn set_membership(&self, id: &ConnectionId, membership: Membership) {
        if let Some(mut entry) = self.connections.get_mut(id) {
            entry.membership = Some(membership);
        }
    }

    /// Clears the room pointer only when it still references `room`, so a
    /// leave for a stale room cannot erase a newer membership.
    pub fn clear_membership_if(&self, id: &ConnectionId, room: &RoomId) {
        if let Some(mut entry) = self.connections.get_mut(id) {
            if entry
                .membership
                .as_ref()
                .is_some_and(|membership| &membership.room == room)
            {
                entry.membership = None;
            }
        }
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
