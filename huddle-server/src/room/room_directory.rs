use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::info;

use huddle_core::{ConnectionId, RoomId, ServerEvent};

use crate::room::room::Room;
use crate::room::room_command::RoomCommand;

/// Maps room identifiers to live room actors. Rooms are created implicitly
/// on first join and reclaim themselves once their member set empties.
#[derive(Clone)]
pub struct RoomDirectory {
    rooms: Arc<DashMap<String, mpsc::Sender<RoomCommand>>>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
        }
    }

    /// Adds the connection to the room, creating the room if needed. A send
    /// that loses the race against a retiring actor retries on a fresh one,
    /// so a join never lands in a reclaimed room.
    pub async fn join(
        &self,
        room: &RoomId,
        connection_id: &ConnectionId,
        name: &str,
        tx: mpsc::UnboundedSender<ServerEvent>,
    ) {
        let mut cmd = RoomCommand::Join {
            connection_id: connection_id.clone(),
            name: name.to_owned(),
            tx,
        };
        loop {
            let sender = self.sender_or_create(room);
            match sender.send(cmd).await {
                Ok(()) => return,
                Err(mpsc::error::SendError(returned)) => cmd = returned,
            }
        }
    }

    pub async fn leave(&self, room: &RoomId, connection_id: &ConnectionId, name: &str) {
        self.dispatch(
            room,
            RoomCommand::Leave {
                connection_id: connection_id.clone(),
                name: name.to_owned(),
            },
        )
        .await;
    }

    /// Routes a command to an existing room. Unknown rooms are a silent
    /// no-op: a message into an empty room has zero deliveries by contract.
    pub async fn dispatch(&self, room: &RoomId, cmd: RoomCommand) {
        let Some(sender) = self.rooms.get(room.as_str()).map(|entry| entry.value().clone())
        else {
            return;
        };
        let _ = sender.send(cmd).await;
    }

    /// Current member set of a room; empty when the room does not exist.
    pub async fn members_of(&self, room: &RoomId) -> Vec<ConnectionId> {
        let (reply, rx) = oneshot::channel();
        self.dispatch(room, RoomCommand::Members { reply }).await;
        rx.await.unwrap_or_default()
    }

    pub fn contains(&self, room: &RoomId) -> bool {
        self.rooms.contains_key(room.as_str())
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    fn sender_or_create(&self, room: &RoomId) -> mpsc::Sender<RoomCommand> {
        match self.rooms.entry(room.as_str().to_owned()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_closed() {
                    let tx = self.spawn_room(room);
                    occupied.insert(tx.clone());
                    tx
                } else {
                    occupied.get().clone()
                }
            }
            Entry::Vacant(vacant) => {
                let tx = self.spawn_room(room);
                vacant.insert(tx.clone());
                tx
            }
        }
    }

    /// Vacates a room's entry, but only while it still belongs to the
    /// retiring actor identified by `tx`.
    pub(crate) fn forget(&self, room: &RoomId, tx: &mpsc::Sender<RoomCommand>) {
        self.rooms
            .remove_if(room.as_str(), |_, existing| existing.same_channel(tx));
    }

    fn spawn_room(&self, room: &RoomId) -> mpsc::Sender<RoomCommand> {
        info!(room = %room, "creating room");
        let (tx, rx) = mpsc::channel(128);
        let actor = Room::new(room.clone(), rx, tx.clone(), self.clone());
        tokio::spawn(actor.run());
        tx
    }
}

impl Default for RoomDirectory {
    fn default() -> Self {
        Self::new()
    }
}
