use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info};

use huddle_core::{ConnectionId, RoomId, ServerEvent};

use crate::room::room_command::RoomCommand;
use crate::room::room_directory::RoomDirectory;

struct Member {
    name: String,
    tx: mpsc::UnboundedSender<ServerEvent>,
}

/// A single room's event loop. Every membership mutation and fan-out for
/// the room passes through this task, so delivery order to each member
/// matches the relay's receipt order.
pub(crate) struct Room {
    room_id: RoomId,
    members: HashMap<ConnectionId, Member>,
    command_rx: mpsc::Receiver<RoomCommand>,
    command_tx: mpsc::Sender<RoomCommand>,
    directory: RoomDirectory,
}

impl Room {
    pub(crate) fn new(
        room_id: RoomId,
        command_rx: mpsc::Receiver<RoomCommand>,
        command_tx: mpsc::Sender<RoomCommand>,
        directory: RoomDirectory,
    ) -> Self {
        Self {
            room_id,
            members: HashMap::new(),
            command_rx,
            command_tx,
            directory,
        }
    }

    pub(crate) async fn run(mut self) {
        info!(room = %self.room_id, "room event loop started");

        loop {
            let Some(cmd) = self.command_rx.recv().await else {
                break;
            };
            self.handle_command(cmd);

            if self.members.is_empty() {
                self.retire().await;
                break;
            }
        }

        info!(room = %self.room_id, "room event loop finished");
    }

    fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join {
                connection_id,
                name,
                tx,
            } => {
                // announce current members to the newcomer; the joiner
                // never hears its own join
                for (id, member) in &self.members {
                    if id == &connection_id {
                        continue;
                    }
                    let _ = tx.send(ServerEvent::PeerJoined {
                        name: member.name.clone(),
                    });
                }

                let rejoined = self
                    .members
                    .insert(
                        connection_id.clone(),
                        Member {
                            name: name.clone(),
                            tx,
                        },
                    )
                    .is_some();
                if rejoined {
                    debug!(room = %self.room_id, connection = %connection_id, "duplicate join, presence re-broadcast");
                }
                self.broadcast_except(&connection_id, ServerEvent::PeerJoined { name });
            }

            RoomCommand::Leave {
                connection_id,
                name,
            } => {
                if self.members.remove(&connection_id).is_some() {
                    self.broadcast_except(&connection_id, ServerEvent::PeerLeft { name });
                }
            }

            RoomCommand::Chat {
                sender_id,
                sender,
                body,
            } => {
                self.broadcast_except(&sender_id, ServerEvent::Chat { sender, body });
            }

            RoomCommand::Signal(envelope) => {
                let sender_id = envelope.sender.clone();
                self.broadcast_except(&sender_id, ServerEvent::from_envelope(envelope));
            }

            RoomCommand::Members { reply } => {
                let _ = reply.send(self.members.keys().cloned().collect());
            }
        }
    }

    fn broadcast_except(&self, skip: &ConnectionId, event: ServerEvent) {
        for (id, member) in &self.members {
            if id == skip {
                continue;
            }
            if member.tx.send(event.clone()).is_err() {
                // receiver side is tearing down; disconnect handling prunes it
                debug!(room = %self.room_id, connection = %id, "dropped event for closed connection");
            }
        }
    }

    /// Reclaims the empty room. The directory entry is vacated first and
    /// the command channel closed, so later sends fail and retry against a
    /// fresh actor; anything that slipped into the queue meanwhile is
    /// redelivered through the directory instead of being lost.
    async fn retire(&mut self) {
        self.directory.forget(&self.room_id, &self.command_tx);
        self.command_rx.close();

        while let Some(cmd) = self.command_rx.recv().await {
            self.redeliver(cmd).await;
        }

        info!(room = %self.room_id, "room reclaimed");
    }

    async fn redeliver(&self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join {
                connection_id,
                name,
                tx,
            } => {
                self.directory
                    .join(&self.room_id, &connection_id, &name, tx)
                    .await;
            }
            RoomCommand::Members { reply } => {
                let _ = reply.send(Vec::new());
            }
            // chat, signals, and leaves aimed at an empty room are no-ops
            _ => {}
        }
    }
}
