pub mod registry;
pub mod room;
pub mod signaling;

pub use registry::{ConnectionRegistry, EventSender, Membership};
pub use room::{RoomCommand, RoomDirectory};
pub use signaling::{RelayService, ws_handler};
