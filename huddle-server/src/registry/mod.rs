mod connection_registry;

pub use connection_registry::{ConnectionRegistry, EventSender, Membership};
