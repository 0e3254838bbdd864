mod media_backend;
pub mod native;

pub use media_backend::{MediaBackend, NegotiationSession};
pub use native::{NativeBackend, NativeSession, NativeTrack};
