mod outbound;

pub use outbound::{ChannelOutbound, SignalingOutbound};
