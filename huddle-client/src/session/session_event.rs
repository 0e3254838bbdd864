use serde_json::Value;

/// Connection state reported by the transport underneath a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Asynchronous callbacks from the session backend, funneled into the
/// peer session's event loop.
#[derive(Debug)]
pub enum SessionEvent<R> {
    /// A local network path candidate was discovered.
    CandidateReady(Value),

    /// The remote side attached a media track.
    RemoteTrack(R),

    /// The underlying transport changed state.
    StateChanged(TransportState),
}
