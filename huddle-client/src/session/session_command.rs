/// User-initiated actions driving a peer session.
#[derive(Debug)]
pub enum SessionCommand {
    /// Acquire local media and prepare to negotiate.
    Join,

    /// Leave the call and tear the session down.
    Leave,

    ToggleAudio,
    ToggleVideo,

    /// Substitute the outgoing video with a screen capture.
    StartScreenShare,

    /// Restore the camera as the outgoing video.
    StopScreenShare,
}
