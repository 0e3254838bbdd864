#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Audio,
    Video,
}

/// Handle to a local capture track. Enablement is toggled in place; a
/// disabled track mutes without renegotiation. `stop` releases the
/// underlying capture and is terminal.
pub trait MediaTrack: Send + Sync + Clone + 'static {
    fn kind(&self) -> TrackKind;
    fn set_enabled(&self, enabled: bool);
    fn is_enabled(&self) -> bool;
    fn stop(&self);
}

/// Captured microphone and camera pair, owned exclusively by one peer
/// session.
pub struct LocalMedia<T: MediaTrack> {
    pub audio: T,
    pub video: T,
}

impl<T: MediaTrack> LocalMedia<T> {
    pub fn new(audio: T, video: T) -> Self {
        Self { audio, video }
    }

    /// Flips the microphone and returns the new enabled state.
    pub fn toggle_audio(&self) -> bool {
        let enabled = !self.audio.is_enabled();
        self.audio.set_enabled(enabled);
        enabled
    }

    /// Flips the camera and returns the new enabled state.
    pub fn toggle_video(&self) -> bool {
        let enabled = !self.video.is_enabled();
        self.video.set_enabled(enabled);
        enabled
    }

    pub fn stop(&self) {
        self.audio.stop();
        self.video.stop();
    }
}
