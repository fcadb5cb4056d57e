//! Player engine boundary
//!
//! The coordinator talks to the media engine only through [`PlayerEngine`].
//! The engine runs its own decode thread and reports back through a message
//! channel drained once per UI frame with [`PlayerEngine::poll_events`].

use thiserror::Error;

use crate::models::{DynamicInfo, EngineSignal, TrackDescriptor, TrackId};

/// Decoded video frame handed to the video surface (RGB24).
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    /// Presentation time in seconds.
    pub pts: f64,
}

/// Messages from the engine's decode thread.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    StateChanged(EngineSignal),
    TracksLoaded(Vec<TrackDescriptor>),
    DurationChanged(f64),
    PositionChanged(f64),
    MetadataLoaded(DynamicInfo),
    Error(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to open media: {0}")]
    Open(String),
    #[error("no video stream found")]
    NoVideoStream,
    #[error("failed to create decoder: {0}")]
    Decoder(String),
    #[error("failed to create scaler: {0}")]
    Scaler(String),
    #[error("seek failed: {0}")]
    Seek(String),
}

/// The opaque playback engine the UI layer collaborates with. Commands are
/// fire-and-forget; resulting state transitions arrive asynchronously as
/// [`EngineEvent`]s.
pub trait PlayerEngine: Send {
    /// Open media by URL or path, replacing any current playback.
    fn load(&mut self, url: &str);
    fn play(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    /// Absolute seek in seconds; the engine clamps to `[0, total]`.
    fn seek(&mut self, seconds: f64);
    /// Switch the active track of the given id's kind.
    fn select_track(&mut self, id: TrackId);
    fn set_volume(&mut self, volume: f32);
    fn set_muted(&mut self, muted: bool);
    fn set_rate(&mut self, rate: f32);
    /// False for live/unbounded streams.
    fn seekable(&self) -> bool;
    /// Non-blocking drain of pending engine messages.
    fn poll_events(&mut self) -> Vec<EngineEvent>;
    /// Latest decoded frame, if a new one is available.
    fn take_frame(&mut self) -> Option<VideoFrame>;
}
