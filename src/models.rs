//! Data models shared between the playback coordinator and the UI surfaces

use std::collections::HashMap;

/// Playback state as reported by the engine. The UI only reads this;
/// transitions happen exclusively through [`PlaybackState::transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Buffering,
    Playing,
    Paused,
    Error,
}

/// Engine-originated signals that drive state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineSignal {
    /// New media was opened and is being prepared.
    Loaded,
    /// The engine stalled waiting for data.
    BufferingStarted,
    /// Enough data is buffered to render.
    ReadyToPlay,
    Played,
    Paused,
    /// End of media reached.
    Finished,
    Stopped,
    Failed,
}

impl PlaybackState {
    /// The single place a playback state may change. Signals that make no
    /// sense for the current state are ignored rather than panicking, since
    /// the engine delivers them asynchronously and may race a user action.
    pub fn transition(self, signal: EngineSignal) -> PlaybackState {
        use PlaybackState::*;

        // Error is absorbing until new media is opened or playback stops.
        if self == Error && !matches!(signal, EngineSignal::Loaded | EngineSignal::Stopped) {
            return Error;
        }

        match signal {
            EngineSignal::Loaded => Buffering,
            EngineSignal::BufferingStarted => match self {
                Idle => Idle,
                _ => Buffering,
            },
            EngineSignal::ReadyToPlay => match self {
                Buffering => Paused,
                other => other,
            },
            EngineSignal::Played => match self {
                Idle => Idle,
                _ => Playing,
            },
            EngineSignal::Paused => match self {
                Playing | Buffering => Paused,
                other => other,
            },
            // End of media is resumable; an explicit stop tears playback down.
            EngineSignal::Finished => match self {
                Idle => Idle,
                _ => Paused,
            },
            EngineSignal::Stopped => Idle,
            EngineSignal::Failed => Error,
        }
    }

    pub fn is_playing(self) -> bool {
        matches!(self, PlaybackState::Playing | PlaybackState::Buffering)
    }
}

/// The one transport indicator shown for a given state; exactly one of
/// these is rendered at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportIndicator {
    /// Play glyph - tapping starts playback.
    Play,
    /// Pause glyph - tapping pauses playback.
    Pause,
    /// Indeterminate spinner while buffering.
    Spinner,
    /// Slashed play glyph; the engine reported an error.
    ErrorSlash,
}

pub fn transport_indicator(state: PlaybackState) -> TransportIndicator {
    match state {
        PlaybackState::Error => TransportIndicator::ErrorSlash,
        PlaybackState::Buffering => TransportIndicator::Spinner,
        PlaybackState::Playing => TransportIndicator::Pause,
        PlaybackState::Idle | PlaybackState::Paused => TransportIndicator::Play,
    }
}

/// Track media kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
    Subtitle,
}

pub type TrackId = i32;

/// Immutable snapshot of a selectable stream component. Re-fetched whenever
/// the engine publishes a new track list.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackDescriptor {
    pub id: TrackId,
    pub label: String,
    pub enabled: bool,
    pub kind: TrackKind,
}

/// Current/total presentation time in seconds. A total of zero signals a
/// live or unbounded stream.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeModel {
    pub current_time: f64,
    pub total_time: f64,
}

impl TimeModel {
    pub fn is_live(&self) -> bool {
        self.total_time == 0.0
    }

    /// Fraction played, clamped to [0, 1]. Zero for live streams.
    pub fn progress(&self) -> f64 {
        if self.is_live() {
            0.0
        } else {
            (self.current_time / self.total_time).clamp(0.0, 1.0)
        }
    }
}

/// Runtime metadata the engine publishes while decoding; shown in the
/// settings window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DynamicInfo {
    pub metadata: HashMap<String, String>,
    pub video_bitrate: u64,
    pub audio_bitrate: u64,
    pub dropped_frames: u64,
    pub fps: f32,
    pub file_size: u64,
}

/// Playback rate choices offered by the rate menu.
pub const PLAYBACK_RATES: &[f32] = &[0.5, 1.0, 1.25, 1.5, 2.0];

/// Format seconds as M:SS below an hour, H:MM:SS at or above.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Format a byte count with a k/M/G suffix for the settings window.
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[(&str, u64)] = &[("G", 1 << 30), ("M", 1 << 20), ("k", 1 << 10)];
    for (suffix, scale) in UNITS {
        if bytes >= *scale {
            return format!("{:.1} {}B", bytes as f64 / *scale as f64, suffix);
        }
    }
    format!("{} B", bytes)
}
