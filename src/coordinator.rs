//! Playback coordinator
//!
//! The one mutable playback object in the application. It owns the engine,
//! the time/track/subtitle sub-models and the user preferences; every UI
//! surface reads from it and writes back through its operations. Observers
//! subscribe to a channel of [`CoordinatorEvent`]s; the engine feeds it
//! asynchronously through [`PlaybackCoordinator::pump`], called once per
//! frame on the UI thread.

use std::sync::mpsc::{channel, Receiver, Sender};

use tracing::{debug, info, warn};

use crate::engine::{EngineEvent, PlayerEngine, VideoFrame};
use crate::models::{
    DynamicInfo, EngineSignal, PlaybackState, TimeModel, TrackDescriptor, TrackId, TrackKind,
};
use crate::subtitle::{SubtitleId, SubtitleInfo, SubtitleModel, SubtitleOrigin};

/// Published to subscribers whenever observable state changes.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinatorEvent {
    StateChanged(PlaybackState),
    TimeChanged(TimeModel),
    TracksChanged,
    TrackSelected(TrackId),
    SubtitlesChanged,
    SubtitleSelected(Option<SubtitleId>),
    PreferenceChanged,
    MetadataLoaded,
    EngineError(String),
}

/// Seek-slider interaction. Dragging must never reach the engine; only the
/// release does, as a single absolute seek.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ScrubState {
    Idle,
    Scrubbing { resume_on_release: bool },
}

pub struct PlaybackCoordinator {
    engine: Box<dyn PlayerEngine>,
    state: PlaybackState,
    time: TimeModel,
    tracks: Vec<TrackDescriptor>,
    info: DynamicInfo,
    subtitles: SubtitleModel,
    url: Option<String>,
    last_error: Option<String>,
    scrub: ScrubState,

    // Preferences; setters are idempotent when handed the current value.
    muted: bool,
    aspect_fill: bool,
    rate: f32,
    volume: f32,

    subscribers: Vec<Sender<CoordinatorEvent>>,
}

impl PlaybackCoordinator {
    pub fn new(engine: Box<dyn PlayerEngine>, subtitles: SubtitleModel) -> Self {
        Self {
            engine,
            state: PlaybackState::Idle,
            time: TimeModel::default(),
            tracks: Vec::new(),
            info: DynamicInfo::default(),
            subtitles,
            url: None,
            last_error: None,
            scrub: ScrubState::Idle,
            muted: false,
            aspect_fill: false,
            rate: 1.0,
            volume: 1.0,
            subscribers: Vec::new(),
        }
    }

    /// Register an observer. Receivers that hang up are pruned on the next
    /// publish.
    pub fn subscribe(&mut self) -> Receiver<CoordinatorEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    fn publish(&mut self, event: CoordinatorEvent) {
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    // --- media lifecycle -------------------------------------------------

    /// Open media by URL or path, replacing current playback.
    pub fn open(&mut self, url: &str) {
        info!(url, "opening media");
        self.engine.load(url);
        self.url = Some(url.to_string());
        self.state = self.state.transition(EngineSignal::Loaded);
        self.time = TimeModel::default();
        self.tracks.clear();
        self.info = DynamicInfo::default();
        self.last_error = None;
        self.scrub = ScrubState::Idle;
        self.subtitles.reload(url, Vec::new());

        let state = self.state;
        let time = self.time;
        self.publish(CoordinatorEvent::StateChanged(state));
        self.publish(CoordinatorEvent::TimeChanged(time));
        self.publish(CoordinatorEvent::TracksChanged);
        self.publish(CoordinatorEvent::SubtitlesChanged);
    }

    pub fn play(&mut self) {
        if matches!(self.state, PlaybackState::Idle | PlaybackState::Error) {
            return;
        }
        self.engine.play();
    }

    pub fn pause(&mut self) {
        if matches!(self.state, PlaybackState::Idle | PlaybackState::Error) {
            return;
        }
        self.engine.pause();
    }

    pub fn toggle_play_pause(&mut self) {
        if self.state.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn stop(&mut self) {
        self.engine.stop();
        self.state = self.state.transition(EngineSignal::Stopped);
        let state = self.state;
        self.publish(CoordinatorEvent::StateChanged(state));
    }

    // --- seeking ----------------------------------------------------------

    /// Relative seek; a no-op for unseekable (live) media. The engine clamps
    /// the absolute target, the coordinator only clamps its displayed time.
    pub fn skip(&mut self, interval: f64) {
        if !self.engine.seekable() {
            return;
        }
        let target = self.time.current_time + interval;
        self.seek(target);
    }

    /// Absolute seek. Invoked by skip buttons and by scrub release, never
    /// during a drag.
    pub fn seek(&mut self, time: f64) {
        debug!(time, "seek");
        self.engine.seek(time);
        self.time.current_time = if self.time.is_live() {
            time.max(0.0)
        } else {
            time.clamp(0.0, self.time.total_time)
        };
        let new_time = self.time;
        self.publish(CoordinatorEvent::TimeChanged(new_time));
    }

    /// Slider drag started: pause playback so the decoder isn't thrashed,
    /// remember whether to resume on release.
    pub fn begin_scrub(&mut self) {
        if matches!(self.scrub, ScrubState::Scrubbing { .. }) {
            return;
        }
        let resume_on_release = self.state == PlaybackState::Playing;
        if resume_on_release {
            self.engine.pause();
        }
        self.scrub = ScrubState::Scrubbing { resume_on_release };
        debug!(resume_on_release, "scrub started");
    }

    /// Slider moved during a drag: only the displayed time changes.
    pub fn scrub_to(&mut self, time: f64) {
        if !matches!(self.scrub, ScrubState::Scrubbing { .. }) {
            return;
        }
        self.time.current_time = if self.time.is_live() {
            time.max(0.0)
        } else {
            time.clamp(0.0, self.time.total_time)
        };
        let new_time = self.time;
        self.publish(CoordinatorEvent::TimeChanged(new_time));
    }

    /// Slider released: exactly one engine seek with the released value.
    pub fn end_scrub(&mut self) {
        let ScrubState::Scrubbing { resume_on_release } = self.scrub else {
            return;
        };
        self.scrub = ScrubState::Idle;
        let released = self.time.current_time;
        self.seek(released);
        if resume_on_release {
            self.engine.play();
        }
    }

    pub fn is_scrubbing(&self) -> bool {
        matches!(self.scrub, ScrubState::Scrubbing { .. })
    }

    // --- tracks and subtitles ----------------------------------------------

    /// Switch the active track of the given track's kind. Selecting the
    /// already-enabled track is a no-op.
    pub fn select_track(&mut self, id: TrackId) {
        let Some(kind) = self
            .tracks
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.kind)
        else {
            return;
        };
        if self
            .tracks
            .iter()
            .any(|t| t.id == id && t.enabled)
        {
            return;
        }
        info!(id, ?kind, "selecting track");
        self.engine.select_track(id);
        // Apply exclusivity locally; the engine confirms with a fresh list.
        for track in self.tracks.iter_mut().filter(|t| t.kind == kind) {
            track.enabled = track.id == id;
        }
        self.publish(CoordinatorEvent::TrackSelected(id));
        self.publish(CoordinatorEvent::TracksChanged);
    }

    /// Select a subtitle by id, or `None` for "Off". Embedded subtitles are
    /// also routed through track selection so the engine switches streams.
    pub fn select_subtitle(&mut self, id: Option<SubtitleId>) {
        let embedded_track = match self.subtitles.select(id) {
            Some(info) => {
                info!(name = %info.name, "subtitle selected");
                match info.origin {
                    SubtitleOrigin::Embedded(track_id) => Some(track_id),
                    _ => None,
                }
            }
            None => None,
        };
        if let Some(track_id) = embedded_track {
            self.select_track(track_id);
        }
        let selected = self.subtitles.selected().cloned();
        self.publish(CoordinatorEvent::SubtitleSelected(selected));
    }

    // --- preferences --------------------------------------------------------

    pub fn set_muted(&mut self, muted: bool) {
        if muted == self.muted {
            return;
        }
        self.muted = muted;
        self.engine.set_muted(muted);
        self.publish(CoordinatorEvent::PreferenceChanged);
    }

    pub fn toggle_muted(&mut self) {
        let muted = self.muted;
        self.set_muted(!muted);
    }

    /// Set the playback volume, clamped to [0, 1]. Reaching zero derives
    /// `muted = true`; the reverse is never derived (raising the volume does
    /// not un-mute).
    pub fn set_volume(&mut self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        if volume == self.volume {
            return;
        }
        self.volume = volume;
        self.engine.set_volume(volume);
        if volume == 0.0 && !self.muted {
            self.muted = true;
            self.engine.set_muted(true);
        }
        self.publish(CoordinatorEvent::PreferenceChanged);
    }

    pub fn set_rate(&mut self, rate: f32) {
        if rate <= 0.0 || rate == self.rate {
            return;
        }
        self.rate = rate;
        self.engine.set_rate(rate);
        self.publish(CoordinatorEvent::PreferenceChanged);
    }

    pub fn set_aspect_fill(&mut self, aspect_fill: bool) {
        if aspect_fill == self.aspect_fill {
            return;
        }
        self.aspect_fill = aspect_fill;
        self.publish(CoordinatorEvent::PreferenceChanged);
    }

    pub fn toggle_aspect_fill(&mut self) {
        let fill = self.aspect_fill;
        self.set_aspect_fill(!fill);
    }

    // --- engine event pump ---------------------------------------------------

    /// Drain pending engine events and apply them. Call once per UI frame.
    pub fn pump(&mut self) {
        for event in self.engine.poll_events() {
            match event {
                EngineEvent::StateChanged(signal) => {
                    let next = self.state.transition(signal);
                    if next != self.state {
                        debug!(?signal, from = ?self.state, to = ?next, "state transition");
                        self.state = next;
                        self.publish(CoordinatorEvent::StateChanged(next));
                    }
                }
                EngineEvent::TracksLoaded(tracks) => {
                    let embedded: Vec<SubtitleInfo> = tracks
                        .iter()
                        .filter(|t| t.kind == TrackKind::Subtitle)
                        .map(|t| SubtitleInfo {
                            id: format!("embedded:{}", t.id),
                            name: t.label.clone(),
                            origin: SubtitleOrigin::Embedded(t.id),
                        })
                        .collect();
                    self.tracks = tracks;
                    if !embedded.is_empty() {
                        self.subtitles.merge(embedded);
                        self.publish(CoordinatorEvent::SubtitlesChanged);
                    }
                    self.publish(CoordinatorEvent::TracksChanged);
                }
                EngineEvent::DurationChanged(total) => {
                    self.time.total_time = total.max(0.0);
                    let time = self.time;
                    self.publish(CoordinatorEvent::TimeChanged(time));
                }
                EngineEvent::PositionChanged(position) => {
                    // The drag position wins while scrubbing.
                    if !self.is_scrubbing() {
                        self.time.current_time = position;
                        let time = self.time;
                        self.publish(CoordinatorEvent::TimeChanged(time));
                    }
                }
                EngineEvent::MetadataLoaded(info) => {
                    self.info = info;
                    self.publish(CoordinatorEvent::MetadataLoaded);
                }
                EngineEvent::Error(message) => {
                    warn!(error = %message, "engine error");
                    self.last_error = Some(message.clone());
                    self.publish(CoordinatorEvent::EngineError(message));
                }
            }
        }
        if self.subtitles.poll_search() {
            self.publish(CoordinatorEvent::SubtitlesChanged);
        }
    }

    // --- read access for the views ---------------------------------------------

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn time(&self) -> TimeModel {
        self.time
    }

    pub fn tracks(&self) -> &[TrackDescriptor] {
        &self.tracks
    }

    pub fn tracks_of(&self, kind: TrackKind) -> impl Iterator<Item = &TrackDescriptor> {
        self.tracks.iter().filter(move |t| t.kind == kind)
    }

    pub fn selected_track(&self, kind: TrackKind) -> Option<&TrackDescriptor> {
        self.tracks.iter().find(|t| t.kind == kind && t.enabled)
    }

    pub fn subtitles(&self) -> &SubtitleModel {
        &self.subtitles
    }

    pub fn subtitles_mut(&mut self) -> &mut SubtitleModel {
        &mut self.subtitles
    }

    pub fn dynamic_info(&self) -> &DynamicInfo {
        &self.info
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn seekable(&self) -> bool {
        self.engine.seekable()
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn aspect_fill(&self) -> bool {
        self.aspect_fill
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Latest decoded frame for the video surface.
    pub fn take_frame(&mut self) -> Option<VideoFrame> {
        self.engine.take_frame()
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
