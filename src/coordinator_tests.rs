//! Tests for the playback coordinator's externally observed contract

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use crate::coordinator::{CoordinatorEvent, PlaybackCoordinator};
    use crate::engine::{EngineEvent, PlayerEngine, VideoFrame};
    use crate::models::{EngineSignal, PlaybackState, TrackDescriptor, TrackId, TrackKind};
    use crate::subtitle::{SubtitleModel, SubtitleOrigin};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Load(String),
        Play,
        Pause,
        Stop,
        Seek(f64),
        SelectTrack(TrackId),
        SetVolume(f32),
        SetMuted(bool),
        SetRate(f32),
    }

    /// Shared handle to observe engine calls and inject engine events from
    /// the outside while the coordinator owns the engine.
    #[derive(Clone, Default)]
    struct MockHandle {
        calls: Arc<Mutex<Vec<Call>>>,
        events: Arc<Mutex<Vec<EngineEvent>>>,
        seekable: Arc<AtomicBool>,
    }

    impl MockHandle {
        fn push(&self, event: EngineEvent) {
            self.events.lock().unwrap().push(event);
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn seeks(&self) -> Vec<f64> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::Seek(t) => Some(t),
                    _ => None,
                })
                .collect()
        }

        fn set_seekable(&self, seekable: bool) {
            self.seekable.store(seekable, Ordering::Relaxed);
        }
    }

    struct MockEngine {
        handle: MockHandle,
    }

    impl MockEngine {
        fn record(&self, call: Call) {
            self.handle.calls.lock().unwrap().push(call);
        }
    }

    impl PlayerEngine for MockEngine {
        fn load(&mut self, url: &str) {
            self.record(Call::Load(url.to_string()));
        }
        fn play(&mut self) {
            self.record(Call::Play);
        }
        fn pause(&mut self) {
            self.record(Call::Pause);
        }
        fn stop(&mut self) {
            self.record(Call::Stop);
        }
        fn seek(&mut self, seconds: f64) {
            self.record(Call::Seek(seconds));
        }
        fn select_track(&mut self, id: TrackId) {
            self.record(Call::SelectTrack(id));
        }
        fn set_volume(&mut self, volume: f32) {
            self.record(Call::SetVolume(volume));
        }
        fn set_muted(&mut self, muted: bool) {
            self.record(Call::SetMuted(muted));
        }
        fn set_rate(&mut self, rate: f32) {
            self.record(Call::SetRate(rate));
        }
        fn seekable(&self) -> bool {
            self.handle.seekable.load(Ordering::Relaxed)
        }
        fn poll_events(&mut self) -> Vec<EngineEvent> {
            std::mem::take(&mut *self.handle.events.lock().unwrap())
        }
        fn take_frame(&mut self) -> Option<VideoFrame> {
            None
        }
    }

    fn coordinator() -> (PlaybackCoordinator, MockHandle) {
        let handle = MockHandle::default();
        let engine = MockEngine {
            handle: handle.clone(),
        };
        let coordinator =
            PlaybackCoordinator::new(Box::new(engine), SubtitleModel::new(String::new()));
        (coordinator, handle)
    }

    fn track(id: TrackId, kind: TrackKind, enabled: bool) -> TrackDescriptor {
        TrackDescriptor {
            id,
            label: format!("track {}", id),
            enabled,
            kind,
        }
    }

    /// Open media and drive it into the playing state.
    fn start_playing(coordinator: &mut PlaybackCoordinator, handle: &MockHandle) {
        coordinator.open("/videos/movie.mkv");
        handle.push(EngineEvent::DurationChanged(100.0));
        handle.push(EngineEvent::StateChanged(EngineSignal::ReadyToPlay));
        handle.push(EngineEvent::StateChanged(EngineSignal::Played));
        handle.set_seekable(true);
        coordinator.pump();
        assert_eq!(coordinator.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_scrub_issues_exactly_one_seek_on_release() {
        let (mut coordinator, handle) = coordinator();
        start_playing(&mut coordinator, &handle);

        coordinator.begin_scrub();
        coordinator.scrub_to(10.0);
        coordinator.scrub_to(25.0);
        coordinator.scrub_to(40.0);
        assert!(handle.seeks().is_empty(), "drag must not reach the engine");
        // Dragging pauses so the decoder isn't thrashed
        assert!(handle.calls().contains(&Call::Pause));

        coordinator.end_scrub();
        assert_eq!(handle.seeks(), vec![40.0]);
        // Playback resumes because it was playing before the drag
        assert_eq!(handle.calls().last(), Some(&Call::Play));

        // A stray second release does nothing
        coordinator.end_scrub();
        assert_eq!(handle.seeks(), vec![40.0]);
    }

    #[test]
    fn test_click_jump_is_a_single_seek_cycle() {
        // A stationary click on the time bar collapses to an immediate
        // begin/move/end cycle: exactly one seek with the clicked value,
        // playback restored.
        let (mut coordinator, handle) = coordinator();
        start_playing(&mut coordinator, &handle);

        coordinator.begin_scrub();
        coordinator.scrub_to(37.0);
        coordinator.end_scrub();

        assert_eq!(handle.seeks(), vec![37.0]);
        assert_eq!(coordinator.time().current_time, 37.0);
        assert_eq!(handle.calls().last(), Some(&Call::Play));
        assert!(!coordinator.is_scrubbing());
    }

    #[test]
    fn test_scrub_from_paused_does_not_resume() {
        let (mut coordinator, handle) = coordinator();
        start_playing(&mut coordinator, &handle);
        handle.push(EngineEvent::StateChanged(EngineSignal::Paused));
        coordinator.pump();

        let pauses_before = handle
            .calls()
            .iter()
            .filter(|c| **c == Call::Pause)
            .count();
        coordinator.begin_scrub();
        coordinator.scrub_to(60.0);
        coordinator.end_scrub();

        assert_eq!(handle.seeks(), vec![60.0]);
        assert!(!handle.calls().contains(&Call::Play));
        // Already paused, so no second pause either
        let pauses_after = handle
            .calls()
            .iter()
            .filter(|c| **c == Call::Pause)
            .count();
        assert_eq!(pauses_before, pauses_after);
    }

    #[test]
    fn test_drag_position_wins_over_engine_position() {
        let (mut coordinator, handle) = coordinator();
        start_playing(&mut coordinator, &handle);

        coordinator.begin_scrub();
        coordinator.scrub_to(30.0);
        handle.push(EngineEvent::PositionChanged(55.0));
        coordinator.pump();
        assert_eq!(coordinator.time().current_time, 30.0);

        coordinator.end_scrub();
        handle.push(EngineEvent::PositionChanged(55.0));
        coordinator.pump();
        assert_eq!(coordinator.time().current_time, 55.0);
    }

    #[test]
    fn test_scrub_clamps_to_duration() {
        let (mut coordinator, handle) = coordinator();
        start_playing(&mut coordinator, &handle);

        coordinator.begin_scrub();
        coordinator.scrub_to(500.0);
        assert_eq!(coordinator.time().current_time, 100.0);
        coordinator.scrub_to(-10.0);
        assert_eq!(coordinator.time().current_time, 0.0);
        coordinator.end_scrub();
    }

    #[test]
    fn test_select_track_deselects_same_kind_only() {
        let (mut coordinator, handle) = coordinator();
        coordinator.open("/videos/movie.mkv");
        handle.push(EngineEvent::TracksLoaded(vec![
            track(1, TrackKind::Audio, true),
            track(2, TrackKind::Audio, false),
            track(3, TrackKind::Video, true),
        ]));
        coordinator.pump();

        coordinator.select_track(2);
        assert!(handle.calls().contains(&Call::SelectTrack(2)));

        let enabled: Vec<TrackId> = coordinator
            .tracks()
            .iter()
            .filter(|t| t.enabled)
            .map(|t| t.id)
            .collect();
        assert_eq!(enabled, vec![2, 3], "audio switched, video untouched");
    }

    #[test]
    fn test_select_enabled_track_is_idempotent() {
        let (mut coordinator, handle) = coordinator();
        coordinator.open("/videos/movie.mkv");
        handle.push(EngineEvent::TracksLoaded(vec![
            track(1, TrackKind::Audio, true),
            track(2, TrackKind::Audio, false),
        ]));
        coordinator.pump();

        coordinator.select_track(1);
        assert!(!handle.calls().contains(&Call::SelectTrack(1)));

        // Unknown id is ignored
        coordinator.select_track(99);
        assert!(!handle.calls().contains(&Call::SelectTrack(99)));
    }

    #[test]
    fn test_volume_zero_derives_mute_one_way() {
        let (mut coordinator, handle) = coordinator();

        coordinator.set_volume(0.0);
        assert!(coordinator.is_muted());
        assert!(handle.calls().contains(&Call::SetMuted(true)));

        // Un-muting at volume zero sticks; the derivation is one-way
        coordinator.set_muted(false);
        assert!(!coordinator.is_muted());

        coordinator.set_volume(0.5);
        assert!(!coordinator.is_muted(), "raising volume never re-mutes");

        // Volume is clamped
        coordinator.set_volume(3.0);
        assert_eq!(coordinator.volume(), 1.0);
        coordinator.set_volume(-1.0);
        assert_eq!(coordinator.volume(), 0.0);
    }

    #[test]
    fn test_preference_setters_idempotent() {
        let (mut coordinator, handle) = coordinator();
        let events = coordinator.subscribe();

        coordinator.set_rate(1.0); // already the current rate
        coordinator.set_muted(false);
        coordinator.set_aspect_fill(false);
        coordinator.set_volume(1.0);
        assert!(handle.calls().is_empty());
        assert!(events.try_recv().is_err(), "no events for no-op writes");

        coordinator.set_rate(1.5);
        assert_eq!(handle.calls(), vec![Call::SetRate(1.5)]);
        assert_eq!(events.try_recv(), Ok(CoordinatorEvent::PreferenceChanged));
    }

    #[test]
    fn test_engine_failure_surfaces_as_error_state() {
        let (mut coordinator, handle) = coordinator();
        start_playing(&mut coordinator, &handle);

        handle.push(EngineEvent::Error("connection reset".to_string()));
        handle.push(EngineEvent::StateChanged(EngineSignal::Failed));
        coordinator.pump();

        assert_eq!(coordinator.state(), PlaybackState::Error);
        assert_eq!(coordinator.last_error(), Some("connection reset"));

        // Transport is inert in the error state
        let calls_before = handle.calls().len();
        coordinator.toggle_play_pause();
        assert_eq!(handle.calls().len(), calls_before);

        // Opening new media recovers
        coordinator.open("/videos/other.mkv");
        assert_eq!(coordinator.state(), PlaybackState::Buffering);
        assert!(coordinator.last_error().is_none());
    }

    #[test]
    fn test_stop_returns_to_idle_with_inert_transport() {
        let (mut coordinator, handle) = coordinator();
        start_playing(&mut coordinator, &handle);

        coordinator.stop();
        assert_eq!(coordinator.state(), PlaybackState::Idle);
        assert!(handle.calls().contains(&Call::Stop));

        // The engine is torn down; transport taps must not reach it
        let calls_before = handle.calls().len();
        coordinator.toggle_play_pause();
        assert_eq!(handle.calls().len(), calls_before);
    }

    #[test]
    fn test_skip_is_noop_when_not_seekable() {
        let (mut coordinator, handle) = coordinator();
        coordinator.open("http://example.com/live.ts");
        handle.push(EngineEvent::StateChanged(EngineSignal::ReadyToPlay));
        coordinator.pump();
        handle.set_seekable(false);

        coordinator.skip(15.0);
        assert!(handle.seeks().is_empty());
    }

    #[test]
    fn test_skip_is_relative_to_current_time() {
        let (mut coordinator, handle) = coordinator();
        start_playing(&mut coordinator, &handle);
        handle.push(EngineEvent::PositionChanged(50.0));
        coordinator.pump();

        coordinator.skip(15.0);
        assert_eq!(handle.seeks(), vec![65.0]);

        coordinator.skip(-15.0);
        assert_eq!(handle.seeks(), vec![65.0, 50.0]);
    }

    #[test]
    fn test_subscribers_observe_state_changes() {
        let (mut coordinator, handle) = coordinator();
        let events = coordinator.subscribe();

        coordinator.open("/videos/movie.mkv");
        handle.push(EngineEvent::StateChanged(EngineSignal::ReadyToPlay));
        coordinator.pump();

        let seen: Vec<CoordinatorEvent> = events.try_iter().collect();
        assert!(seen.contains(&CoordinatorEvent::StateChanged(PlaybackState::Buffering)));
        assert!(seen.contains(&CoordinatorEvent::StateChanged(PlaybackState::Paused)));
    }

    #[test]
    fn test_dropped_subscriber_does_not_block_publishing() {
        let (mut coordinator, handle) = coordinator();
        let events = coordinator.subscribe();
        drop(events);

        coordinator.open("/videos/movie.mkv");
        handle.push(EngineEvent::StateChanged(EngineSignal::ReadyToPlay));
        coordinator.pump();
        assert_eq!(coordinator.state(), PlaybackState::Paused);
    }

    #[test]
    fn test_embedded_subtitle_tracks_feed_the_subtitle_model() {
        let (mut coordinator, handle) = coordinator();
        coordinator.open("/videos/movie.mkv");
        handle.push(EngineEvent::TracksLoaded(vec![
            track(3, TrackKind::Video, true),
            track(4, TrackKind::Subtitle, false),
        ]));
        coordinator.pump();

        let ids: Vec<&str> = coordinator
            .subtitles()
            .infos()
            .iter()
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(ids, vec!["embedded:4"]);

        coordinator.select_subtitle(Some("embedded:4".to_string()));
        assert!(handle.calls().contains(&Call::SelectTrack(4)));
        assert!(matches!(
            coordinator.subtitles().selected_info().unwrap().origin,
            SubtitleOrigin::Embedded(4)
        ));

        // "Off" clears the active subtitle
        coordinator.select_subtitle(None);
        assert!(coordinator.subtitles().selected().is_none());
    }
}
