// Internal video engine using ffmpeg-next
// Requires FFmpeg libraries: libavcodec, libavformat, libavutil, libswscale
//
// To install FFmpeg development libraries:
// - Ubuntu/Debian: sudo apt install libavcodec-dev libavformat-dev libavutil-dev libswscale-dev libavdevice-dev
// - Fedora: sudo dnf install ffmpeg-devel
// - macOS: brew install ffmpeg
// - Windows: Download from https://ffmpeg.org and set FFMPEG_DIR environment variable

#[cfg(feature = "internal-player")]
mod engine_impl {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::{Duration, Instant};

    extern crate ffmpeg_next as ffmpeg;
    use ffmpeg::format::Pixel;
    use ffmpeg::media::Type;
    use ffmpeg::software::scaling::{context::Context as ScalingContext, flag::Flags};
    use ffmpeg::util::frame::video::Video as RawFrame;

    use crate::engine::{EngineError, EngineEvent, PlayerEngine, VideoFrame};
    use crate::models::{DynamicInfo, EngineSignal, TrackDescriptor, TrackId, TrackKind};

    const AV_TIME_BASE: f64 = 1_000_000.0;

    /// Commands sent into the decode thread
    enum Command {
        Stop,
        Pause,
        Resume,
        Seek(f64),
        SelectTrack(TrackId),
        SetRate(f32),
    }

    /// Internal ffmpeg-backed engine
    pub struct FfmpegEngine {
        command_sender: Option<Sender<Command>>,
        event_receiver: Option<Receiver<EngineEvent>>,
        current_frame: Arc<Mutex<Option<VideoFrame>>>,
        seekable: Arc<AtomicBool>,
        url: String,
        volume: f32,
        muted: bool,
        rate: f32,
    }

    impl FfmpegEngine {
        pub fn new() -> Self {
            ffmpeg::init().ok();

            Self {
                command_sender: None,
                event_receiver: None,
                current_frame: Arc::new(Mutex::new(None)),
                seekable: Arc::new(AtomicBool::new(false)),
                url: String::new(),
                volume: 1.0,
                muted: false,
                rate: 1.0,
            }
        }

        fn send(&self, command: Command) {
            if let Some(ref sender) = self.command_sender {
                let _ = sender.send(command);
            }
        }

        fn decode_thread(
            url: String,
            rate: f32,
            current_frame: Arc<Mutex<Option<VideoFrame>>>,
            seekable: Arc<AtomicBool>,
            cmd_rx: Receiver<Command>,
            event_tx: Sender<EngineEvent>,
        ) {
            let fail = |tx: &Sender<EngineEvent>, e: EngineError| {
                let _ = tx.send(EngineEvent::Error(e.to_string()));
                let _ = tx.send(EngineEvent::StateChanged(EngineSignal::Failed));
            };

            // Options for network streams
            let mut options = ffmpeg::Dictionary::new();
            options.set("reconnect", "1");
            options.set("reconnect_streamed", "1");
            options.set("reconnect_delay_max", "5");
            options.set("timeout", "5000000");

            let mut ictx = match ffmpeg::format::input_with_dictionary(&url, options) {
                Ok(ctx) => ctx,
                Err(e) => {
                    fail(&event_tx, EngineError::Open(e.to_string()));
                    return;
                }
            };

            // Track enumeration from the format context
            let mut tracks = Vec::new();
            for stream in ictx.streams() {
                let kind = match stream.parameters().medium() {
                    Type::Video => TrackKind::Video,
                    Type::Audio => TrackKind::Audio,
                    Type::Subtitle => TrackKind::Subtitle,
                    _ => continue,
                };
                let language = stream
                    .metadata()
                    .get("language")
                    .unwrap_or("und")
                    .to_string();
                let codec = format!("{:?}", stream.parameters().id());
                tracks.push(TrackDescriptor {
                    id: stream.index() as TrackId,
                    label: format!("{} ({})", codec, language),
                    enabled: false,
                    kind,
                });
            }

            let video_stream_index = match ictx.streams().best(Type::Video) {
                Some(stream) => stream.index(),
                None => {
                    fail(&event_tx, EngineError::NoVideoStream);
                    return;
                }
            };
            // Default-enable the best stream of each kind
            if let Some(best_audio) = ictx.streams().best(Type::Audio).map(|s| s.index()) {
                mark_enabled(&mut tracks, best_audio as TrackId);
            }
            mark_enabled(&mut tracks, video_stream_index as TrackId);

            let duration = ictx.duration();
            let total_secs = if duration > 0 {
                duration as f64 / AV_TIME_BASE
            } else {
                0.0
            };
            seekable.store(total_secs > 0.0, Ordering::Relaxed);

            let mut video_index = video_stream_index;
            let (mut decoder, mut time_base, mut fps) =
                match open_video_decoder(&ictx, video_index) {
                    Ok(parts) => parts,
                    Err(e) => {
                        fail(&event_tx, e);
                        return;
                    }
                };

            let mut scaler = match make_scaler(&decoder) {
                Ok(s) => s,
                Err(e) => {
                    fail(&event_tx, e);
                    return;
                }
            };

            // File size only makes sense for local media
            let file_size = std::fs::metadata(&url).map(|m| m.len()).unwrap_or(0);
            let mut info = DynamicInfo {
                metadata: dictionary_to_map(&ictx.metadata()),
                video_bitrate: decoder.bit_rate() as u64,
                audio_bitrate: 0,
                dropped_frames: 0,
                fps,
                file_size,
            };

            let _ = event_tx.send(EngineEvent::TracksLoaded(tracks.clone()));
            let _ = event_tx.send(EngineEvent::DurationChanged(total_secs));
            let _ = event_tx.send(EngineEvent::MetadataLoaded(info.clone()));
            let _ = event_tx.send(EngineEvent::StateChanged(EngineSignal::ReadyToPlay));

            let mut dropped: u64 = 0;
            let mut paused = true;
            let mut rate = if rate > 0.0 { rate } else { 1.0 };
            let mut last_frame_time = Instant::now();
            let mut last_info_update = Instant::now();

            loop {
                // Drain pending commands before touching the demuxer
                let mut pending_seek: Option<f64> = None;
                loop {
                    match cmd_rx.try_recv() {
                        Ok(Command::Stop) => {
                            let _ = event_tx.send(EngineEvent::StateChanged(EngineSignal::Stopped));
                            return;
                        }
                        Ok(Command::Pause) => {
                            paused = true;
                            let _ = event_tx.send(EngineEvent::StateChanged(EngineSignal::Paused));
                        }
                        Ok(Command::Resume) => {
                            paused = false;
                            last_frame_time = Instant::now();
                            let _ = event_tx.send(EngineEvent::StateChanged(EngineSignal::Played));
                        }
                        Ok(Command::Seek(secs)) => pending_seek = Some(secs),
                        Ok(Command::SetRate(r)) => {
                            if r > 0.0 {
                                rate = r;
                            }
                        }
                        Ok(Command::SelectTrack(id)) => {
                            mark_enabled(&mut tracks, id);
                            let _ = event_tx.send(EngineEvent::TracksLoaded(tracks.clone()));
                            let is_video = tracks
                                .iter()
                                .any(|t| t.id == id && t.kind == TrackKind::Video);
                            if is_video && id as usize != video_index {
                                match open_video_decoder(&ictx, id as usize) {
                                    Ok((d, tb, f)) => {
                                        video_index = id as usize;
                                        decoder = d;
                                        time_base = tb;
                                        fps = f;
                                        info.fps = f;
                                        info.video_bitrate = decoder.bit_rate() as u64;
                                        match make_scaler(&decoder) {
                                            Ok(s) => scaler = s,
                                            Err(e) => {
                                                fail(&event_tx, e);
                                                return;
                                            }
                                        }
                                    }
                                    Err(e) => {
                                        let _ = event_tx.send(EngineEvent::Error(e.to_string()));
                                    }
                                }
                            }
                        }
                        Err(TryRecvError::Empty) => break,
                        Err(TryRecvError::Disconnected) => return,
                    }
                }

                if let Some(secs) = pending_seek {
                    let clamped = if total_secs > 0.0 {
                        secs.clamp(0.0, total_secs)
                    } else {
                        secs.max(0.0)
                    };
                    let ts = (clamped * AV_TIME_BASE) as i64;
                    match ictx.seek(ts, ..ts) {
                        Ok(()) => {
                            decoder.flush();
                            let _ = event_tx.send(EngineEvent::PositionChanged(clamped));
                        }
                        Err(e) => {
                            let _ = event_tx
                                .send(EngineEvent::Error(EngineError::Seek(e.to_string()).to_string()));
                        }
                    }
                }

                if paused {
                    thread::sleep(Duration::from_millis(50));
                    continue;
                }

                // Pull one packet; a fresh iterator each pass keeps the
                // demuxer borrow short enough to allow seeks above.
                let packet = match ictx.packets().next() {
                    Some((stream, packet)) => {
                        if stream.index() != video_index {
                            continue;
                        }
                        packet
                    }
                    None => {
                        let _ = event_tx.send(EngineEvent::StateChanged(EngineSignal::Finished));
                        return;
                    }
                };

                if decoder.send_packet(&packet).is_err() {
                    continue;
                }

                let mut decoded = RawFrame::empty();
                while decoder.receive_frame(&mut decoded).is_ok() {
                    let mut rgb_frame = RawFrame::empty();
                    if scaler.run(&decoded, &mut rgb_frame).is_err() {
                        continue;
                    }

                    let width = rgb_frame.width();
                    let height = rgb_frame.height();
                    let data = rgb_frame.data(0);
                    let stride = rgb_frame.stride(0);

                    // Copy frame data row by row (handling stride)
                    let mut frame_data = Vec::with_capacity((width * height * 3) as usize);
                    for y in 0..height as usize {
                        let row_start = y * stride;
                        let row_end = row_start + (width as usize * 3);
                        frame_data.extend_from_slice(&data[row_start..row_end]);
                    }

                    let pts_secs = decoded.pts().unwrap_or(0) as f64 * time_base;
                    let frame = VideoFrame {
                        width,
                        height,
                        data: frame_data,
                        pts: pts_secs,
                    };

                    {
                        let mut slot = current_frame.lock().unwrap();
                        if slot.is_some() {
                            // UI never consumed the previous frame
                            dropped += 1;
                        }
                        *slot = Some(frame);
                    }
                    let _ = event_tx.send(EngineEvent::PositionChanged(pts_secs));

                    if last_info_update.elapsed() > Duration::from_secs(2) {
                        info.dropped_frames = dropped;
                        let _ = event_tx.send(EngineEvent::MetadataLoaded(info.clone()));
                        last_info_update = Instant::now();
                    }

                    // Pace frames; playback rate shrinks or stretches the target
                    let target = Duration::from_secs_f64(1.0 / (f64::from(fps.max(1.0)) * rate as f64));
                    let elapsed = last_frame_time.elapsed();
                    if elapsed < target {
                        thread::sleep(target - elapsed);
                    }
                    last_frame_time = Instant::now();
                }
            }
        }
    }

    fn mark_enabled(tracks: &mut [TrackDescriptor], id: TrackId) {
        let kind = match tracks.iter().find(|t| t.id == id) {
            Some(track) => track.kind,
            None => return,
        };
        for track in tracks.iter_mut().filter(|t| t.kind == kind) {
            track.enabled = track.id == id;
        }
    }

    fn dictionary_to_map(dict: &ffmpeg::DictionaryRef) -> HashMap<String, String> {
        dict.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn open_video_decoder(
        ictx: &ffmpeg::format::context::Input,
        index: usize,
    ) -> Result<(ffmpeg::decoder::Video, f64, f32), EngineError> {
        let stream = ictx
            .stream(index)
            .ok_or(EngineError::NoVideoStream)?;
        let context = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| EngineError::Decoder(e.to_string()))?;
        let decoder = context
            .decoder()
            .video()
            .map_err(|e| EngineError::Decoder(e.to_string()))?;
        let time_base = f64::from(stream.time_base());
        let avg = stream.avg_frame_rate();
        let fps = if avg.denominator() != 0 {
            f64::from(avg) as f32
        } else {
            30.0
        };
        Ok((decoder, time_base, fps))
    }

    fn make_scaler(decoder: &ffmpeg::decoder::Video) -> Result<ScalingContext, EngineError> {
        let width = decoder.width();
        let height = decoder.height();
        // Cap output size; full-resolution texture uploads stall the UI thread
        let (target_width, target_height) = if width > 1920 || height > 1080 {
            let scale = f64::min(1920.0 / width as f64, 1080.0 / height as f64);
            ((width as f64 * scale) as u32, (height as f64 * scale) as u32)
        } else {
            (width, height)
        };
        ScalingContext::get(
            decoder.format(),
            width,
            height,
            Pixel::RGB24,
            target_width,
            target_height,
            Flags::BILINEAR,
        )
        .map_err(|e| EngineError::Scaler(e.to_string()))
    }

    impl PlayerEngine for FfmpegEngine {
        fn load(&mut self, url: &str) {
            self.stop();
            self.url = url.to_string();
            self.seekable.store(false, Ordering::Relaxed);

            let (cmd_tx, cmd_rx) = channel();
            let (event_tx, event_rx) = channel();
            self.command_sender = Some(cmd_tx);
            self.event_receiver = Some(event_rx);

            let url = url.to_string();
            let rate = self.rate;
            let current_frame = Arc::clone(&self.current_frame);
            let seekable = Arc::clone(&self.seekable);
            thread::spawn(move || {
                Self::decode_thread(url, rate, current_frame, seekable, cmd_rx, event_tx);
            });
        }

        fn play(&mut self) {
            self.send(Command::Resume);
        }

        fn pause(&mut self) {
            self.send(Command::Pause);
        }

        fn stop(&mut self) {
            self.send(Command::Stop);
            self.command_sender = None;
            self.event_receiver = None;
            self.seekable.store(false, Ordering::Relaxed);
            *self.current_frame.lock().unwrap() = None;
        }

        fn seek(&mut self, seconds: f64) {
            self.send(Command::Seek(seconds));
        }

        fn select_track(&mut self, id: TrackId) {
            self.send(Command::SelectTrack(id));
        }

        fn set_volume(&mut self, volume: f32) {
            self.volume = volume.clamp(0.0, 1.0);
        }

        fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
        }

        fn set_rate(&mut self, rate: f32) {
            if rate > 0.0 {
                self.rate = rate;
                self.send(Command::SetRate(rate));
            }
        }

        fn seekable(&self) -> bool {
            self.seekable.load(Ordering::Relaxed)
        }

        fn poll_events(&mut self) -> Vec<EngineEvent> {
            let mut events = Vec::new();
            if let Some(ref receiver) = self.event_receiver {
                loop {
                    match receiver.try_recv() {
                        Ok(event) => events.push(event),
                        Err(TryRecvError::Empty) => break,
                        Err(TryRecvError::Disconnected) => {
                            self.event_receiver = None;
                            break;
                        }
                    }
                }
            }
            events
        }

        fn take_frame(&mut self) -> Option<VideoFrame> {
            self.current_frame.lock().unwrap().take()
        }
    }

    impl Drop for FfmpegEngine {
        fn drop(&mut self) {
            self.stop();
        }
    }
}

// Stub implementation when internal-player feature is disabled
#[cfg(not(feature = "internal-player"))]
mod engine_impl {
    use crate::engine::{EngineEvent, PlayerEngine, VideoFrame};
    use crate::models::{EngineSignal, TrackId};

    pub struct FfmpegEngine {
        pending: Vec<EngineEvent>,
    }

    impl FfmpegEngine {
        pub fn new() -> Self {
            Self {
                pending: Vec::new(),
            }
        }
    }

    impl PlayerEngine for FfmpegEngine {
        fn load(&mut self, _url: &str) {
            self.pending.push(EngineEvent::Error(
                "Internal player not enabled. Build with --features internal-player".to_string(),
            ));
            self.pending
                .push(EngineEvent::StateChanged(EngineSignal::Failed));
        }

        fn play(&mut self) {}
        fn pause(&mut self) {}
        fn stop(&mut self) {}
        fn seek(&mut self, _seconds: f64) {}
        fn select_track(&mut self, _id: TrackId) {}
        fn set_volume(&mut self, _volume: f32) {}
        fn set_muted(&mut self, _muted: bool) {}
        fn set_rate(&mut self, _rate: f32) {}

        fn seekable(&self) -> bool {
            false
        }

        fn poll_events(&mut self) -> Vec<EngineEvent> {
            std::mem::take(&mut self.pending)
        }

        fn take_frame(&mut self) -> Option<VideoFrame> {
            None
        }
    }
}

// Re-export
pub use engine_impl::*;
