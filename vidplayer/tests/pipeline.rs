//! Coordinator lifecycle integration tests.
//!
//! `Demuxer` (and the Coordinator's own codec lookups in `start()`) talk to
//! the container through the `SourceFactory`/`MediaSource` collaborator
//! (`vidplayer::core::source`) rather than `ffmpeg_source` directly, so the
//! scenarios below are driven against a synthetic in-memory source instead
//! of a real media file or a working FFmpeg install.
//!
//! What this buys: the full open/start/seek/pause/resume/stop control-surface
//! lifecycle, packet dispatch and backpressure through the demuxer, seek
//! clamping and timeout behavior, and resource cleanup across repeated opens
//! (S1-S4, S6). `SyntheticSource::take_video_codec_config`/
//! `take_audio_codec_config` return `None`, since there is no real codec to
//! hand a decoder — so `VideoDecoderStage`/`AudioDecoderStage` never start
//! even when `MediaInfo` reports a stream present, and nothing downstream of
//! the packet queues (decode, resample, render, the Clock) is exercised here.
//! Scenarios that depend on decoded frames actually reaching the Clock or a
//! surface (S5's audio-mastered sync case) still require a real media file
//! and FFmpeg and are not covered by this file.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ffmpeg_types::{ChannelLayout, MediaDuration, Pts, Rational, SampleFormat};

use vidplayer::core::{
    AudioParams, Coordinator, FfmpegSourceFactory, MediaInfo, MediaSource, PlaybackConfig,
    Packet, PlayerError, PlayerEvent, SourceFactory, SourceStreamFilter, State, StreamType,
    VideoFrame, VideoSurface, VoiceState,
};

#[derive(Default)]
struct RecordingSurface {
    presents: Arc<AtomicUsize>,
    resets: Arc<AtomicUsize>,
}

impl VideoSurface for RecordingSurface {
    fn present(&mut self, _frame: &VideoFrame) {
        self.presents.fetch_add(1, Ordering::Relaxed);
    }

    fn reset(&mut self) {
        self.resets.fetch_add(1, Ordering::Relaxed);
    }
}

/// A fixed, deterministic stream of packets alternating video/audio,
/// looping until `packet_count` packets have been produced. No codec
/// payload is decodable; packets exist only to exercise demux dispatch.
struct SyntheticSource {
    has_video: bool,
    has_audio: bool,
    packet_count: usize,
    emitted: usize,
    duration: Duration,
    seek_calls: Arc<AtomicUsize>,
}

impl MediaSource for SyntheticSource {
    fn next_packet(&mut self) -> Result<Option<Packet>, PlayerError> {
        if self.emitted >= self.packet_count {
            return Ok(None);
        }
        let stream_type = if self.has_video && (!self.has_audio || self.emitted % 2 == 0) {
            StreamType::Video
        } else {
            StreamType::Audio
        };
        let pts = self.emitted as i64;
        self.emitted += 1;

        let packet = Packet::new(
            vec![0u8; 4],
            Some(Pts(pts)),
            Some(Pts(pts)),
            Some(MediaDuration(40)),
            Rational::new(1, 25),
            true,
            stream_type,
        );
        Ok(Some(packet))
    }

    fn seek(&mut self, position: Duration) -> Result<Duration, PlayerError> {
        self.seek_calls.fetch_add(1, Ordering::Relaxed);
        let clamped = position.min(self.duration);
        self.emitted = (clamped.as_millis() / 40) as usize;
        Ok(clamped)
    }

    fn take_video_codec_config(&mut self) -> Option<ffmpeg_source::CodecConfig> {
        None
    }

    fn take_audio_codec_config(&mut self) -> Option<ffmpeg_source::CodecConfig> {
        None
    }

    fn video_time_base(&self) -> Option<Rational> {
        self.has_video.then(|| Rational::new(1, 25))
    }

    fn audio_time_base(&self) -> Option<Rational> {
        self.has_audio.then(|| Rational::new(1, 48_000))
    }
}

/// Hands back a fresh `SyntheticSource` on every `open()` call, the way
/// `FfmpegSourceFactory` hands back a fresh `ffmpeg_source::Source` per
/// demux session and per `Coordinator::start` codec lookup.
struct SyntheticSourceFactory {
    has_video: bool,
    has_audio: bool,
    packet_count: usize,
    duration: Duration,
    seek_calls: Arc<AtomicUsize>,
}

impl SyntheticSourceFactory {
    fn playable(has_video: bool, has_audio: bool, packet_count: usize, duration_ms: i64) -> Self {
        Self {
            has_video,
            has_audio,
            packet_count,
            duration: Duration::from_millis(duration_ms as u64),
            seek_calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl SourceFactory for SyntheticSourceFactory {
    fn probe(&self, _path: &Path) -> Result<MediaInfo, PlayerError> {
        Ok(MediaInfo {
            duration_ms: self.duration.as_millis() as i64,
            video_stream_index: self.has_video.then_some(0),
            audio_stream_index: self.has_audio.then_some(0),
            video_width: if self.has_video { 640 } else { 0 },
            video_height: if self.has_video { 480 } else { 0 },
            avg_frame_rate: self.has_video.then_some(25.0),
            video_time_base: self.has_video.then(|| Rational::new(1, 25)),
            audio_time_base: self.has_audio.then(|| Rational::new(1, 48_000)),
            audio_params: self.has_audio.then(|| AudioParams {
                sample_rate: 48_000,
                channel_layout: ChannelLayout::Stereo,
                channels: 2,
                sample_format: SampleFormat::S16,
            }),
        })
    }

    fn open(
        &self,
        _path: &Path,
        _filter: SourceStreamFilter,
    ) -> Result<Box<dyn MediaSource>, PlayerError> {
        Ok(Box::new(SyntheticSource {
            has_video: self.has_video,
            has_audio: self.has_audio,
            packet_count: self.packet_count,
            emitted: 0,
            duration: self.duration,
            seek_calls: Arc::clone(&self.seek_calls),
        }))
    }
}

/// A factory whose `open()` always fails, modeling an unopenable/unreadable
/// container the probe step itself couldn't catch (S6's sibling case: the
/// file is probeable but the container is corrupt past that point).
struct UnopenableSourceFactory;

impl SourceFactory for UnopenableSourceFactory {
    fn probe(&self, _path: &Path) -> Result<MediaInfo, PlayerError> {
        Ok(MediaInfo {
            duration_ms: 1_000,
            video_stream_index: Some(0),
            audio_stream_index: None,
            video_width: 640,
            video_height: 480,
            avg_frame_rate: Some(25.0),
            video_time_base: Some(Rational::new(1, 25)),
            audio_time_base: None,
            audio_params: None,
        })
    }

    fn open(
        &self,
        _path: &Path,
        _filter: SourceStreamFilter,
    ) -> Result<Box<dyn MediaSource>, PlayerError> {
        Err(PlayerError::OpenFailed("container is corrupt".into()))
    }
}

fn new_coordinator() -> (Coordinator, std::sync::mpsc::Receiver<PlayerEvent>) {
    Coordinator::new(
        PlaybackConfig::default(),
        Box::new(|| Box::new(RecordingSurface::default())),
        Arc::new(FfmpegSourceFactory),
    )
}

fn new_coordinator_with(
    source_factory: Arc<dyn SourceFactory>,
) -> (Coordinator, std::sync::mpsc::Receiver<PlayerEvent>) {
    Coordinator::new(
        PlaybackConfig::default(),
        Box::new(|| Box::new(RecordingSurface::default())),
        source_factory,
    )
}

#[test]
fn invalid_source_returns_open_failed_and_state_stays_stopped() {
    // S6: open_media("missing.xyz") -> OpenFailed; subsequent start() -> NotLoaded.
    let (coordinator, _events) = new_coordinator();

    let result = coordinator.open_media("missing.xyz");
    assert!(matches!(result, Err(PlayerError::OpenFailed(_))));
    assert_eq!(coordinator.state(), State::Stopped);

    assert!(matches!(coordinator.start(), Err(PlayerError::NotLoaded)));
}

#[test]
fn start_without_open_media_is_not_loaded() {
    let (coordinator, _events) = new_coordinator();
    assert!(matches!(coordinator.start(), Err(PlayerError::NotLoaded)));
}

#[test]
fn seek_without_open_media_is_not_loaded() {
    let (coordinator, _events) = new_coordinator();
    assert!(matches!(coordinator.seek(1_000), Err(PlayerError::NotLoaded)));
}

#[test]
fn stop_is_idempotent_when_already_stopped() {
    let (coordinator, _events) = new_coordinator();
    coordinator.stop();
    coordinator.stop();
    assert_eq!(coordinator.state(), State::Stopped);
}

#[test]
fn pause_and_resume_are_no_ops_without_playing() {
    let (coordinator, _events) = new_coordinator();

    coordinator.pause();
    assert_eq!(coordinator.state(), State::Stopped);

    coordinator.resume();
    assert_eq!(coordinator.state(), State::Stopped);
}

#[test]
fn set_volume_crossing_zero_emits_voice_state_changed_even_with_nothing_loaded() {
    let (coordinator, events) = new_coordinator();

    coordinator.set_volume(0);
    match events.try_recv().expect("expected a VoiceStateChanged event") {
        PlayerEvent::VoiceStateChanged(VoiceState::Mute) => {}
        other => panic!("expected Mute, got {other:?}"),
    }

    coordinator.set_volume(50);
    match events.try_recv().expect("expected a VoiceStateChanged event") {
        PlayerEvent::VoiceStateChanged(VoiceState::Normal) => {}
        other => panic!("expected Normal, got {other:?}"),
    }

    // A second non-zero value does not cross 0 again, so no further event.
    coordinator.set_volume(75);
    assert!(events.try_recv().is_err());
}

#[test]
fn current_progress_is_nan_before_any_playback() {
    // Clock.get() returns NaN before any set() (spec §4.6); the Coordinator
    // surfaces that verbatim rather than coercing it to 0.0.
    let (coordinator, _events) = new_coordinator();
    assert!(coordinator.current_progress_seconds().is_nan());
}

#[test]
fn duration_ms_is_zero_before_anything_is_opened() {
    let (coordinator, _events) = new_coordinator();
    assert_eq!(coordinator.duration_ms(), 0);
}

#[test]
fn repeated_invalid_opens_do_not_leave_the_coordinator_in_a_bad_state() {
    // Approximates property 10 ("a second open_media releases every
    // resource owned by the prior session") for the slice reachable without
    // a real media file: repeated failed opens must not panic, must not
    // accumulate a stale pipeline, and must leave every later call well
    // defined.
    let (coordinator, _events) = new_coordinator();

    for _ in 0..5 {
        assert!(coordinator.open_media("still-missing.xyz").is_err());
        assert_eq!(coordinator.state(), State::Stopped);
        assert_eq!(coordinator.duration_ms(), 0);
    }
}

#[test]
fn out_of_range_seek_is_rejected_once_media_state_is_known() {
    // Without a loaded source the error is NotLoaded rather than
    // OutOfRange, since there is no duration to clamp against yet.
    let (coordinator, _events) = new_coordinator();
    match coordinator.seek(-1) {
        Err(PlayerError::NotLoaded) => {}
        other => panic!("expected NotLoaded, got {other:?}"),
    }
}

#[test]
fn open_start_reports_media_info_ready_and_transitions_to_playing() {
    let factory = SyntheticSourceFactory::playable(true, true, 200, 10_000);
    let (coordinator, events) = new_coordinator_with(Arc::new(factory));

    let info = coordinator.open_media("synthetic.mp4").expect("open should succeed");
    assert!(info.has_video());
    assert!(info.has_audio());
    assert_eq!(coordinator.duration_ms(), 10_000);

    assert!(matches!(
        events.try_recv(),
        Ok(PlayerEvent::MediaInfoReady(_))
    ));

    coordinator.start().expect("start should succeed against a synthetic source");
    assert_eq!(coordinator.state(), State::Playing);

    // start_with_codec never runs (no decodable codec config), so the
    // decoders stay idle; the demuxer itself still transitions and runs.
    coordinator.stop();
    assert_eq!(coordinator.state(), State::Stopped);
}

#[test]
fn seek_while_stopped_after_open_is_a_no_op_not_a_hang() {
    // Regression: seek() issued after open_media() but before start() must
    // return promptly rather than blocking on a demuxer worker that was
    // never started.
    let factory = SyntheticSourceFactory::playable(true, false, 50, 2_000);
    let (coordinator, _events) = new_coordinator_with(Arc::new(factory));

    coordinator.open_media("synthetic.mp4").expect("open should succeed");
    assert_eq!(coordinator.state(), State::Stopped);

    let result = coordinator.seek(500);
    assert!(result.is_ok(), "seek before start() must no-op, not hang or error: {result:?}");
}

#[test]
fn seek_during_playback_clamps_and_reaches_the_source() {
    let factory = SyntheticSourceFactory::playable(true, true, 200, 10_000);
    let seek_calls = Arc::clone(&factory.seek_calls);
    let (coordinator, _events) = new_coordinator_with(Arc::new(factory));

    coordinator.open_media("synthetic.mp4").expect("open should succeed");
    coordinator.start().expect("start should succeed");

    assert!(coordinator.seek(5_000).is_ok());
    assert!(matches!(
        coordinator.seek(-100),
        Err(PlayerError::OutOfRange { .. })
    ));
    assert!(matches!(
        coordinator.seek(999_999),
        Err(PlayerError::OutOfRange { .. })
    ));

    assert!(seek_calls.load(Ordering::Relaxed) >= 1);
    coordinator.stop();
}

#[test]
fn pause_resume_round_trip_during_playback() {
    let factory = SyntheticSourceFactory::playable(false, true, 100, 4_000);
    let (coordinator, _events) = new_coordinator_with(Arc::new(factory));

    coordinator.open_media("synthetic.mp4").expect("open should succeed");
    coordinator.start().expect("start should succeed");
    assert_eq!(coordinator.state(), State::Playing);

    coordinator.pause();
    assert_eq!(coordinator.state(), State::Paused);

    coordinator.resume();
    assert_eq!(coordinator.state(), State::Playing);

    coordinator.stop();
    assert_eq!(coordinator.state(), State::Stopped);
}

#[test]
fn open_failure_mid_session_reports_open_failed_and_stays_stopped() {
    let (coordinator, _events) = new_coordinator_with(Arc::new(UnopenableSourceFactory));

    // Probe succeeds (MediaInfo looks playable), but every `open()` call
    // this factory hands out afterwards fails, both the demuxer worker's
    // own (internal, unobserved) open and the Coordinator's own
    // video-codec lookup in `start()`. The latter propagates via `?`, so
    // `start()` itself reports the failure rather than silently leaving a
    // half-started pipeline behind.
    let info = coordinator.open_media("corrupt.mp4").expect("probe succeeds");
    assert!(info.has_video());

    assert!(matches!(coordinator.start(), Err(PlayerError::OpenFailed(_))));
    assert_eq!(coordinator.state(), State::Stopped);

    coordinator.stop();
    assert_eq!(coordinator.state(), State::Stopped);
}
