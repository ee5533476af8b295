/*!
    Coordinator: single owner of the pipeline, the Clock, and the external
    control surface (spec §4.7/§6.1).

    Grounded on the teacher's `playback::player::VideoPlayer`/`ui::app_state`,
    which already centralize open/start/pause/seek/stop against a pair of
    `VideoPipeline`/`AudioPipeline` objects; generalized here to own five
    independent `Stage` trait objects and a shared `Clock` instead of two
    self-contained pipelines that each run their own demux+decode pair.
*/

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use ffmpeg_types::ChannelLayout;

use crate::audio::CpalAudioDevice;

use super::audio_decoder::AudioDecoderStage;
use super::audio_renderer::AudioRenderer;
use super::clock::Clock;
use super::config::PlaybackConfig;
use super::demuxer::Demuxer;
use super::error::PlayerError;
use super::event::{PlayerEvent, VoiceState};
use super::media_info::MediaInfo;
use super::queue::{FrameQueue, PacketQueue};
use super::source::{SourceFactory, SourceStreamFilter};
use super::stage::Stage;
use super::state::State;
use super::video_decoder::VideoDecoderStage;
use super::video_renderer::{VideoRenderer, VideoSurface};

struct Pipeline {
    demuxer: Demuxer,
    video_decoder: VideoDecoderStage,
    audio_decoder: AudioDecoderStage,
    video_renderer: Option<VideoRenderer>,
    audio_renderer: AudioRenderer,
    video_packet_queue: Arc<PacketQueue>,
    audio_packet_queue: Arc<PacketQueue>,
    video_frame_queue: Arc<FrameQueue>,
    audio_frame_queue: Arc<FrameQueue>,
}

impl Pipeline {
    /// Every stage as a homogeneous capability-bearing handle, per spec §9's
    /// redesign note. `pause`/`resume` don't care which concrete stage they
    /// are talking to, so they iterate this instead of naming each field.
    fn stages(&self) -> Vec<&dyn Stage> {
        let mut stages: Vec<&dyn Stage> =
            vec![&self.demuxer, &self.video_decoder, &self.audio_decoder, &self.audio_renderer];
        if let Some(renderer) = &self.video_renderer {
            stages.push(renderer);
        }
        stages
    }
}

pub struct Coordinator {
    config: PlaybackConfig,
    clock: Arc<Clock>,
    state: parking_lot::Mutex<State>,
    media_info: parking_lot::Mutex<Option<MediaInfo>>,
    media_path: parking_lot::Mutex<Option<PathBuf>>,
    pipeline: parking_lot::Mutex<Option<Pipeline>>,
    events: Sender<PlayerEvent>,
    volume: parking_lot::Mutex<u8>,
    make_surface: Box<dyn Fn() -> Box<dyn VideoSurface> + Send + Sync>,
    source_factory: Arc<dyn SourceFactory>,
}

impl Coordinator {
    /// `make_surface` is called once per `start()` that has a video stream,
    /// since the surface (a GPUI element, in the shipped app) is recreated
    /// per playback session rather than reused across opens. `source_factory`
    /// is the demux collaborator (spec §6.4); production callers pass
    /// `Arc::new(FfmpegSourceFactory)`, tests substitute a synthetic one.
    pub fn new(
        config: PlaybackConfig,
        make_surface: Box<dyn Fn() -> Box<dyn VideoSurface> + Send + Sync>,
        source_factory: Arc<dyn SourceFactory>,
    ) -> (Self, Receiver<PlayerEvent>) {
        let (tx, rx) = mpsc::channel();
        let coordinator = Self {
            config,
            clock: Arc::new(Clock::new()),
            state: parking_lot::Mutex::new(State::Stopped),
            media_info: parking_lot::Mutex::new(None),
            media_path: parking_lot::Mutex::new(None),
            pipeline: parking_lot::Mutex::new(None),
            events: tx,
            volume: parking_lot::Mutex::new(100),
            make_surface,
            source_factory,
        };
        (coordinator, rx)
    }

    fn emit(&self, event: PlayerEvent) {
        let _ = self.events.send(event);
    }

    /// Emits `StateChanged` only on an actual transition, per spec §6.1
    /// ("emit on every transition") — `can_transition_to` permits the
    /// `Stopped→Stopped`/`Playing→Playing`/`Paused→Paused` self-loops for
    /// idempotency, but a self-loop is not a transition an observer should
    /// be told about.
    fn transition(&self, next: State) {
        let mut state = self.state.lock();
        if *state == next {
            return;
        }
        if state.can_transition_to(next) {
            *state = next;
            self.emit(PlayerEvent::StateChanged(next));
        }
    }

    pub fn state(&self) -> State {
        *self.state.lock()
    }

    /// Stopped → Stopped(loaded). Closes whatever was previously open first,
    /// so a failed re-open never leaves two sources live (spec §6.1).
    pub fn open_media<P: AsRef<Path>>(&self, path: P) -> Result<MediaInfo, PlayerError> {
        self.stop();

        let video_packet_queue = Arc::new(PacketQueue::new(self.config.video_packet_capacity));
        let audio_packet_queue = Arc::new(PacketQueue::new(self.config.audio_packet_capacity));
        let video_frame_queue = Arc::new(FrameQueue::new(self.config.video_frame_capacity));
        let audio_frame_queue = Arc::new(FrameQueue::new(self.config.audio_frame_capacity));

        let demuxer = Demuxer::new(
            self.config.clone(),
            Arc::clone(&self.source_factory),
            Arc::clone(&video_packet_queue),
            Arc::clone(&audio_packet_queue),
        );
        let info = demuxer.open(path.as_ref())?;

        let video_decoder = VideoDecoderStage::new(
            self.config.clone(),
            Arc::clone(&video_packet_queue),
            Arc::clone(&video_frame_queue),
        );
        let audio_decoder = AudioDecoderStage::new(
            self.config.clone(),
            Arc::clone(&audio_packet_queue),
            Arc::clone(&audio_frame_queue),
        );
        let video_renderer = if info.has_video() {
            Some(VideoRenderer::new(
                self.config.clone(),
                Arc::clone(&video_frame_queue),
                Arc::clone(&self.clock),
                (self.make_surface)(),
            ))
        } else {
            None
        };
        let audio_renderer = AudioRenderer::new(
            Arc::clone(&audio_frame_queue),
            Arc::clone(&self.clock),
            Box::new(CpalAudioDevice::new()),
        );

        *self.media_info.lock() = Some(info.clone());
        *self.media_path.lock() = Some(path.as_ref().to_path_buf());
        *self.pipeline.lock() = Some(Pipeline {
            demuxer,
            video_decoder,
            audio_decoder,
            video_renderer,
            audio_renderer,
            video_packet_queue,
            audio_packet_queue,
            video_frame_queue,
            audio_frame_queue,
        });

        self.emit(PlayerEvent::MediaInfoReady(info.clone()));
        Ok(info)
    }

    /// Stopped → Playing. See spec §4.7 start sequence.
    pub fn start(&self) -> Result<(), PlayerError> {
        let info = self
            .media_info
            .lock()
            .clone()
            .ok_or(PlayerError::NotLoaded)?;
        let path = self.media_path.lock().clone().ok_or(PlayerError::NotLoaded)?;
        let path = path.as_path();

        self.clock.reset();

        let pipeline_guard = self.pipeline.lock();
        let pipeline = pipeline_guard.as_ref().ok_or(PlayerError::NotLoaded)?;

        pipeline.demuxer.start();

        if info.has_video() {
            let mut source = self
                .source_factory
                .open(path, SourceStreamFilter::VideoOnly)?;
            if let (Some(codec_config), Some(time_base)) =
                (source.take_video_codec_config(), source.video_time_base())
            {
                pipeline
                    .video_decoder
                    .start_with_codec(codec_config, time_base, info.video_width, info.video_height);
            }
        }

        if info.has_audio() {
            let mut source = self
                .source_factory
                .open(path, SourceStreamFilter::AudioOnly)?;
            if let (Some(codec_config), Some(time_base)) =
                (source.take_audio_codec_config(), source.audio_time_base())
            {
                pipeline
                    .audio_decoder
                    .start_with_codec(codec_config, time_base);
            }
        }

        if let Some(renderer) = &pipeline.video_renderer {
            renderer.start();
        }

        pipeline.audio_renderer.start();
        if let Some(params) = &info.audio_params {
            let channels = params.channels.max(ChannelLayout::Stereo.channels());
            if let Err(e) = pipeline.audio_renderer.open(params.sample_rate, channels) {
                self.emit(PlayerEvent::Error {
                    kind: "device".into(),
                    message: e.to_string(),
                });
            }
        }
        let percent = *self.volume.lock();
        pipeline.audio_renderer.set_volume(percent);

        drop(pipeline_guard);
        self.transition(State::Playing);
        Ok(())
    }

    /// Playing → Paused; no-op otherwise.
    pub fn pause(&self) {
        if self.state() != State::Playing {
            return;
        }
        if let Some(pipeline) = self.pipeline.lock().as_ref() {
            for stage in pipeline.stages() {
                stage.pause();
            }
        }
        self.transition(State::Paused);
    }

    /// Paused → Playing; no-op otherwise. The Clock is NOT re-anchored here
    /// (spec §4.7/§9): it keeps extrapolating from its last `set()` and the
    /// renderers re-synchronize naturally once the AudioRenderer resumes
    /// writing.
    pub fn resume(&self) {
        if self.state() != State::Paused {
            return;
        }
        if let Some(pipeline) = self.pipeline.lock().as_ref() {
            for stage in pipeline.stages() {
                stage.resume();
            }
        }
        self.transition(State::Playing);
    }

    /// Clamped to `[0, duration]`. See spec §4.7 seek sequence.
    pub fn seek(&self, ms: i64) -> Result<(), PlayerError> {
        let duration_ms = self
            .media_info
            .lock()
            .as_ref()
            .ok_or(PlayerError::NotLoaded)?
            .duration_ms;

        if ms < 0 || ms > duration_ms {
            return Err(PlayerError::OutOfRange {
                requested_ms: ms,
                duration_ms,
            });
        }

        // Only Playing|Paused have a live demuxer worker to service the
        // request (spec §3); a loaded-but-stopped source has nothing
        // running to seek, so this is a no-op rather than a hang or error.
        if !matches!(self.state(), State::Playing | State::Paused) {
            return Ok(());
        }

        let pipeline_guard = self.pipeline.lock();
        let pipeline = pipeline_guard.as_ref().ok_or(PlayerError::NotLoaded)?;

        for stage in pipeline.stages() {
            stage.pause();
        }

        let result = pipeline.demuxer.seek(ms);
        self.clock.reset();

        pipeline.video_decoder.flush();
        pipeline.audio_decoder.flush();
        pipeline.video_packet_queue.reopen();
        pipeline.audio_packet_queue.reopen();
        pipeline.video_frame_queue.reopen();
        pipeline.audio_frame_queue.reopen();

        for stage in pipeline.stages() {
            stage.resume();
        }

        result
    }

    /// Any state → Stopped. Idempotent. Stages are stopped in reverse
    /// dependency order (renderers, then decoders, then the demuxer) per
    /// spec §4.7, rather than via the homogeneous `stages()` collection
    /// whose order isn't meaningful for teardown.
    pub fn stop(&self) {
        if let Some(pipeline) = self.pipeline.lock().take() {
            if let Some(r) = &pipeline.video_renderer {
                r.stop();
            }
            pipeline.audio_renderer.stop();
            pipeline.video_decoder.stop();
            pipeline.audio_decoder.stop();
            pipeline.demuxer.stop();
        }
        self.transition(State::Stopped);
    }

    /// `0..=100`; also derives the voice state from the 0 crossing.
    pub fn set_volume(&self, percent: u8) {
        let percent = percent.min(100);
        let previous = {
            let mut stored = self.volume.lock();
            let previous = *stored;
            *stored = percent;
            previous
        };
        if let Some(pipeline) = self.pipeline.lock().as_ref() {
            pipeline.audio_renderer.set_volume(percent);
        }
        if (previous == 0) != (percent == 0) {
            let voice = if percent == 0 {
                VoiceState::Mute
            } else {
                VoiceState::Normal
            };
            self.emit(PlayerEvent::VoiceStateChanged(voice));
        }
    }

    pub fn current_progress_seconds(&self) -> f64 {
        self.clock.get()
    }

    pub fn duration_ms(&self) -> i64 {
        self.media_info.lock().as_ref().map(|i| i.duration_ms).unwrap_or(0)
    }
}
