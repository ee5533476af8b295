/*!
    Demuxer stage: one container source, two destination packet queues.

    Grounded on `src/play/demuxthread.cpp`: a single long-lived thread that
    keeps the `Source` open for its whole lifetime, services a `seek`
    request from the Coordinator via a small shared slot (the original uses
    `m_seekMutex` around `avformat_seek_file` for the same reason — the
    demux loop must not be mid-read when the seek happens), and marks both
    output queues `finished` at end of stream without tearing the thread
    down (matching the teacher's own "self-pause" end-of-stream handling in
    `video_pipeline.rs`/`audio_pipeline.rs`, generalized to a single stage
    instead of two per-stream demux threads).

    Talks to the container through the `SourceFactory`/`MediaSource`
    collaborator (`super::source`) rather than `ffmpeg_source` directly, the
    same way `VideoRenderer`/`AudioRenderer` go through `VideoSurface`/
    `AudioDevice` instead of `gpui`/`cpal`.
*/

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use ffmpeg_types::StreamType;

use super::config::PlaybackConfig;
use super::error::PlayerError;
use super::media_info::MediaInfo;
use super::queue::PacketQueue;
use super::source::{SourceFactory, SourceStreamFilter};
use super::stage::Stage;

pub struct Demuxer {
    config: PlaybackConfig,
    source_factory: Arc<dyn SourceFactory>,
    path: Mutex<Option<PathBuf>>,
    duration_ms: Mutex<i64>,
    video_queue: Arc<PacketQueue>,
    audio_queue: Arc<PacketQueue>,
    running: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    pending_seek: Arc<Mutex<Option<Duration>>>,
    seek_result: Arc<Mutex<Option<Result<(), PlayerError>>>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Demuxer {
    pub fn new(
        config: PlaybackConfig,
        source_factory: Arc<dyn SourceFactory>,
        video_queue: Arc<PacketQueue>,
        audio_queue: Arc<PacketQueue>,
    ) -> Self {
        Self {
            config,
            source_factory,
            path: Mutex::new(None),
            duration_ms: Mutex::new(0),
            video_queue,
            audio_queue,
            running: Arc::new(AtomicBool::new(false)),
            paused: Arc::new(AtomicBool::new(false)),
            pending_seek: Arc::new(Mutex::new(None)),
            seek_result: Arc::new(Mutex::new(None)),
            thread: Mutex::new(None),
        }
    }

    /// Probes the source and records its path for the worker thread to open
    /// once `Stage::start` is called. Any previously open source must
    /// already have been closed by the Coordinator (spec §7: "the previous
    /// media is guaranteed closed whether the new open succeeds or fails").
    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<MediaInfo, PlayerError> {
        let path = path.as_ref().to_path_buf();
        let info = self.source_factory.probe(&path)?;
        *self.duration_ms.lock() = info.duration_ms;
        *self.path.lock() = Some(path);
        Ok(info)
    }

    pub fn close(&self) {
        self.stop();
        *self.path.lock() = None;
    }

    /// Clamps to `[0, duration]` and asks the running source to seek to the
    /// keyframe at or before the target. Blocks until the worker thread has
    /// processed the request (the Coordinator calls this only while every
    /// stage is paused, per spec §4.7 seek sequence), bounded by
    /// `config.seek_timeout` so a request issued while no worker thread is
    /// live (e.g. `seek` called before `Stage::start`) fails instead of
    /// spinning forever.
    pub fn seek(&self, ms: i64) -> Result<(), PlayerError> {
        let duration_ms = *self.duration_ms.lock();
        let clamped = ms.clamp(0, duration_ms.max(0));
        *self.seek_result.lock() = None;
        *self.pending_seek.lock() = Some(Duration::from_millis(clamped as u64));

        let deadline = Instant::now() + self.config.seek_timeout;
        loop {
            if let Some(result) = self.seek_result.lock().take() {
                return result;
            }
            if Instant::now() >= deadline {
                *self.pending_seek.lock() = None;
                return Err(PlayerError::SeekFailed(
                    "demuxer worker did not respond to the seek request in time".into(),
                ));
            }
            thread::sleep(Duration::from_millis(2));
        }
    }

    fn run(
        source_factory: Arc<dyn SourceFactory>,
        path: PathBuf,
        video_queue: Arc<PacketQueue>,
        audio_queue: Arc<PacketQueue>,
        running: Arc<AtomicBool>,
        paused: Arc<AtomicBool>,
        pending_seek: Arc<Mutex<Option<Duration>>>,
        seek_result: Arc<Mutex<Option<Result<(), PlayerError>>>>,
        backpressure_sleep: Duration,
    ) {
        let mut source = match source_factory.open(&path, SourceStreamFilter::Both) {
            Ok(source) => source,
            Err(e) => {
                log::error!("[demuxer] failed to (re)open source: {e}");
                video_queue.set_finished();
                audio_queue.set_finished();
                return;
            }
        };

        while running.load(Ordering::Relaxed) {
            if let Some(target) = pending_seek.lock().take() {
                let result = source.seek(target).map(|_| ());
                if result.is_err() {
                    log::warn!("[demuxer] seek failed: {result:?}");
                }
                *seek_result.lock() = Some(result);
                continue;
            }

            if paused.load(Ordering::Relaxed) {
                thread::sleep(backpressure_sleep);
                continue;
            }

            if video_queue.is_full() || audio_queue.is_full() {
                thread::sleep(backpressure_sleep);
                continue;
            }

            match source.next_packet() {
                Ok(Some(packet)) => {
                    let target_queue = match packet.stream_type {
                        StreamType::Video => &video_queue,
                        StreamType::Audio => &audio_queue,
                    };
                    if target_queue.enqueue(packet).is_err() {
                        log::debug!("[demuxer] target queue closed mid-dispatch");
                    }
                }
                Ok(None) => {
                    log::debug!("[demuxer] end of stream");
                    video_queue.set_finished();
                    audio_queue.set_finished();
                    paused.store(true, Ordering::Relaxed);
                }
                Err(e) => {
                    log::warn!("[demuxer] hard read error: {e}");
                    video_queue.set_finished();
                    audio_queue.set_finished();
                    paused.store(true, Ordering::Relaxed);
                }
            }
        }
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }
}

impl Stage for Demuxer {
    fn start(&self) {
        let Some(path) = self.path.lock().clone() else {
            log::warn!("[demuxer] start() called with no media open");
            return;
        };

        self.running.store(true, Ordering::Relaxed);
        self.paused.store(false, Ordering::Relaxed);

        let source_factory = Arc::clone(&self.source_factory);
        let video_queue = Arc::clone(&self.video_queue);
        let audio_queue = Arc::clone(&self.audio_queue);
        let running = Arc::clone(&self.running);
        let paused = Arc::clone(&self.paused);
        let pending_seek = Arc::clone(&self.pending_seek);
        let seek_result = Arc::clone(&self.seek_result);
        let backpressure_sleep = self.config.demux_backpressure_sleep;

        let handle = thread::spawn(move || {
            Demuxer::run(
                source_factory,
                path,
                video_queue,
                audio_queue,
                running,
                paused,
                pending_seek,
                seek_result,
                backpressure_sleep,
            )
        });
        *self.thread.lock() = Some(handle);
    }

    fn pause(&self) {
        self.paused.store(true, Ordering::Relaxed);
    }

    fn resume(&self) {
        self.paused.store(false, Ordering::Relaxed);
    }

    fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
        self.video_queue.set_finished();
        self.audio_queue.set_finished();
        if let Some(handle) = self.thread.lock().take() {
            let _ = handle.join();
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }
}
