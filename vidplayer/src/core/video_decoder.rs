/*!
    Video decoder stage: packets in, display-ready BGRA frames out.

    Grounded on the teacher's `playback::video_pipeline::decode_video_packets`:
    decode with `ffmpeg_decode::VideoDecoder`, scale/convert to BGRA with
    `ffmpeg_transform::VideoTransform`, flush both at end of stream. Reworked
    from a spawn-once closure into a stage that can be paused, flushed on
    seek, and resumed without tearing the thread down, per spec §4.3.
*/

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;

use ffmpeg_decode::{VideoDecoder as Decoder, VideoDecoderConfig};
use ffmpeg_source::CodecConfig;
use ffmpeg_transform::{VideoTransform, VideoTransformConfig};
use ffmpeg_types::Rational;

use super::config::PlaybackConfig;
use super::error::TransientDecodeError;
use super::frame::{Frame, VideoFrame};
use super::queue::{DequeueError, FrameQueue, PacketQueue};
use super::stage::Stage;

pub struct VideoDecoderStage {
    config: PlaybackConfig,
    packet_queue: Arc<PacketQueue>,
    frame_queue: Arc<FrameQueue>,
    running: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    pending_flush: Arc<AtomicBool>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl VideoDecoderStage {
    pub fn new(
        config: PlaybackConfig,
        packet_queue: Arc<PacketQueue>,
        frame_queue: Arc<FrameQueue>,
    ) -> Self {
        Self {
            config,
            packet_queue,
            frame_queue,
            running: Arc::new(AtomicBool::new(false)),
            paused: Arc::new(AtomicBool::new(false)),
            pending_flush: Arc::new(AtomicBool::new(false)),
            thread: Mutex::new(None),
        }
    }

    /// Starts the stage's worker thread with the codec it should decode.
    /// The Coordinator learns `codec_config`/`time_base`/`width`/`height`
    /// from its own open-time probe and passes them through here, since
    /// `PacketQueue` carries no codec metadata of its own.
    pub fn start_with_codec(
        &self,
        codec_config: CodecConfig,
        time_base: Rational,
        width: u32,
        height: u32,
    ) {
        self.running.store(true, Ordering::Relaxed);
        self.paused.store(false, Ordering::Relaxed);
        self.pending_flush.store(false, Ordering::Relaxed);

        let packet_queue = Arc::clone(&self.packet_queue);
        let frame_queue = Arc::clone(&self.frame_queue);
        let running = Arc::clone(&self.running);
        let paused = Arc::clone(&self.paused);
        let pending_flush = Arc::clone(&self.pending_flush);
        let poll_timeout = self.config.decoder_poll_timeout;

        let handle = thread::spawn(move || {
            Self::run(
                codec_config,
                time_base,
                width,
                height,
                packet_queue,
                frame_queue,
                running,
                paused,
                pending_flush,
                poll_timeout,
            )
        });
        *self.thread.lock() = Some(handle);
    }

    fn new_decoder_and_transform(
        codec_config: &CodecConfig,
        time_base: Rational,
        width: u32,
        height: u32,
    ) -> Option<(Decoder, VideoTransform)> {
        match Decoder::new(codec_config.clone(), time_base, VideoDecoderConfig::with_hw_accel()) {
            Ok(decoder) => Some((
                decoder,
                VideoTransform::new(VideoTransformConfig::to_bgra(width, height)),
            )),
            Err(e) => {
                log::error!("[video-decoder] (re)init failed: {e}");
                None
            }
        }
    }

    fn run(
        codec_config: CodecConfig,
        time_base: Rational,
        width: u32,
        height: u32,
        packet_queue: Arc<PacketQueue>,
        frame_queue: Arc<FrameQueue>,
        running: Arc<AtomicBool>,
        paused: Arc<AtomicBool>,
        pending_flush: Arc<AtomicBool>,
        poll_timeout: Duration,
    ) {
        let Some((mut decoder, mut transform)) =
            Self::new_decoder_and_transform(&codec_config, time_base, width, height)
        else {
            frame_queue.set_finished();
            return;
        };

        while running.load(Ordering::Relaxed) {
            if pending_flush.swap(false, Ordering::Relaxed) {
                frame_queue.clear();
                if let Some(fresh) =
                    Self::new_decoder_and_transform(&codec_config, time_base, width, height)
                {
                    (decoder, transform) = fresh;
                }
                continue;
            }

            if paused.load(Ordering::Relaxed) {
                thread::sleep(Duration::from_millis(10));
                continue;
            }

            match packet_queue.dequeue(poll_timeout) {
                Ok(packet) => match decoder.decode(&packet) {
                    Ok(frames) => {
                        for raw in frames {
                            match transform.transform(&raw) {
                                Ok(bgra) => {
                                    let pts = bgra.presentation_time().unwrap_or(Duration::ZERO);
                                    let frame =
                                        VideoFrame::new(bgra.data, bgra.width, bgra.height, pts);
                                    if frame_queue.enqueue(Frame::Video(frame)).is_err() {
                                        break;
                                    }
                                }
                                Err(e) => log::debug!("[video-decoder] transform skipped: {e}"),
                            }
                        }
                    }
                    Err(e) => {
                        let transient = TransientDecodeError::Rejected(e.to_string());
                        log::debug!("[video-decoder] {transient}");
                    }
                },
                Err(DequeueError::Empty) => continue,
                Err(DequeueError::Closed) => {
                    match decoder.flush() {
                        Ok(remaining) => {
                            for raw in remaining {
                                if let Ok(bgra) = transform.transform(&raw) {
                                    let pts = bgra.presentation_time().unwrap_or(Duration::ZERO);
                                    let frame =
                                        VideoFrame::new(bgra.data, bgra.width, bgra.height, pts);
                                    if frame_queue.enqueue(Frame::Video(frame)).is_err() {
                                        break;
                                    }
                                }
                            }
                        }
                        Err(_) => log::debug!("[video-decoder] {}", TransientDecodeError::Eof),
                    }
                    frame_queue.set_finished();
                    paused.store(true, Ordering::Relaxed);
                }
            }
        }
    }

    /// Drops in-flight decoder/transform state and clears the output frame
    /// queue, per spec §4.3. The Coordinator calls this during the seek
    /// sequence while the stage is paused; the worker thread keeps running
    /// and picks the flush up on its next iteration.
    pub fn flush(&self) {
        self.pending_flush.store(true, Ordering::Relaxed);
    }
}

impl Stage for VideoDecoderStage {
    fn start(&self) {
        log::warn!("[video-decoder] start() with no codec info is a no-op; use start_with_codec");
    }

    fn pause(&self) {
        self.paused.store(true, Ordering::Relaxed);
    }

    fn resume(&self) {
        self.paused.store(false, Ordering::Relaxed);
    }

    fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
        self.packet_queue.set_finished();
        self.frame_queue.set_finished();
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
