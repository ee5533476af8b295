/*!
    Audio decoder stage: packets in, native-format audio frames out.

    Grounded on the teacher's `playback::audio_pipeline::decode_audio_packets`,
    but deliberately does NOT resample here the way the teacher's decode
    thread does (via `AudioTransform::playback()` baked into the decode
    loop). Resampling is moved into the audio renderer instead, matching
    `audiorenderthread.cpp::audioCallback` in the original source, which
    keeps a single cached `SwrContext` at the point of consumption and
    rebuilds it only when the frame's native format changes. Decoding here
    stays close to the codec's native output.
*/

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use ffmpeg_decode::{AudioDecoder as Decoder, AudioDecoderConfig};
use ffmpeg_source::CodecConfig;
use ffmpeg_types::Rational;

use super::config::PlaybackConfig;
use super::error::TransientDecodeError;
use super::frame::Frame;
use super::queue::{DequeueError, FrameQueue, PacketQueue};
use super::stage::Stage;

pub struct AudioDecoderStage {
    config: PlaybackConfig,
    packet_queue: Arc<PacketQueue>,
    frame_queue: Arc<FrameQueue>,
    running: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    pending_flush: Arc<AtomicBool>,
    thread: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl AudioDecoderStage {
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
            thread: parking_lot::Mutex::new(None),
        }
    }

    pub fn start_with_codec(&self, codec_config: CodecConfig, time_base: Rational) {
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

    fn new_decoder(codec_config: &CodecConfig, time_base: Rational) -> Option<Decoder> {
        match Decoder::new(codec_config.clone(), time_base, AudioDecoderConfig::new()) {
            Ok(decoder) => Some(decoder),
            Err(e) => {
                log::error!("[audio-decoder] (re)init failed: {e}");
                None
            }
        }
    }

    fn run(
        codec_config: CodecConfig,
        time_base: Rational,
        packet_queue: Arc<PacketQueue>,
        frame_queue: Arc<FrameQueue>,
        running: Arc<AtomicBool>,
        paused: Arc<AtomicBool>,
        pending_flush: Arc<AtomicBool>,
        poll_timeout: Duration,
    ) {
        let Some(mut decoder) = Self::new_decoder(&codec_config, time_base) else {
            frame_queue.set_finished();
            return;
        };

        while running.load(Ordering::Relaxed) {
            if pending_flush.swap(false, Ordering::Relaxed) {
                frame_queue.clear();
                if let Some(fresh) = Self::new_decoder(&codec_config, time_base) {
                    decoder = fresh;
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
                        for frame in frames {
                            if frame_queue.enqueue(Frame::Audio(frame)).is_err() {
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        let transient = TransientDecodeError::Rejected(e.to_string());
                        log::debug!("[audio-decoder] {transient}");
                    }
                },
                Err(DequeueError::Empty) => continue,
                Err(DequeueError::Closed) => {
                    match decoder.flush() {
                        Ok(remaining) => {
                            for frame in remaining {
                                if frame_queue.enqueue(Frame::Audio(frame)).is_err() {
                                    break;
                                }
                            }
                        }
                        Err(_) => log::debug!("[audio-decoder] {}", TransientDecodeError::Eof),
                    }
                    frame_queue.set_finished();
                    paused.store(true, Ordering::Relaxed);
                }
            }
        }
    }

    /// Drops in-flight decoder state and clears the output frame queue, per
    /// spec §4.3. The worker thread keeps running and picks the flush up on
    /// its next iteration, matching `VideoDecoderStage::flush`.
    pub fn flush(&self) {
        self.pending_flush.store(true, Ordering::Relaxed);
    }
}

impl Stage for AudioDecoderStage {
    fn start(&self) {
        log::warn!("[audio-decoder] start() with no codec info is a no-op; use start_with_codec");
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
