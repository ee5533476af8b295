/*!
    Audio renderer stage: the master clock's only writer.

    Grounded directly on `audiorenderthread.cpp::audioCallback` in the
    original source: a per-callback local byte buffer refilled from a frame
    queue on starvation, a resampler rebuilt only when the incoming frame's
    format changes, and a scalar gain applied to the final 16-bit samples.
    `ffmpeg_transform::AudioTransform` already caches its resampler by
    exactly the (sample_rate, channels, format) key the original re-derives
    by hand, so it is used here as-is rather than reimplemented.

    Per spec §4.5 and §5, the renderer's own worker thread does no audio
    work; the `cpal` pull callback is the hot path and runs on a
    platform-owned thread concurrently with this stage's lifecycle loop.
*/

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;

use ffmpeg_transform::{AudioTransform, AudioTransformConfig};
use ffmpeg_types::{ChannelLayout, SampleFormat};

use crate::audio::{AudioDevice, AudioDeviceFormat, AudioDeviceRequest};

use super::clock::Clock;
use super::error::PlayerError;
use super::frame::Frame;
use super::queue::{DequeueError, FrameQueue};
use super::stage::Stage;

struct PullState {
    transform: Option<AudioTransform>,
    local: Vec<u8>,
    local_cursor: usize,
}

impl PullState {
    fn new() -> Self {
        Self {
            transform: None,
            local: Vec::new(),
            local_cursor: 0,
        }
    }

    fn remaining(&self) -> usize {
        self.local.len() - self.local_cursor
    }
}

fn pull(
    output: &mut [u8],
    frame_queue: &FrameQueue,
    clock: &Clock,
    paused: &AtomicBool,
    volume: &Mutex<f32>,
    state: &Mutex<PullState>,
    output_format: AudioDeviceFormat,
) {
    if paused.load(Ordering::Relaxed) {
        output.fill(0);
        return;
    }

    let mut state = state.lock();
    let mut written = 0usize;

    while written < output.len() {
        if state.remaining() == 0 {
            match frame_queue.try_dequeue() {
                Ok(Frame::Audio(frame)) => {
                    let pts = frame.presentation_time();
                    let output_channels = ChannelLayout::from_count(output_format.channels);
                    let transform = state.transform.get_or_insert_with(|| {
                        AudioTransform::new(AudioTransformConfig::new(
                            output_format.sample_rate,
                            output_channels,
                            SampleFormat::S16,
                        ))
                    });
                    match transform.transform(&frame) {
                        Ok(converted) => {
                            state.local = converted.data;
                            state.local_cursor = 0;
                            if let Some(pts) = pts {
                                clock.set(pts.as_secs_f64());
                            }
                        }
                        Err(e) => {
                            log::debug!("[audio-renderer] resample skipped: {e}");
                            continue;
                        }
                    }
                }
                Ok(Frame::Video(_)) => continue,
                Err(DequeueError::Empty) | Err(DequeueError::Closed) => {
                    output[written..].fill(0);
                    break;
                }
            }
        }

        let n = state.remaining().min(output.len() - written);
        let start = state.local_cursor;
        output[written..written + n].copy_from_slice(&state.local[start..start + n]);
        state.local_cursor += n;
        written += n;
    }

    let gain = *volume.lock();
    if (gain - 1.0).abs() > f32::EPSILON {
        let samples: &mut [i16] = bytemuck::cast_slice_mut(output);
        for sample in samples.iter_mut() {
            *sample = (*sample as f32 * gain) as i16;
        }
    }
}

pub struct AudioRenderer {
    frame_queue: Arc<FrameQueue>,
    clock: Arc<Clock>,
    device: Mutex<Box<dyn AudioDevice>>,
    running: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    volume: Arc<Mutex<f32>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl AudioRenderer {
    pub fn new(frame_queue: Arc<FrameQueue>, clock: Arc<Clock>, device: Box<dyn AudioDevice>) -> Self {
        Self {
            frame_queue,
            clock,
            device: Mutex::new(device),
            running: Arc::new(AtomicBool::new(false)),
            paused: Arc::new(AtomicBool::new(false)),
            volume: Arc::new(Mutex::new(1.0)),
            thread: Mutex::new(None),
        }
    }

    /// Opens the device requesting the decoded stream's native format and
    /// wires the pull callback. Called by the Coordinator once per
    /// `start()`, after the audio decoder has produced `MediaInfo`.
    pub fn open(
        &self,
        sample_rate: u32,
        channels: u16,
    ) -> Result<AudioDeviceFormat, PlayerError> {
        let frame_queue = Arc::clone(&self.frame_queue);
        let clock = Arc::clone(&self.clock);
        let paused = Arc::clone(&self.paused);
        let volume = Arc::clone(&self.volume);
        let state = Arc::new(Mutex::new(PullState::new()));

        let request = AudioDeviceRequest {
            sample_rate,
            channels,
            frames_per_callback: 1024,
        };

        // Placeholder until `device.open` below returns the effective
        // format; the callback reads this cell on every invocation rather
        // than closing over `request`, since the device may negotiate a
        // different rate/channel count than what was requested.
        let output_format = Arc::new(Mutex::new(AudioDeviceFormat {
            sample_rate: request.sample_rate,
            channels: request.channels,
        }));
        let callback_format = Arc::clone(&output_format);

        let mut device = self.device.lock();
        let format = device.open(
            request,
            Box::new(move |output: &mut [u8]| {
                let format = *callback_format.lock();
                pull(output, &frame_queue, &clock, &paused, &volume, &state, format);
            }),
        )?;
        *output_format.lock() = format;
        device.start()?;
        Ok(format)
    }

    pub fn close(&self) {
        self.device.lock().close();
    }

    /// `0..=100`; `0` is observationally equivalent to mute per spec §4.5.
    pub fn set_volume(&self, percent: u8) {
        *self.volume.lock() = (percent.min(100) as f32) / 100.0;
    }
}

impl Stage for AudioRenderer {
    fn start(&self) {
        self.running.store(true, Ordering::Relaxed);
        self.paused.store(false, Ordering::Relaxed);

        let running = Arc::clone(&self.running);

        let handle = thread::spawn(move || {
            while running.load(Ordering::Relaxed) {
                thread::sleep(Duration::from_millis(50));
            }
        });
        *self.thread.lock() = Some(handle);
    }

    fn pause(&self) {
        // The stream itself keeps running; the callback observes `paused`
        // and fills silence (spec §5 "shared resources"), so a logical
        // pause never touches the device.
        self.paused.store(true, Ordering::Relaxed);
    }

    fn resume(&self) {
        self.paused.store(false, Ordering::Relaxed);
    }

    fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
        self.frame_queue.set_finished();
        if let Some(handle) = self.thread.lock().take() {
            let _ = handle.join();
        }
        self.close();
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }
}
