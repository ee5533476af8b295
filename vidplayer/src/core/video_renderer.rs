/*!
    Video renderer stage: master-clock-synced presentation.

    Grounded on spec's sync algorithm (peek → compare to `Clock` → sleep,
    drop, or present) and on how the teacher hands decoded frames to `gpui`
    for display (`ui::video_element`) — `VideoSurface` generalizes that
    hand-off into a trait so the renderer doesn't depend on `gpui` directly.
*/

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;

use super::clock::Clock;
use super::config::PlaybackConfig;
use super::frame::VideoFrame;
use super::queue::{DequeueError, FrameQueue};
use super::stage::Stage;

/// Presentation target for decoded video. An external collaborator — the
/// renderer only needs somewhere to hand finished frames and a way to blank
/// the screen when the pipeline goes idle.
pub trait VideoSurface: Send {
    fn present(&mut self, frame: &VideoFrame);
    fn reset(&mut self);
}

pub struct VideoRenderer {
    config: PlaybackConfig,
    frame_queue: Arc<FrameQueue>,
    clock: Arc<Clock>,
    surface: Arc<Mutex<Box<dyn VideoSurface>>>,
    running: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl VideoRenderer {
    pub fn new(
        config: PlaybackConfig,
        frame_queue: Arc<FrameQueue>,
        clock: Arc<Clock>,
        surface: Box<dyn VideoSurface>,
    ) -> Self {
        Self {
            config,
            frame_queue,
            clock,
            surface: Arc::new(Mutex::new(surface)),
            running: Arc::new(AtomicBool::new(false)),
            paused: Arc::new(AtomicBool::new(false)),
            thread: Mutex::new(None),
        }
    }

    fn run(
        config: PlaybackConfig,
        frame_queue: Arc<FrameQueue>,
        clock: Arc<Clock>,
        surface: Arc<Mutex<Box<dyn VideoSurface>>>,
        running: Arc<AtomicBool>,
        paused: Arc<AtomicBool>,
    ) {
        // Pending holds a frame that was peeked but not yet due to present,
        // so re-evaluating the sync decision doesn't require putting it back
        // on the queue.
        let mut pending: Option<VideoFrame> = None;

        while running.load(Ordering::Relaxed) {
            if paused.load(Ordering::Relaxed) {
                thread::sleep(config.max_sleep);
                continue;
            }

            let frame = match pending.take() {
                Some(f) => f,
                None => match frame_queue.dequeue(config.renderer_idle_sleep) {
                    Ok(super::frame::Frame::Video(f)) => f,
                    Ok(super::frame::Frame::Audio(_)) => continue,
                    Err(DequeueError::Empty) => continue,
                    Err(DequeueError::Closed) => {
                        paused.store(true, Ordering::Relaxed);
                        surface.lock().reset();
                        continue;
                    }
                },
            };

            let master = clock.get();
            match sync_decision(
                frame.pts.as_secs_f64(),
                master,
                config.max_sleep,
                config.drop_threshold,
            ) {
                SyncDecision::Present => surface.lock().present(&frame),
                SyncDecision::Drop => {}
                SyncDecision::Sleep(sleep_for) => {
                    pending = Some(frame);
                    thread::sleep(sleep_for);
                }
            }
        }
    }
}

/// Pure sync decision for one frame: present it now, drop it (too late to
/// catch up), or sleep and re-evaluate once the master clock has advanced.
/// `master.is_nan()` (no reference yet) always presents, per spec §4.6.
#[derive(Debug, Clone, Copy, PartialEq)]
enum SyncDecision {
    Present,
    Drop,
    Sleep(Duration),
}

fn sync_decision(
    target_secs: f64,
    master: f64,
    max_sleep: Duration,
    drop_threshold: Duration,
) -> SyncDecision {
    if master.is_nan() {
        return SyncDecision::Present;
    }

    let delta = target_secs - master;
    if delta > 0.0 {
        return SyncDecision::Sleep(Duration::from_secs_f64(delta).min(max_sleep));
    }
    if delta < -drop_threshold.as_secs_f64() {
        return SyncDecision::Drop;
    }
    SyncDecision::Present
}

impl Stage for VideoRenderer {
    fn start(&self) {
        self.running.store(true, Ordering::Relaxed);
        self.paused.store(false, Ordering::Relaxed);

        let config = self.config.clone();
        let frame_queue = Arc::clone(&self.frame_queue);
        let clock = Arc::clone(&self.clock);
        let surface = Arc::clone(&self.surface);
        let running = Arc::clone(&self.running);
        let paused = Arc::clone(&self.paused);

        let handle = thread::spawn(move || {
            Self::run(config, frame_queue, clock, surface, running, paused)
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
        self.frame_queue.set_finished();
        if let Some(handle) = self.thread.lock().take() {
            let _ = handle.join();
        }
        self.surface.lock().reset();
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX_SLEEP: Duration = Duration::from_millis(10);
    const DROP_THRESHOLD: Duration = Duration::from_millis(100);

    #[test]
    fn presents_immediately_when_clock_has_no_reference_yet() {
        assert_eq!(
            sync_decision(5.0, f64::NAN, MAX_SLEEP, DROP_THRESHOLD),
            SyncDecision::Present
        );
    }

    #[test]
    fn sleeps_when_ahead_of_master_clock_capped_at_max_sleep() {
        // frame is 1s ahead of master: sleep is capped at MAX_SLEEP, not 1s.
        match sync_decision(1.0, 0.0, MAX_SLEEP, DROP_THRESHOLD) {
            SyncDecision::Sleep(d) => assert_eq!(d, MAX_SLEEP),
            other => panic!("expected Sleep, got {other:?}"),
        }
    }

    #[test]
    fn sleeps_for_exact_delta_when_under_max_sleep() {
        match sync_decision(0.004, 0.0, MAX_SLEEP, DROP_THRESHOLD) {
            SyncDecision::Sleep(d) => assert_eq!(d, Duration::from_millis(4)),
            other => panic!("expected Sleep, got {other:?}"),
        }
    }

    #[test]
    fn presents_when_within_drop_threshold_behind_master() {
        // 50ms behind master, under the 100ms drop threshold.
        assert_eq!(
            sync_decision(0.0, 0.05, MAX_SLEEP, DROP_THRESHOLD),
            SyncDecision::Present
        );
    }

    #[test]
    fn drops_when_past_the_drop_threshold() {
        // 200ms behind master, past the 100ms drop threshold.
        assert_eq!(
            sync_decision(0.0, 0.2, MAX_SLEEP, DROP_THRESHOLD),
            SyncDecision::Drop
        );
    }
}
