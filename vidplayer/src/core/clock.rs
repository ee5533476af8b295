/*!
    Master presentation-time clock.

    Grounded directly on the original source's `AVSync` (`src/play/avsync.h`):
    a pts stamped against wall-clock time, with `get()` extrapolating forward
    by however much wall-clock time has passed since the last `set()`. Spec
    §4.6 allows either a seqlock-free atomics pair or a plain mutex since the
    call rate is only hundreds per second; this uses a plain mutex, matching
    every other piece of shared state in this pipeline.
*/

use std::time::Instant;

use parking_lot::Mutex;

struct ClockState {
    /// `NaN` means "no reference yet" (mirrors `AVSync::initClock`).
    pts_seconds: f64,
    anchored_at: Instant,
}

/// The single master presentation-time reference, owned by the Coordinator
/// and shared (read-only for video, read-write for audio) with the two
/// renderer stages.
pub struct Clock {
    state: Mutex<ClockState>,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ClockState {
                pts_seconds: f64::NAN,
                anchored_at: Instant::now(),
            }),
        }
    }

    /// Invalidates the reference; `get()` returns `NaN` until the next `set`.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.pts_seconds = f64::NAN;
        state.anchored_at = Instant::now();
    }

    /// Stamps `pts_seconds` against the current instant.
    pub fn set(&self, pts_seconds: f64) {
        let mut state = self.state.lock();
        state.pts_seconds = pts_seconds;
        state.anchored_at = Instant::now();
    }

    /// `pts_seconds + (now - anchored_at)`, or `NaN` if never `set`.
    pub fn get(&self) -> f64 {
        let state = self.state.lock();
        if state.pts_seconds.is_nan() {
            return f64::NAN;
        }
        state.pts_seconds + state.anchored_at.elapsed().as_secs_f64()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn get_before_any_set_is_nan() {
        let clock = Clock::new();
        assert!(clock.get().is_nan());
    }

    #[test]
    fn get_extrapolates_forward_from_set() {
        // Given set(p) at wall time t0
        // When we read get() at t1 >= t0
        // Then get() ~= p + (t1 - t0) within a millisecond
        let clock = Clock::new();
        clock.set(10.0);
        thread::sleep(Duration::from_millis(50));
        let observed = clock.get();
        assert!((observed - 10.05).abs() < 0.02, "observed={observed}");
    }

    #[test]
    fn reset_invalidates_the_reference() {
        let clock = Clock::new();
        clock.set(5.0);
        clock.reset();
        assert!(clock.get().is_nan());
    }

    #[test]
    fn concurrent_set_and_get_never_observe_a_torn_value() {
        let clock = Arc::new(Clock::new());
        clock.set(0.0);

        let writer = {
            let clock = Arc::clone(&clock);
            thread::spawn(move || {
                for i in 0..1000 {
                    clock.set(i as f64);
                }
            })
        };

        let reader = {
            let clock = Arc::clone(&clock);
            thread::spawn(move || {
                for _ in 0..1000 {
                    let v = clock.get();
                    assert!(!v.is_nan() && v.is_finite());
                }
            })
        };

        writer.join().unwrap();
        reader.join().unwrap();
    }
}
