/*!
    Tunable knobs for the playback core.

    Spec.md gives these as reference values sprinkled through §4; bundling
    them lets a test (or an embedder) override one without poking at stage
    internals.
*/

use std::time::Duration;

#[derive(Clone, Debug)]
pub struct PlaybackConfig {
    /// §4.1 capacities.
    pub video_packet_capacity: usize,
    pub audio_packet_capacity: usize,
    pub video_frame_capacity: usize,
    pub audio_frame_capacity: usize,

    /// §4.2 demuxer backpressure sleep when a downstream queue is full.
    pub demux_backpressure_sleep: Duration,

    /// §4.3 decoder input dequeue timeout per loop iteration.
    pub decoder_poll_timeout: Duration,

    /// §4.4 VideoRenderer sync thresholds.
    pub max_sleep: Duration,
    pub drop_threshold: Duration,
    /// §4.4 idle sleep when the frame queue has nothing to offer.
    pub renderer_idle_sleep: Duration,

    /// §4.7 grace period the Coordinator waits for stages to quiesce on stop.
    pub stop_grace_period: Duration,

    /// Upper bound on how long `Demuxer::seek` waits for the worker thread
    /// to service a seek request before giving up with `SeekFailed`. Not a
    /// spec-given reference value; added so a seek issued while the
    /// demuxer's worker isn't live can't block its caller forever.
    pub seek_timeout: Duration,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            video_packet_capacity: 100,
            audio_packet_capacity: 200,
            video_frame_capacity: 3,
            audio_frame_capacity: 30,
            demux_backpressure_sleep: Duration::from_millis(10),
            decoder_poll_timeout: Duration::from_millis(20),
            max_sleep: Duration::from_millis(10),
            drop_threshold: Duration::from_millis(100),
            renderer_idle_sleep: Duration::from_millis(10),
            stop_grace_period: Duration::from_secs(2),
            seek_timeout: Duration::from_secs(2),
        }
    }
}
