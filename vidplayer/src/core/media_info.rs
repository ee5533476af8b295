/*!
    Per-open media summary, handed back by `Coordinator::open_media`.
*/

use ffmpeg_types::{ChannelLayout, Rational, SampleFormat};

/// Audio codec parameters carried in `MediaInfo`, per spec §3.
#[derive(Clone, Debug)]
pub struct AudioParams {
    pub sample_rate: u32,
    pub channel_layout: ChannelLayout,
    pub channels: u16,
    pub sample_format: SampleFormat,
}

#[derive(Clone, Debug)]
pub struct MediaInfo {
    pub duration_ms: i64,
    pub video_stream_index: Option<usize>,
    pub audio_stream_index: Option<usize>,
    pub video_width: u32,
    pub video_height: u32,
    pub avg_frame_rate: Option<f64>,
    pub video_time_base: Option<Rational>,
    pub audio_time_base: Option<Rational>,
    pub audio_params: Option<AudioParams>,
}

impl MediaInfo {
    pub fn has_video(&self) -> bool {
        self.video_stream_index.is_some()
    }

    pub fn has_audio(&self) -> bool {
        self.audio_stream_index.is_some()
    }
}
