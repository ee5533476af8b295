/*!
    Decoded frame types.

    Grounded on the teacher's `playback::frame::VideoFrame` (display-ready
    packed pixels, width, height, pts) generalized to also carry an audio
    variant, since spec §3 describes a single `Frame` data model with a
    `kind` discriminant rather than one type per stream. The audio side
    reuses `ffmpeg_types::AudioFrame` as-is rather than re-wrapping it: it
    already carries the (format, sample_rate, channels) triple the audio
    renderer's resampler cache keys on.
*/

use std::time::Duration;

pub use ffmpeg_types::AudioFrame;
use ffmpeg_types::PixelFormat;

/// A decoded, display-ready video frame.
///
/// The video decode stage transforms the decoder's native planar YUV output
/// to a packed format (BGRA) before queueing, matching how the teacher's
/// `video_pipeline.rs` already prepares frames for presentation. The
/// `pixel_format` tag is still carried so a surface that wants planar data
/// isn't precluded by this choice.
#[derive(Clone)]
pub struct VideoFrame {
    pub pixel_format: PixelFormat,
    pub width: u32,
    pub height: u32,
    /// Bytes per row for each plane. Packed formats have exactly one entry.
    pub line_strides: Vec<usize>,
    pub data: Vec<u8>,
    pub pts: Duration,
}

impl VideoFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, pts: Duration) -> Self {
        Self {
            pixel_format: PixelFormat::Bgra,
            width,
            height,
            line_strides: vec![width as usize * 4],
            data,
            pts,
        }
    }
}

/// A decoded sample, video or audio, as it travels through a `FrameQueue`.
#[derive(Clone)]
pub enum Frame {
    Video(VideoFrame),
    Audio(AudioFrame),
}

impl Frame {
    pub fn pts(&self) -> Duration {
        match self {
            Frame::Video(f) => f.pts,
            Frame::Audio(f) => f.presentation_time().unwrap_or(Duration::ZERO),
        }
    }

    pub fn as_video(&self) -> Option<&VideoFrame> {
        match self {
            Frame::Video(f) => Some(f),
            Frame::Audio(_) => None,
        }
    }

    pub fn into_audio(self) -> Option<AudioFrame> {
        match self {
            Frame::Audio(f) => Some(f),
            Frame::Video(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_frame_defaults_to_one_packed_plane() {
        let frame = VideoFrame::new(vec![0u8; 16], 2, 2, Duration::from_millis(40));
        assert_eq!(frame.line_strides, vec![8]);
        assert_eq!(frame.pixel_format, PixelFormat::Bgra);
    }

    #[test]
    fn frame_pts_dispatches_by_kind() {
        let v = Frame::Video(VideoFrame::new(vec![], 1, 1, Duration::from_secs(2)));
        assert_eq!(v.pts(), Duration::from_secs(2));
    }
}
