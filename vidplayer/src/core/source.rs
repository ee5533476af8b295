/*!
    Demux source collaborator (spec §2/§4.2, §6.4).

    Mirrors the `AudioDevice`/`VideoSurface` treatment of external
    collaborators: the `Demuxer` (and the Coordinator's own codec-config
    lookups in `start()`) talk to a `MediaSource` behind this trait rather
    than `ffmpeg_source::Source`/`probe` directly, so both can be driven by
    a synthetic source in tests without a real media file or a working
    FFmpeg install.
*/

use std::path::Path;
use std::time::Duration;

use ffmpeg_source::CodecConfig;
use ffmpeg_types::Rational;

use super::error::PlayerError;
use super::media_info::{AudioParams, MediaInfo};
use super::packet::Packet;

/// Which streams a demux session should produce packets for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SourceStreamFilter {
    VideoOnly,
    AudioOnly,
    #[default]
    Both,
}

/// One open demux session against a single container: packet iteration,
/// seeking, and the codec metadata needed to stand up a decoder. Created by
/// `SourceFactory::open`.
pub trait MediaSource: Send {
    fn next_packet(&mut self) -> Result<Option<Packet>, PlayerError>;

    /// Seeks to the keyframe at or before `position`, returning the actual
    /// position landed on.
    fn seek(&mut self, position: Duration) -> Result<Duration, PlayerError>;

    fn take_video_codec_config(&mut self) -> Option<CodecConfig>;
    fn take_audio_codec_config(&mut self) -> Option<CodecConfig>;
    fn video_time_base(&self) -> Option<Rational>;
    fn audio_time_base(&self) -> Option<Rational>;
}

/// Probes and opens media sources. Injected into `Demuxer` once per
/// `Coordinator`, the same way `make_surface` is injected per playback
/// session (spec §6.4's "collaborator behind a narrow interface").
pub trait SourceFactory: Send + Sync {
    fn probe(&self, path: &Path) -> Result<MediaInfo, PlayerError>;
    fn open(
        &self,
        path: &Path,
        filter: SourceStreamFilter,
    ) -> Result<Box<dyn MediaSource>, PlayerError>;
}

/// The real collaborator: `ffmpeg_source::{probe, Source}`.
#[derive(Default, Clone, Copy)]
pub struct FfmpegSourceFactory;

impl SourceFactory for FfmpegSourceFactory {
    fn probe(&self, path: &Path) -> Result<MediaInfo, PlayerError> {
        let info = ffmpeg_source::probe(path).map_err(|e| PlayerError::OpenFailed(e.to_string()))?;

        if info.video.is_none() && info.audio.is_none() {
            return Err(PlayerError::NoPlayableStream);
        }

        Ok(MediaInfo {
            duration_ms: info
                .duration
                .map(|d| d.as_millis() as i64)
                .unwrap_or_default(),
            video_stream_index: info.video.as_ref().map(|_| 0),
            audio_stream_index: info.audio.as_ref().map(|_| 0),
            video_width: info.video.as_ref().map(|v| v.width).unwrap_or(0),
            video_height: info.video.as_ref().map(|v| v.height).unwrap_or(0),
            avg_frame_rate: info.video.as_ref().and_then(|v| v.fps()),
            video_time_base: info.video.as_ref().map(|v| v.time_base),
            audio_time_base: info.audio.as_ref().map(|a| a.time_base),
            audio_params: info.audio.as_ref().map(|a| AudioParams {
                sample_rate: a.sample_rate,
                channel_layout: a.channels,
                channels: a.channel_count(),
                sample_format: a.sample_format,
            }),
        })
    }

    fn open(
        &self,
        path: &Path,
        filter: SourceStreamFilter,
    ) -> Result<Box<dyn MediaSource>, PlayerError> {
        let stream_filter = match filter {
            SourceStreamFilter::VideoOnly => ffmpeg_source::StreamFilter::VideoOnly,
            SourceStreamFilter::AudioOnly => ffmpeg_source::StreamFilter::AudioOnly,
            SourceStreamFilter::Both => ffmpeg_source::StreamFilter::Both,
        };

        let source = ffmpeg_source::Source::open(
            path,
            ffmpeg_source::SourceConfig {
                stream_filter: Some(stream_filter),
                ..Default::default()
            },
        )
        .map_err(|e| PlayerError::OpenFailed(e.to_string()))?;

        Ok(Box::new(source))
    }
}

impl MediaSource for ffmpeg_source::Source {
    fn next_packet(&mut self) -> Result<Option<Packet>, PlayerError> {
        ffmpeg_source::Source::next_packet(self).map_err(PlayerError::from)
    }

    fn seek(&mut self, position: Duration) -> Result<Duration, PlayerError> {
        ffmpeg_source::Source::seek(self, position).map_err(|e| PlayerError::SeekFailed(e.to_string()))
    }

    fn take_video_codec_config(&mut self) -> Option<CodecConfig> {
        ffmpeg_source::Source::take_video_codec_config(self)
    }

    fn take_audio_codec_config(&mut self) -> Option<CodecConfig> {
        ffmpeg_source::Source::take_audio_codec_config(self)
    }

    fn video_time_base(&self) -> Option<Rational> {
        ffmpeg_source::Source::video_time_base(self)
    }

    fn audio_time_base(&self) -> Option<Rational> {
        ffmpeg_source::Source::audio_time_base(self)
    }
}
