/*!
    Error kinds for the playback core, per spec §7.
*/

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("could not open media source: {0}")]
    OpenFailed(String),

    #[error("source has neither a playable video nor audio stream")]
    NoPlayableStream,

    #[error("decoder initialization failed: {0}")]
    DecoderInitFailed(String),

    #[error("audio device could not be opened: {0}")]
    DeviceOpenFailed(String),

    #[error("seek to requested position failed: {0}")]
    SeekFailed(String),

    #[error("no media has been opened yet")]
    NotLoaded,

    #[error("seek target {requested_ms}ms is outside [0, {duration_ms}ms]")]
    OutOfRange { requested_ms: i64, duration_ms: i64 },
}

/// Transient, per-packet decode failures. Logged and skipped, never
/// propagated to the Coordinator — see spec §4.3 and §7.
#[derive(Debug, Error)]
pub enum TransientDecodeError {
    #[error("decoder needs more input before it can emit a frame")]
    Again,
    #[error("decoder reported end of stream mid-flush")]
    Eof,
    #[error("decoder rejected a packet: {0}")]
    Rejected(String),
}

impl From<ffmpeg_types::Error> for PlayerError {
    fn from(err: ffmpeg_types::Error) -> Self {
        PlayerError::OpenFailed(err.to_string())
    }
}
