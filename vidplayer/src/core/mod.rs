/*!
    The concurrent playback core: bounded queues, the five worker stages,
    the master Clock, and the Coordinator that drives them through the
    open/start/pause/resume/seek/stop lifecycle.

    Everything under this module is independent of `gpui`; the GUI shell in
    `crate::ui` talks to it only through `Coordinator` and the `VideoSurface`
    / `AudioDevice` collaborator traits.
*/

mod audio_decoder;
mod audio_renderer;
mod clock;
mod config;
mod coordinator;
mod demuxer;
mod error;
mod event;
mod frame;
mod media_info;
mod packet;
mod queue;
mod source;
mod stage;
mod state;
mod video_decoder;
mod video_renderer;

pub use config::PlaybackConfig;
pub use coordinator::Coordinator;
pub use error::{PlayerError, TransientDecodeError};
pub use event::{PlayerEvent, VoiceState};
pub use frame::{Frame, VideoFrame};
pub use media_info::{AudioParams, MediaInfo};
pub use packet::{Packet, StreamType};
pub use queue::{BoundedQueue, DequeueError, FrameQueue, PacketQueue};
pub use source::{FfmpegSourceFactory, MediaSource, SourceFactory, SourceStreamFilter};
pub use stage::{Stage, StageKind};
pub use state::State;
pub use video_renderer::VideoSurface;
