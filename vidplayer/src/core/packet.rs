/*!
    Compressed packet type.

    The container/codec collaborator (`ffmpeg-types`/`ffmpeg-source`) already
    defines exactly the packet vocabulary spec'd in §3 — stream identity, an
    opaque payload, and PTS/DTS as rationals — so the core pipeline uses it
    directly rather than re-wrapping it.
*/

pub use ffmpeg_types::{Packet, StreamType};
