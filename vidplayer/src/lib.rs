/*!
    Single Video Player library: the concurrent playback core plus the
    collaborator implementations (`audio`, `ui`) the binary wires together.

    Kept as a library target, not just a binary, so `tests/` can exercise
    the `core` module's lifecycle against fakes without going through
    `gpui`'s application loop.
*/

pub mod audio;
pub mod core;
pub mod ui;
pub mod window_state;
