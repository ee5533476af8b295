/*!
    The capability set every pipeline stage implements.

    Grounded on spec §9's redesign note: the original source unifies stage
    lifecycle through a `ThreadBase` base class (`src/play/threadbase.h`);
    here that becomes a trait object held by the Coordinator, indexed by
    `StageKind`, rather than an inheritance hierarchy.
*/

/// Tags one of the Coordinator's five worker stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageKind {
    Demuxer,
    VideoDecoder,
    AudioDecoder,
    VideoRenderer,
    AudioRenderer,
}

/// Lifecycle capabilities common to every stage. `pause`/`resume` flip a
/// flag the stage's own run loop observes on its next iteration; `stop`
/// additionally wakes every queue waiter so the stage does not block past
/// the stop signal (spec §5, "Cancellation / lifecycle").
pub trait Stage: Send {
    fn start(&self);
    fn pause(&self);
    fn resume(&self);
    fn stop(&self);
    fn is_running(&self) -> bool;
    fn is_paused(&self) -> bool;
}
