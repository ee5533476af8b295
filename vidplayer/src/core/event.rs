/*!
    Events the Coordinator emits for the GUI (or any driver) to observe.

    Grounded on spec §6.1 and the redesign note in §9: the original source
    wires these through Qt signals/slots (`ThreadManager::playStateChanged`,
    `DemuxThread::sigMediaInfoReady`, ...); here they travel over a plain
    mpsc channel instead of an implicit global dispatcher.
*/

use super::media_info::MediaInfo;
use super::state::State;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoiceState {
    Normal,
    Mute,
}

#[derive(Clone, Debug)]
pub enum PlayerEvent {
    StateChanged(State),
    VoiceStateChanged(VoiceState),
    MediaInfoReady(MediaInfo),
    Error { kind: String, message: String },
}
