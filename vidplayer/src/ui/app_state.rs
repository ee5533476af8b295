use std::sync::Arc;

use gpui::Global;

use crate::core::Coordinator;

/// Global handle to whatever is currently playing, plus the volume/mute
/// bookkeeping that survives a `VideoSelected` transition. The teacher keeps
/// this on the audio consumer directly; here it lives at the app-state
/// level since `Coordinator::set_volume` takes an absolute percentage
/// rather than a consumer object to mutate.
pub struct AppState {
    pub coordinator: Option<Arc<Coordinator>>,
    pub volume: u8,
    pub muted: bool,
}

impl Global for AppState {}

impl AppState {
    pub fn new() -> Self {
        Self {
            coordinator: None,
            volume: 100,
            muted: false,
        }
    }

    pub fn set_coordinator(&mut self, coordinator: Arc<Coordinator>) {
        coordinator.set_volume(if self.muted { 0 } else { self.volume });
        self.coordinator = Some(coordinator);
    }

    fn apply_volume(&self) {
        if let Some(coordinator) = &self.coordinator {
            coordinator.set_volume(if self.muted { 0 } else { self.volume });
        }
    }

    pub fn adjust_volume(&mut self, delta: i16) {
        let current = self.volume as i16;
        self.volume = (current + delta).clamp(0, 100) as u8;
        self.apply_volume();
    }

    pub fn set_volume(&mut self, volume: u8) {
        self.volume = volume.min(100);
        self.apply_volume();
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.apply_volume();
        self.muted
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
