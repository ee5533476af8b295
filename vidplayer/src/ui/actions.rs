use gpui::{App, KeyBinding};

use crate::core::{Coordinator, State};

use super::app_state::AppState;

gpui::actions!(
    vidplayer,
    [
        TogglePause,
        ToggleMute,
        VolumeUp,
        VolumeDown,
        SeekForward,
        SeekBackward,
        SeekForwardLarge,
        SeekBackwardLarge,
        Quit,
    ]
);

const SEEK_SMALL_MS: i64 = 10_000;
const SEEK_LARGE_MS: i64 = 30_000;
const VOLUME_STEP: i16 = 10;

fn seek_relative(coordinator: &Coordinator, delta_ms: i64) {
    let position_ms = (coordinator.current_progress_seconds() * 1000.0).round() as i64;
    let target_ms = (position_ms + delta_ms).max(0);
    if let Err(e) = coordinator.seek(target_ms) {
        log::warn!("seek failed: {e}");
    }
}

pub fn register_shortcuts(app: &mut App) {
    app.bind_keys(key_bindings());

    app.on_action(|_: &TogglePause, app: &mut App| {
        let Some(coordinator) = app.global::<AppState>().coordinator.clone() else {
            return;
        };
        match coordinator.state() {
            State::Playing => coordinator.pause(),
            State::Paused => coordinator.resume(),
            State::Stopped => {}
        }
    });

    app.on_action(|_: &ToggleMute, app: &mut App| {
        let state = app.global_mut::<AppState>();
        let muted = state.toggle_mute();
        log::info!("audio {}", if muted { "muted" } else { "unmuted" });
    });

    app.on_action(|_: &VolumeUp, app: &mut App| {
        let state = app.global_mut::<AppState>();
        state.adjust_volume(VOLUME_STEP);
        log::info!("volume: {}%", state.volume);
    });

    app.on_action(|_: &VolumeDown, app: &mut App| {
        let state = app.global_mut::<AppState>();
        state.adjust_volume(-VOLUME_STEP);
        log::info!("volume: {}%", state.volume);
    });

    app.on_action(|_: &SeekForward, app: &mut App| {
        if let Some(coordinator) = &app.global::<AppState>().coordinator {
            seek_relative(coordinator, SEEK_SMALL_MS);
        }
    });

    app.on_action(|_: &SeekBackward, app: &mut App| {
        if let Some(coordinator) = &app.global::<AppState>().coordinator {
            seek_relative(coordinator, -SEEK_SMALL_MS);
        }
    });

    app.on_action(|_: &SeekForwardLarge, app: &mut App| {
        if let Some(coordinator) = &app.global::<AppState>().coordinator {
            seek_relative(coordinator, SEEK_LARGE_MS);
        }
    });

    app.on_action(|_: &SeekBackwardLarge, app: &mut App| {
        if let Some(coordinator) = &app.global::<AppState>().coordinator {
            seek_relative(coordinator, -SEEK_LARGE_MS);
        }
    });

    app.on_action(|_: &Quit, app: &mut App| {
        app.quit();
    });
}

fn key_bindings() -> Vec<KeyBinding> {
    vec![
        KeyBinding::new("space", TogglePause, None),
        KeyBinding::new("m", ToggleMute, None),
        KeyBinding::new("up", VolumeUp, None),
        KeyBinding::new("down", VolumeDown, None),
        KeyBinding::new("right", SeekForward, None),
        KeyBinding::new("left", SeekBackward, None),
        KeyBinding::new("shift-right", SeekForwardLarge, None),
        KeyBinding::new("shift-left", SeekBackwardLarge, None),
        KeyBinding::new("cmd-q", Quit, None),
    ]
}
