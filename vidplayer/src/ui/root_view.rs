use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use gpui::{
    Context, Entity, IntoElement, Pixels, PlatformDisplay, Point, Render, Size, Window, div,
    prelude::*, rgb,
};

use crate::core::{Coordinator, FfmpegSourceFactory, PlaybackConfig, PlayerError};
use crate::window_state::WindowState;

use super::app_state::AppState;
use super::player_view::PlayerView;
use super::video_surface::GpuiVideoSurface;
use super::welcome_view::{VideoSelected, WelcomeView};

const SAVE_DEBOUNCE_SECS: f32 = 1.0;

enum ViewState {
    Welcome(Entity<WelcomeView>),
    Player(Entity<PlayerView>),
}

pub struct RootView {
    state: ViewState,
    last_size: Option<Size<Pixels>>,
    last_origin: Option<Point<Pixels>>,
    last_save_time: Option<Instant>,
}

/// Opens `path`, wires a fresh `GpuiVideoSurface` into a new Coordinator,
/// and starts playback. Returns the running Coordinator plus the aspect
/// ratio the video element needs to letterbox against.
///
/// The `PlayerEvent` receiver is dropped once it goes out of scope here;
/// nothing in the shipped UI subscribes to it yet, and `Coordinator::emit`
/// already tolerates a disconnected channel (spec §4.9).
fn open_and_start(path: &PathBuf) -> Result<(Arc<Coordinator>, GpuiVideoSurface, f32), PlayerError> {
    let surface = GpuiVideoSurface::new();
    let surface_for_pipeline = surface.clone();

    let (coordinator, _events) = Coordinator::new(
        PlaybackConfig::default(),
        Box::new(move || Box::new(surface_for_pipeline.clone())),
        Arc::new(FfmpegSourceFactory),
    );
    let coordinator = Arc::new(coordinator);

    let info = coordinator.open_media(path)?;
    coordinator.start()?;

    let aspect_ratio = if info.video_height > 0 {
        info.video_width as f32 / info.video_height as f32
    } else {
        16.0 / 9.0
    };

    Ok((coordinator, surface, aspect_ratio))
}

impl RootView {
    pub fn new_welcome(cx: &mut Context<Self>) -> Self {
        let welcome = cx.new(|_cx| WelcomeView::new());
        cx.subscribe(&welcome, Self::on_video_selected).detach();

        Self {
            state: ViewState::Welcome(welcome),
            last_size: None,
            last_origin: None,
            last_save_time: None,
        }
    }

    pub fn new_with_video(path: PathBuf, cx: &mut Context<Self>) -> Self {
        if !cx.has_global::<AppState>() {
            cx.set_global(AppState::new());
        }

        match open_and_start(&path) {
            Ok((coordinator, surface, aspect_ratio)) => {
                cx.update_global::<AppState, _>(|state, _cx| {
                    state.set_coordinator(Arc::clone(&coordinator));
                });

                let player_view = cx.new(|_cx| PlayerView::new(coordinator, surface, aspect_ratio));

                Self {
                    state: ViewState::Player(player_view),
                    last_size: None,
                    last_origin: None,
                    last_save_time: None,
                }
            }
            Err(e) => {
                log::error!("failed to open video: {e}");
                let welcome = cx.new(|_cx| WelcomeView::new());
                cx.subscribe(&welcome, Self::on_video_selected).detach();

                Self {
                    state: ViewState::Welcome(welcome),
                    last_size: None,
                    last_origin: None,
                    last_save_time: None,
                }
            }
        }
    }

    fn on_video_selected(
        &mut self,
        _welcome: Entity<WelcomeView>,
        event: &VideoSelected,
        cx: &mut Context<Self>,
    ) {
        self.transition_to_player(event.path.clone(), cx);
    }

    fn transition_to_player(&mut self, path: PathBuf, cx: &mut Context<Self>) {
        if !cx.has_global::<AppState>() {
            cx.set_global(AppState::new());
        }

        match open_and_start(&path) {
            Ok((coordinator, surface, aspect_ratio)) => {
                let window_title = path
                    .file_name()
                    .map(|s| format!("Video Player - {}", s.to_string_lossy()))
                    .unwrap_or_else(|| "Video Player".to_string());

                cx.spawn({
                    let title = window_title;
                    async move |_this, cx| {
                        cx.update(|cx| {
                            if let Some(window) = cx.active_window() {
                                window
                                    .update(cx, |_, window, _cx| {
                                        window.set_window_title(&title);
                                    })
                                    .ok();
                            }
                        })
                        .ok();
                    }
                })
                .detach();

                cx.update_global::<AppState, _>(|state, _cx| {
                    state.set_coordinator(Arc::clone(&coordinator));
                });

                let player_view = cx.new(|_cx| PlayerView::new(coordinator, surface, aspect_ratio));
                self.state = ViewState::Player(player_view);

                log::info!(
                    "keyboard shortcuts: space=pause/resume, m=mute, up/down=volume, \
                     left/right=seek 10s, shift-left/right=seek 30s, cmd-q=quit"
                );

                cx.notify();
            }
            Err(e) => {
                log::error!("failed to open video: {e}");
            }
        }
    }

    fn maybe_save_window_state(
        &mut self,
        display: Option<Rc<dyn PlatformDisplay>>,
        origin: Point<Pixels>,
        size: Size<Pixels>,
    ) {
        if self.last_size == Some(size) && self.last_origin == Some(origin) {
            return;
        }
        self.last_size = Some(size);
        self.last_origin = Some(origin);

        let now = Instant::now();
        if let Some(last_save) = self.last_save_time {
            if now.duration_since(last_save).as_secs_f32() < SAVE_DEBOUNCE_SECS {
                return;
            }
        }

        let state = WindowState::new(display, origin, size);
        if let Err(e) = state.save() {
            log::warn!("failed to save window state: {e}");
        }
        self.last_save_time = Some(now);
    }
}

impl Render for RootView {
    fn render(&mut self, window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let size = window.viewport_size();
        let origin = window.bounds().origin;
        let display = window.display(&*cx);

        self.maybe_save_window_state(display, origin, size);

        match &self.state {
            ViewState::Welcome(welcome) => div()
                .id("root")
                .size_full()
                .bg(rgb(0x111111))
                .child(welcome.clone()),
            ViewState::Player(player) => div()
                .id("root")
                .size_full()
                .bg(rgb(0x000000))
                .child(player.clone()),
        }
    }
}
