/*!
    Single Video Player

    A simple video player application that plays a single video file.
    Select a video file and it plays in a window with standard playback
    controls.

    Keyboard Controls:
    - Space: Pause/Resume
    - M: Mute/Unmute
    - Up/Down: Adjust volume
    - Left/Right: Seek backward/forward
    - Shift+Left/Right: Seek backward/forward (large step)
    - Cmd+Q: Quit

    Prerequisites:
    - FFmpeg: `brew install ffmpeg`

    Usage:
      cargo run --release
      cargo run --release -- /path/to/video.mp4
*/

use std::path::PathBuf;

use gpui::{App, AppContext, Application, Bounds, DisplayId, WindowBounds, WindowOptions, px, size};

use vidplayer::ui::{AppState, RootView, register_shortcuts};
use vidplayer::window_state::WindowState;

const DEFAULT_WIDTH: u32 = 1280;
const DEFAULT_HEIGHT: u32 = 720;

fn main() {
    env_logger::init();

    Application::new().run(|cx: &mut App| {
        register_shortcuts(cx);

        let cli_path: Option<PathBuf> = std::env::args().nth(1).map(PathBuf::from);

        if let Some(path) = cli_path {
            open_app_with_video(path, cx);
        } else {
            open_app_with_welcome(cx);
        }
    });
}

fn window_bounds(cx: &mut App) -> (Bounds<gpui::Pixels>, Option<DisplayId>) {
    if let Some(saved_state) = WindowState::load() {
        let display_id = saved_state.display_id(cx);
        let bounds = saved_state.to_bounds(cx);
        (bounds, display_id)
    } else {
        let bounds = Bounds::centered(
            None,
            size(px(DEFAULT_WIDTH as f32), px(DEFAULT_HEIGHT as f32)),
            cx,
        );
        (bounds, None)
    }
}

fn open_app_with_welcome(cx: &mut App) {
    cx.set_global(AppState::new());

    let (bounds, display_id) = window_bounds(cx);

    let window = cx
        .open_window(
            WindowOptions {
                window_bounds: Some(WindowBounds::Windowed(bounds)),
                display_id,
                focus: true,
                kind: gpui::WindowKind::PopUp,
                titlebar: Some(gpui::TitlebarOptions {
                    title: Some("Video Player".into()),
                    appears_transparent: false,
                    ..Default::default()
                }),
                ..Default::default()
            },
            |_window, cx| cx.new(RootView::new_welcome),
        )
        .expect("Failed to open window");

    let _ = window;
    cx.activate(true);
}

fn open_app_with_video(path: PathBuf, cx: &mut App) {
    let window_title = path
        .file_name()
        .map(|s| format!("Video Player - {}", s.to_string_lossy()))
        .unwrap_or_else(|| "Video Player".to_string());

    cx.set_global(AppState::new());

    let (bounds, display_id) = window_bounds(cx);

    log::info!(
        "keyboard shortcuts: space=pause/resume, m=mute, up/down=volume, \
         left/right=seek 10s, shift-left/right=seek 30s, cmd-q=quit"
    );

    let window = cx
        .open_window(
            WindowOptions {
                window_bounds: Some(WindowBounds::Windowed(bounds)),
                display_id,
                focus: true,
                kind: gpui::WindowKind::PopUp,
                titlebar: Some(gpui::TitlebarOptions {
                    title: Some(window_title.into()),
                    appears_transparent: false,
                    ..Default::default()
                }),
                ..Default::default()
            },
            |_window, cx| cx.new(|cx| RootView::new_with_video(path, cx)),
        )
        .expect("Failed to open window");

    let _ = window;
    cx.activate(true);
}
