/*!
    `gpui`-backed `VideoSurface`: the bridge between the renderer stage's
    worker thread and the paint thread.

    Grounded on `playback::player::VideoPlayer::get_render_image` /
    `frame_to_render_image`: the renderer thread converts each presented
    frame into a `gpui::RenderImage` and stashes it in a double-buffered
    slot; `VideoElement::prepaint` swaps the slot out each frame and drops
    the previous image via `window.drop_image`, matching the teacher's own
    current/old pairing instead of holding frames in a queue the paint
    thread would have to drain itself.
*/

use std::sync::Arc;

use gpui::RenderImage;
use image::{Frame as ImageFrame, RgbaImage};
use parking_lot::Mutex;

use crate::core::{VideoFrame, VideoSurface};

fn frame_to_render_image(frame: &VideoFrame) -> Option<RenderImage> {
    // Despite the name, RgbaImage just holds raw bytes; gpui expects BGRA
    // on macOS, which is what VideoFrame::new already packs.
    let image = RgbaImage::from_raw(frame.width, frame.height, frame.data.clone())?;
    Some(RenderImage::new(vec![ImageFrame::new(image)]))
}

struct Slot {
    current: Option<Arc<RenderImage>>,
    pending_drop: Option<Arc<RenderImage>>,
}

/// Shared between the `VideoRenderer` stage (writer, via `present`/`reset`)
/// and `VideoElement` (reader, via `take`). Presenting a new frame moves the
/// previous image into `pending_drop` so the paint thread can hand it back
/// to `gpui` with `window.drop_image` instead of leaking it.
///
/// Cheaply `Clone`: every clone shares the same slot, so one handle can be
/// boxed up as the pipeline's `VideoSurface` while another stays with the
/// `VideoElement` that reads from it.
#[derive(Clone)]
pub struct GpuiVideoSurface {
    slot: Arc<Mutex<Slot>>,
}

impl GpuiVideoSurface {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot {
                current: None,
                pending_drop: None,
            })),
        }
    }

    /// Called from `VideoElement::prepaint`. Returns the current image (if
    /// any) paired with one that just fell out of rotation and needs
    /// `window.drop_image`.
    pub fn take(&self) -> (Option<Arc<RenderImage>>, Option<Arc<RenderImage>>) {
        let mut slot = self.slot.lock();
        let old = slot.pending_drop.take();
        (slot.current.clone(), old)
    }
}

impl Default for GpuiVideoSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoSurface for GpuiVideoSurface {
    fn present(&mut self, frame: &VideoFrame) {
        let Some(image) = frame_to_render_image(frame) else {
            return;
        };
        let mut slot = self.slot.lock();
        let previous = slot.current.replace(Arc::new(image));
        if let Some(previous) = previous {
            slot.pending_drop = Some(previous);
        }
    }

    fn reset(&mut self) {
        let mut slot = self.slot.lock();
        if let Some(current) = slot.current.take() {
            slot.pending_drop = Some(current);
        }
    }
}
