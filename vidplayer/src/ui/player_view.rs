use std::sync::Arc;

use gpui::{Context, IntoElement, Render, Window, div, prelude::*, rgb};

use crate::core::Coordinator;

use super::video_element::video_element;
use super::video_surface::GpuiVideoSurface;

pub struct PlayerView {
    coordinator: Arc<Coordinator>,
    surface: GpuiVideoSurface,
    aspect_ratio: f32,
}

impl PlayerView {
    pub fn new(coordinator: Arc<Coordinator>, surface: GpuiVideoSurface, aspect_ratio: f32) -> Self {
        Self {
            coordinator,
            surface,
            aspect_ratio,
        }
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }
}

impl Render for PlayerView {
    fn render(&mut self, _window: &mut Window, _cx: &mut Context<Self>) -> impl IntoElement {
        div()
            .id("player")
            .size_full()
            .bg(rgb(0x000000))
            .overflow_hidden()
            .child(video_element(
                self.surface.clone(),
                self.aspect_ratio,
                "video",
            ))
    }
}
