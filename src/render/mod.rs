//! Drawing seam, tile image cache and layer renderer.

mod cache;
pub(crate) mod cull;
mod macroquad_canvas;
mod renderer;

pub use cache::{TileCache, TileImage};
pub use cull::Viewport;
pub use macroquad_canvas::MacroquadCanvas;
pub use renderer::Renderer;

use crate::error::MapError;
use crate::spatial::TileFlip;
use macroquad::prelude::*;
use std::path::Path;

/// Opaque handle to a texture owned by a [`Canvas`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Drawing surface the world renders into.
///
/// Positions are screen pixels; tile blits carry the scale to apply to the
/// source region.
pub trait Canvas {
    /// Decode an image file into a texture.
    fn load_texture(&mut self, path: &Path) -> Result<TextureId, MapError>;

    /// Blit `source` (texture pixels) with its top-left at `dest`, scaled by
    /// `scale` and mirrored as `flip` says.
    fn draw_texture(&mut self, texture: TextureId, source: Rect, dest: Vec2, scale: f32, flip: TileFlip);

    /// Solid rectangle.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Rectangle outline.
    fn stroke_rect(&mut self, rect: Rect, thickness: f32, color: Color);

    /// Text with its baseline starting at `pos`.
    fn draw_text(&mut self, text: &str, pos: Vec2, font_size: f32, color: Color);

    /// Width and height `text` occupies at `font_size`.
    fn measure_text(&self, text: &str, font_size: f32) -> Vec2;
}

/// Offset and scale threaded through every draw call.
///
/// `offset` is in unscaled map pixels; it is multiplied by `scale` when a
/// position is finally turned into screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawContext {
    /// Origin in unscaled pixels.
    pub offset: Vec2,
    /// Map-pixel to screen-pixel factor.
    pub scale: f32,
}

impl DrawContext {
    /// Context at the origin.
    pub fn new(scale: f32) -> Self {
        Self {
            offset: Vec2::ZERO,
            scale,
        }
    }

    /// Same context, origin shifted by `delta` unscaled pixels.
    #[must_use]
    pub fn moved(self, delta: Vec2) -> Self {
        Self {
            offset: self.offset + delta,
            ..self
        }
    }

    /// Screen position of a point given relative to this context's origin.
    pub fn screen_pos(&self, local: Vec2) -> Vec2 {
        (self.offset + local) * self.scale
    }
}
