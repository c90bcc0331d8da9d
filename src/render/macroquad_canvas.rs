use super::{Canvas, TextureId};
use crate::error::MapError;
use crate::spatial::TileFlip;
use macroquad::prelude::*;
use std::f32::consts::FRAC_PI_2;
use std::path::Path;

/// [`Canvas`] drawing straight to the macroquad window.
///
/// Textures are uploaded on load, so this must only be used once the
/// macroquad context exists.
#[derive(Default)]
pub struct MacroquadCanvas {
    textures: Vec<Texture2D>,
}

impl MacroquadCanvas {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Canvas for MacroquadCanvas {
    fn load_texture(&mut self, path: &Path) -> Result<TextureId, MapError> {
        let bytes = std::fs::read(path).map_err(|source| MapError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let image = Image::from_file_with_format(&bytes, None).map_err(|e| MapError::Texture {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let tex = Texture2D::from_image(&image);
        tex.set_filter(FilterMode::Nearest);

        let id = TextureId(self.textures.len() as u32);
        self.textures.push(tex);
        Ok(id)
    }

    fn draw_texture(&mut self, texture: TextureId, source: Rect, dest: Vec2, scale: f32, flip: TileFlip) {
        let Some(tex) = self.textures.get(texture.0 as usize) else {
            return;
        };
        let (flip_x, flip_y, rotation) = blit_transform(flip);
        draw_texture_ex(
            tex,
            dest.x,
            dest.y,
            WHITE,
            DrawTextureParams {
                source: Some(source),
                dest_size: Some(vec2(source.w * scale, source.h * scale)),
                flip_x,
                flip_y,
                rotation,
                ..Default::default()
            },
        );
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        draw_rectangle(rect.x, rect.y, rect.w, rect.h, color);
    }

    fn stroke_rect(&mut self, rect: Rect, thickness: f32, color: Color) {
        draw_rectangle_lines(rect.x, rect.y, rect.w, rect.h, thickness, color);
    }

    fn draw_text(&mut self, text: &str, pos: Vec2, font_size: f32, color: Color) {
        draw_text(text, pos.x, pos.y, font_size, color);
    }

    fn measure_text(&self, text: &str, font_size: f32) -> Vec2 {
        let dims = measure_text(text, None, font_size as u16, 1.0);
        vec2(dims.width, dims.height)
    }
}

/// Macroquad mirrors the source first and rotates the quad about its centre
/// afterwards. A Tiled diagonal flip is a quarter turn followed by a
/// horizontal mirror, so with `d` set the h/v flags swap axes.
fn blit_transform(flip: TileFlip) -> (bool, bool, f32) {
    if flip.d {
        (flip.v, !flip.h, FRAC_PI_2)
    } else {
        (flip.h, flip.v, 0.0)
    }
}
