use super::{Canvas, DrawContext, TileCache};
use crate::error::MapError;
use crate::map::{Map, MapLayer};
use crate::spatial::{TileId, TileRect};
use macroquad::prelude::*;
use std::time::Duration;

/// Draws layers of one map, picking animation frames from `clock`.
pub struct Renderer<'a> {
    map: &'a Map,
    cache: &'a mut TileCache,
    clock: Duration,
}

impl<'a> Renderer<'a> {
    pub fn new(map: &'a Map, cache: &'a mut TileCache, clock: Duration) -> Self {
        Self { map, cache, clock }
    }

    /// Whole layer.
    pub fn render_layer(
        &mut self,
        canvas: &mut dyn Canvas,
        at: DrawContext,
        layer_index: usize,
    ) -> Result<(), MapError> {
        let all = TileRect::of_size(self.map.width(), self.map.height());
        self.render_rect_layer(canvas, at, layer_index, all)
    }

    /// Cells of layer `layer_index` inside `rect`. Object groups draw nothing.
    ///
    /// # Panics
    ///
    /// When a translucent tile layer has a tile to draw.
    pub fn render_rect_layer(
        &mut self,
        canvas: &mut dyn Canvas,
        at: DrawContext,
        layer_index: usize,
        rect: TileRect,
    ) -> Result<(), MapError> {
        let layer = match self.map.layers().get(layer_index) {
            Some(MapLayer::Tiles(layer)) => layer,
            Some(_) => return Ok(()),
            None => return Err(MapError::LayerOutOfBounds(layer_index)),
        };
        if !layer.visible {
            return Ok(());
        }

        let ts = self.map.tile_size() as f32;
        let rect = rect.intersect(&TileRect::of_size(self.map.width(), self.map.height()));
        for cell in rect.cells() {
            let Some(id) = layer.tile(cell) else { continue };
            if id.is_empty() {
                continue;
            }
            let Some((tileset, local)) = self.map.ts_for_gid(self.frame_of(id)) else {
                continue;
            };

            let img = self.cache.get_or_load(canvas, tileset, local)?;

            if layer.opacity < 1.0 {
                unimplemented!(
                    "layer `{}` of map `{}` has opacity {}; translucent layers are not supported",
                    layer.name,
                    self.map.id(),
                    layer.opacity
                );
            }

            let dest = at
                .moved(layer.offset + vec2(cell.x as f32 * ts, cell.y as f32 * ts))
                .screen_pos(Vec2::ZERO);
            canvas.draw_texture(img.texture, img.source, dest, at.scale, id.flip());
        }
        Ok(())
    }

    /// Gid actually shown for `id` at the current clock.
    ///
    /// Every frame lasts as long as the first one.
    fn frame_of(&self, id: TileId) -> TileId {
        let Some(def) = self.map.tile_def(id) else {
            return id;
        };
        let Some(first) = def.animation.first() else {
            return id;
        };
        let Some((tileset, _)) = self.map.ts_for_gid(id) else {
            return id;
        };
        let step = self.clock.as_millis() / u128::from(first.duration_ms);
        let frame = def.animation[(step % def.animation.len() as u128) as usize];
        TileId(tileset.first_gid + frame.tile_id)
    }
}
