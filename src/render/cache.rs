use super::{Canvas, TextureId};
use crate::error::MapError;
use crate::map::TilesetInfo;
use macroquad::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A tile cropped out of its tileset texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileImage {
    /// Tileset texture.
    pub texture: TextureId,
    /// Tile region inside the texture, in texture pixels.
    pub source: Rect,
}

/// Tileset textures and cropped tiles, populated on first use and never
/// invalidated.
#[derive(Debug, Default)]
pub struct TileCache {
    tilesets: HashMap<PathBuf, TextureId>,
    tiles: HashMap<PathBuf, HashMap<u32, TileImage>>,
}

impl TileCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Texture previously registered for a tileset image.
    pub fn tileset_texture(&self, path: &Path) -> Option<TextureId> {
        self.tilesets.get(path).copied()
    }

    /// Register a tileset texture.
    pub fn add_tileset_texture(&mut self, path: impl Into<PathBuf>, texture: TextureId) {
        self.tilesets.insert(path.into(), texture);
    }

    /// Cropped tile previously registered for `(tileset image, local index)`.
    pub fn tile_image(&self, path: &Path, index: u32) -> Option<TileImage> {
        self.tiles.get(path)?.get(&index).copied()
    }

    /// Register a cropped tile.
    pub fn add_tile_image(&mut self, path: impl Into<PathBuf>, index: u32, image: TileImage) {
        self.tiles.entry(path.into()).or_default().insert(index, image);
    }

    /// Number of tileset textures loaded.
    pub fn tileset_count(&self) -> usize {
        self.tilesets.len()
    }

    /// Number of cropped tiles cached.
    pub fn tile_count(&self) -> usize {
        self.tiles.values().map(HashMap::len).sum()
    }

    /// Cropped image of tile `local` of `tileset`, loading the tileset texture
    /// through `canvas` on first use.
    pub fn get_or_load(
        &mut self,
        canvas: &mut dyn Canvas,
        tileset: &TilesetInfo,
        local: u32,
    ) -> Result<TileImage, MapError> {
        if let Some(img) = self.tile_image(&tileset.image, local) {
            return Ok(img);
        }

        let texture = match self.tileset_texture(&tileset.image) {
            Some(tex) => tex,
            None => {
                let tex = canvas.load_texture(&tileset.image)?;
                debug!(image = %tileset.image.display(), "loaded tileset texture");
                self.add_tileset_texture(tileset.image.clone(), tex);
                tex
            }
        };

        let img = TileImage {
            texture,
            source: tileset.tile_rect(local),
        };
        self.add_tile_image(tileset.image.clone(), local, img);
        Ok(img)
    }
}
