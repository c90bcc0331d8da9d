// src/ir_map.rs
use crate::spatial::GID_MASK;
use macroquad::prelude::*;
use std::collections::HashMap;

/// Canonical, format-agnostic map.
pub struct IrMap {
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
    /// Tile width in pixels.
    pub tile_w: u32,
    /// Tile height in pixels.
    pub tile_h: u32,
    /// Custom map properties.
    pub properties: Properties,
    /// Tilesets, sorted by `first_gid`.
    pub tilesets: Vec<IrTileset>,
    /// Layers in draw order (array order).
    pub layers: Vec<IrLayer>,
}

/// One image atlas with a regular grid.
pub struct IrTileset {
    /// First global tile id covered by this tileset.
    pub first_gid: u32,
    /// Image path, relative to the map file's directory.
    pub image: String,
    /// Tile width in pixels.
    pub tile_w: u32,
    /// Tile height in pixels.
    pub tile_h: u32,
    /// Number of tiles in the atlas.
    pub tilecount: u32,
    /// Atlas columns.
    pub columns: u32,
    /// 0 if not used.
    pub spacing: u32,
    /// 0 if not used.
    pub margin: u32,
    /// Custom tileset properties.
    pub properties: Properties,
    /// Per-tile metadata, only for tiles that declare any.
    pub tiles: Vec<IrTileMetadata>,
}

impl IrTileset {
    /// Last gid covered by this tileset, or `None` when the range is empty
    /// or runs past the 29-bit gid space.
    pub fn last_gid(&self) -> Option<u32> {
        if self.first_gid == 0 || self.tilecount == 0 {
            return None;
        }
        self.first_gid
            .checked_add(self.tilecount - 1)
            .filter(|&last| last <= GID_MASK)
    }
}

/// Metadata attached to a single tile of a tileset.
pub struct IrTileMetadata {
    /// Local tile id (relative to the tileset's `first_gid`).
    pub id: u32,
    /// Custom tile properties.
    pub properties: Properties,
    /// Collision shapes and other objects drawn on the tile.
    pub objects: Vec<IrObject>,
    /// Animation frames, empty when the tile is static.
    pub animation: Vec<IrFrame>,
}

/// One frame of a tile animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrFrame {
    /// Local tile id shown during this frame.
    pub tile_id: u32,
    /// Frame duration in milliseconds.
    pub duration_ms: u32,
}

/// Layer payload.
pub enum IrLayerKind {
    /// Grid of tile references.
    Tiles {
        /// Width in tiles.
        width: usize,
        /// Height in tiles.
        height: usize,
        /// Raw GIDs (flip flags included), row-major.
        data: Vec<u32>,
    },
    /// Freely placed objects.
    Objects {
        /// Objects in file order.
        objects: Vec<IrObject>,
    },
    /// Image layers, groups and anything else.
    Unsupported,
}

/// One layer of a map.
pub struct IrLayer {
    /// Layer name.
    pub name: String,
    /// Tiled layer class, used to tag object groups (`sprite`, `split`).
    pub class: String,
    /// Hidden layers are kept but never drawn.
    pub visible: bool,
    /// Layer opacity, 1.0 when opaque.
    pub opacity: f32,
    /// World offset for this layer.
    pub offset: Vec2,
    /// Custom layer properties.
    pub properties: Properties,
    /// Layer payload.
    pub kind: IrLayerKind,
}

/// Geometry of an object.
#[derive(Debug, Clone, PartialEq)]
pub enum IrObjectShape {
    /// Axis-aligned rectangle of the object's width and height.
    Rectangle,
    /// Single point.
    Point,
    /// Closed polygon, points relative to the object position.
    Polygon(Vec<Vec2>),
    /// Open polyline, points relative to the object position.
    Polyline(Vec<Vec2>),
    /// Tile object.
    Tile {
        /// Raw gid of the tile.
        gid: u32,
    },
}

/// A placed object from an object group.
#[derive(Debug, Clone)]
pub struct IrObject {
    /// Object id, unique per map.
    pub id: u32,
    /// Object name.
    pub name: String,
    /// Object class (Tiled `class`, falling back to the legacy `type`).
    pub class_name: String,
    /// X position in pixels.
    pub x: f32,
    /// Y position in pixels.
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
    /// Rotation in degrees.
    pub rotation: f32,
    /// Visibility flag.
    pub visible: bool,
    /// Geometry.
    pub shape: IrObjectShape,
    /// Custom object properties.
    pub properties: Properties,
}

/// A decoded custom property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// `bool` property.
    Bool(bool),
    /// `int` or `object` property.
    I64(i64),
    /// `float` property.
    F32(f32),
    /// `string`, `file`, `color` and `class` properties.
    String(String),
}

/// Custom properties keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(HashMap<String, PropertyValue>);

impl Properties {
    /// Empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a property.
    pub fn insert(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.0.insert(name.into(), value);
    }

    /// Raw lookup.
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.0.get(name)
    }

    /// Whether no properties are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Boolean property.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.0.get(name)? {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer property.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.0.get(name)? {
            PropertyValue::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer property that fits in an `i32`.
    pub fn get_i32(&self, name: &str) -> Option<i32> {
        self.get_i64(name).and_then(|v| i32::try_from(v).ok())
    }

    /// Float property; integer values are widened.
    pub fn get_f32(&self, name: &str) -> Option<f32> {
        match self.0.get(name)? {
            PropertyValue::F32(v) => Some(*v),
            PropertyValue::I64(v) => Some(*v as f32),
            _ => None,
        }
    }

    /// String property.
    pub fn get_string(&self, name: &str) -> Option<&str> {
        match self.0.get(name)? {
            PropertyValue::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// String property, `None` when unset or empty.
    pub fn get_non_empty(&self, name: &str) -> Option<&str> {
        self.get_string(name).filter(|s| !s.is_empty())
    }
}
