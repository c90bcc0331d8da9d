//! Tile-map overworld for Macroquad: Tiled JSON maps stitched into one
//! scrollable world with collision, holes and depth-sorted sprites.

pub mod config;
mod error;
pub mod ir_map;
pub mod loader;
pub mod map;
pub mod render;
pub mod spatial;
pub mod sprite;
pub mod world;

pub use config::{Config, Context, Localisation};
pub use error::MapError;
pub use ir_map::{IrObject, IrObjectShape, Properties, PropertyValue};
pub use loader::{FileMapSource, MapSource};
pub use map::{Hole, Map, MapLayer};
pub use render::{Canvas, DrawContext, MacroquadCanvas, TextureId, TileCache};
pub use spatial::{Direction, TileFlip, TileId, TilePos, TileRect};
pub use sprite::{Collider, Item, Sprite, SpriteRegistry, Tick, UpdateInfo};
pub use world::{VisibleMap, World};
