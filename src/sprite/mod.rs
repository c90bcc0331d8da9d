//! Entities the world positions, collides against and depth-sorts.

mod item;

pub use item::Item;

use crate::config::Context;
use crate::error::MapError;
use crate::ir_map::IrObject;
use crate::render::{Canvas, DrawContext};
use crate::spatial::{Direction, TilePos};
use macroquad::prelude::*;
use std::collections::HashMap;
use std::time::Duration;

/// Answers "may something move onto `pos` while heading `direction`?".
pub trait Collider {
    /// `true` when the move is blocked.
    fn check_collision(&self, direction: Direction, pos: TilePos) -> bool;
}

/// Timing of one simulation tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tick {
    /// Wall-clock time since the previous tick.
    pub delta: Duration,
}

/// What a sprite sees while updating.
pub struct UpdateInfo<'a> {
    /// Collision oracle for the sprite's map coordinates.
    pub collider: &'a dyn Collider,
    /// Tick timing.
    pub tick: Tick,
}

/// A movable entity living on a map.
pub trait Sprite {
    /// Tile position on the owning map.
    fn position(&self) -> TilePos;

    /// Teleport to a tile.
    fn set_position(&mut self, pos: TilePos);

    /// Whether this sprite blocks others.
    fn collision(&self) -> bool;

    /// Cell this sprite blocks. Moving sprites usually report the cell they
    /// are moving into.
    fn collision_position(&self) -> TilePos {
        self.position()
    }

    /// Sub-tile offset in map pixels while walking between cells.
    fn pixel_offset(&self) -> Vec2 {
        Vec2::ZERO
    }

    /// Advance movement and animation by one tick.
    fn update(&mut self, ctx: &Context, info: &UpdateInfo<'_>) -> anyhow::Result<()>;

    /// Draw relative to the owning map's origin.
    fn draw(&self, ctx: &Context, canvas: &mut dyn Canvas, at: DrawContext) -> anyhow::Result<()>;
}

/// Builds a sprite from a placed map object.
pub type SpriteFactory = Box<dyn Fn(&IrObject) -> Result<Box<dyn Sprite>, MapError>>;

/// Object class to sprite constructor, assembled once by the host.
#[derive(Default)]
pub struct SpriteRegistry {
    factories: HashMap<String, SpriteFactory>,
}

impl SpriteRegistry {
    /// Registry with nothing registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry knowing the built-in kinds (`label`).
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Item::CLASS, |obj| Ok(Box::new(Item::from_object(obj))));
        registry
    }

    /// Register (or replace) the constructor for `class`.
    pub fn register<F>(&mut self, class: impl Into<String>, factory: F)
    where
        F: Fn(&IrObject) -> Result<Box<dyn Sprite>, MapError> + 'static,
    {
        self.factories.insert(class.into(), Box::new(factory));
    }

    pub fn contains(&self, class: &str) -> bool {
        self.factories.contains_key(class)
    }

    /// Build the sprite for `object`.
    pub fn create(&self, object: &IrObject) -> Result<Box<dyn Sprite>, MapError> {
        let factory = self
            .factories
            .get(&object.class_name)
            .ok_or_else(|| MapError::UnknownSpriteKind(object.class_name.clone()))?;
        factory(object)
    }
}
