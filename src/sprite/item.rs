use super::{Sprite, UpdateInfo};
use crate::config::Context;
use crate::ir_map::IrObject;
use crate::render::{Canvas, DrawContext};
use crate::spatial::TilePos;
use macroquad::prelude::*;

/// Invisible interaction point (signs, notices, hidden items). Always blocks
/// its cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Item {
    pos: TilePos,
    action_type: String,
    script: String,
    text: String,
}

impl Item {
    /// Object class this sprite is built from.
    pub const CLASS: &'static str = "label";

    /// Reads `action_type`, `script` and `text` from the object's properties.
    pub fn from_object(object: &IrObject) -> Self {
        let prop = |name: &str| {
            object
                .properties
                .get_string(name)
                .unwrap_or_default()
                .to_owned()
        };
        Self {
            pos: TilePos::ZERO,
            action_type: prop("action_type"),
            script: prop("script"),
            text: prop("text"),
        }
    }

    pub fn action_type(&self) -> &str {
        &self.action_type
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Sprite for Item {
    fn position(&self) -> TilePos {
        self.pos
    }

    fn set_position(&mut self, pos: TilePos) {
        self.pos = pos;
    }

    fn collision(&self) -> bool {
        true
    }

    fn update(&mut self, _ctx: &Context, _info: &UpdateInfo<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    fn draw(&self, _ctx: &Context, _canvas: &mut dyn Canvas, _at: DrawContext) -> anyhow::Result<()> {
        Ok(())
    }
}
