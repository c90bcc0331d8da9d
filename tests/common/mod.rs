#![allow(dead_code)]

use macroquad::prelude::*;
use overworld::loader::json_loader::decode_map_str;
use overworld::ir_map::IrMap;
use overworld::{Canvas, Config, MapError, MapSource, SpriteRegistry, TextureId, TileFlip, World};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub const TS: u32 = 16;

pub fn test_config() -> Config {
    Config {
        screen_width: 320,
        screen_height: 320,
        scale: 1,
        ..Config::default()
    }
}

pub fn str_prop(name: &str, value: &str) -> Value {
    json!({"name": name, "type": "string", "value": value})
}

pub fn int_prop(name: &str, value: i64) -> Value {
    json!({"name": name, "type": "int", "value": value})
}

/// 8 tiles in 4 columns. Local 1 collides; local 3 animates 3 -> 6 every 100ms.
pub fn tileset() -> Value {
    json!({
        "firstgid": 1, "tilewidth": TS, "tileheight": TS,
        "tilecount": 8, "columns": 4, "image": "tiles.png",
        "tiles": [
            {"id": 1, "properties": [{"name": "collision", "type": "bool", "value": true}]},
            {"id": 3, "animation": [{"tileid": 3, "duration": 100}, {"tileid": 6, "duration": 100}]}
        ]
    })
}

pub fn tile_layer(name: &str, width: u32, height: u32, gid: u32) -> Value {
    json!({
        "type": "tilelayer", "name": name, "width": width, "height": height,
        "data": vec![gid; (width * height) as usize]
    })
}

pub fn group(class: &str, objects: Vec<Value>) -> Value {
    json!({"type": "objectgroup", "name": class, "class": class, "objects": objects})
}

/// Object of `class` on tile `(x, y)`.
pub fn object(id: u32, class: &str, x: i32, y: i32) -> Value {
    json!({"id": id, "type": class, "x": x * TS as i32, "y": y * TS as i32, "width": TS, "height": TS})
}

pub fn hole(id: u32, x: i32, y: i32, to_map: &str, to: (i64, i64)) -> Value {
    let mut obj = object(id, "hole", x, y);
    obj["properties"] = json!([
        str_prop("to_map", to_map),
        int_prop("to_x", to.0),
        int_prop("to_y", to.1)
    ]);
    obj
}

/// `width` x `height` map of plain ground plus `layers`.
pub fn map_json(width: u32, height: u32, properties: Vec<Value>, layers: Vec<Value>) -> Value {
    let mut all = vec![tile_layer("ground", width, height, 1)];
    all.extend(layers);
    json!({
        "width": width, "height": height, "tilewidth": TS, "tileheight": TS,
        "properties": properties,
        "layers": all,
        "tilesets": [tileset()]
    })
}

/// Map JSON kept in memory; records every id it is asked for.
#[derive(Default)]
pub struct MemorySource {
    maps: HashMap<String, String>,
    loads: Rc<RefCell<Vec<String>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: &str, map: Value) -> Self {
        self.maps.insert(id.to_owned(), map.to_string());
        self
    }

    /// Shared log of loaded ids, still readable once the source is boxed.
    pub fn loads(&self) -> Rc<RefCell<Vec<String>>> {
        Rc::clone(&self.loads)
    }
}

impl MapSource for MemorySource {
    fn load(&self, id: &str) -> Result<(IrMap, PathBuf), MapError> {
        self.loads.borrow_mut().push(id.to_owned());
        let path = PathBuf::from(format!("mem/{id}.json"));
        let Some(txt) = self.maps.get(id) else {
            return Err(MapError::Io {
                path,
                source: io::Error::new(io::ErrorKind::NotFound, "no such map"),
            });
        };
        decode_map_str(txt, &path)
    }
}

pub fn count_loads(loads: &Rc<RefCell<Vec<String>>>, id: &str) -> usize {
    loads.borrow().iter().filter(|l| l.as_str() == id).count()
}

pub fn world(source: MemorySource, registry: SpriteRegistry, initial: &str) -> World {
    World::new(test_config(), Box::new(source), registry, initial).expect("world")
}

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Load(PathBuf),
    Texture {
        texture: TextureId,
        source: Rect,
        dest: Vec2,
        scale: f32,
        flip: TileFlip,
    },
    Fill(Rect, Color),
    Stroke(Rect, f32, Color),
    Text(String, Vec2),
}

/// Canvas that only writes down what it was asked to draw.
#[derive(Default)]
pub struct RecordingCanvas {
    pub ops: Vec<Op>,
    textures: u32,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blits(&self) -> Vec<(Rect, Vec2)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Texture { source, dest, .. } => Some((*source, *dest)),
                _ => None,
            })
            .collect()
    }

    pub fn texts(&self) -> Vec<String> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Text(t, _) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Canvas for RecordingCanvas {
    fn load_texture(&mut self, path: &Path) -> Result<TextureId, MapError> {
        self.ops.push(Op::Load(path.to_path_buf()));
        self.textures += 1;
        Ok(TextureId(self.textures - 1))
    }

    fn draw_texture(&mut self, texture: TextureId, source: Rect, dest: Vec2, scale: f32, flip: TileFlip) {
        self.ops.push(Op::Texture {
            texture,
            source,
            dest,
            scale,
            flip,
        });
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.ops.push(Op::Fill(rect, color));
    }

    fn stroke_rect(&mut self, rect: Rect, thickness: f32, color: Color) {
        self.ops.push(Op::Stroke(rect, thickness, color));
    }

    fn draw_text(&mut self, text: &str, pos: Vec2, _font_size: f32, _color: Color) {
        self.ops.push(Op::Text(text.to_owned(), pos));
    }

    fn measure_text(&self, text: &str, font_size: f32) -> Vec2 {
        vec2(text.len() as f32 * font_size / 2.0, font_size)
    }
}
