use crate::config::{Config, Localisation};
use crate::error::MapError;
use crate::ir_map::*;
use crate::loader::MapSource;
use crate::render::{Canvas, DrawContext, Renderer, TileCache};
use crate::spatial::{Direction, TileId, TilePos, TileRect};
use crate::sprite::{Sprite, SpriteRegistry};
use macroquad::prelude::*;
use std::cell::{Ref, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Object group class holding sprite spawns.
pub const SPRITE_CLASS: &str = "sprite";
/// Object group class holding holes and other zones.
pub const SPLIT_CLASS: &str = "split";
/// Object class of teleport zones inside split groups.
pub const HOLE_CLASS: &str = "hole";

pub struct TilesetInfo {
    pub first_gid: u32,
    pub tilecount: u32,
    pub cols: u32,
    /// Atlas image, already joined with the map directory.
    pub image: PathBuf,
    pub tile_w: u32,
    pub tile_h: u32,
    pub spacing: u32,
    pub margin: u32,
}

impl TilesetInfo {
    /// Region of tile `local` inside the atlas.
    pub fn tile_rect(&self, local: u32) -> Rect {
        let col = local % self.cols;
        let row = local / self.cols;
        let sx = self.margin + col * (self.tile_w + self.spacing);
        let sy = self.margin + row * (self.tile_h + self.spacing);
        Rect::new(sx as f32, sy as f32, self.tile_w as f32, self.tile_h as f32)
    }
}

/// Collision and animation data of one tile, keyed by clean gid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileDef {
    pub collision: bool,
    /// Only entry heading opposite to this direction is allowed.
    pub allow_direction: Option<Direction>,
    pub animation: Vec<IrFrame>,
}

pub struct TileLayer {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub visible: bool,
    pub opacity: f32,
    pub offset: Vec2,
    tiles: Vec<TileId>,
}

impl TileLayer {
    pub fn tile(&self, pos: TilePos) -> Option<TileId> {
        if pos.x < 0 || pos.y < 0 || pos.x >= self.width as i32 || pos.y >= self.height as i32 {
            return None;
        }
        self.tiles
            .get(pos.y as usize * self.width as usize + pos.x as usize)
            .copied()
    }
}

pub struct ObjectGroup {
    pub name: String,
    pub class: String,
    pub objects: Vec<IrObject>,
}

pub enum MapLayer {
    Tiles(TileLayer),
    Objects(ObjectGroup),
    Other { name: String },
}

impl MapLayer {
    pub fn name(&self) -> &str {
        match self {
            MapLayer::Tiles(l) => &l.name,
            MapLayer::Objects(g) => &g.name,
            MapLayer::Other { name } => name,
        }
    }
}

/// Teleport zone: stepping anywhere inside `source` moves the walker to `to`
/// on map `to_map`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hole {
    pub object_id: u32,
    pub source: TileRect,
    pub to_map: String,
    pub to: TilePos,
}

/// One loaded tile map.
pub struct Map {
    id: String,
    width: u32,
    height: u32,
    tile_size: u32,
    /// Sorted by `first_gid`, non-overlapping.
    tilesets: Vec<TilesetInfo>,
    tile_defs: HashMap<u32, TileDef>,
    layers: Vec<MapLayer>,
    sprite_layer: Option<usize>,
    properties: Properties,
    adjacent: BTreeMap<Direction, String>,
    song: Option<PathBuf>,
    indoor: bool,
    holes: Vec<Hole>,
    sprites: RefCell<Vec<Box<dyn Sprite>>>,
}

impl fmt::Debug for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Map")
            .field("id", &self.id)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("layers", &self.layers.len())
            .field("adjacent", &self.adjacent)
            .finish_non_exhaustive()
    }
}

impl Map {
    pub fn load(
        id: &str,
        source: &dyn MapSource,
        config: &Config,
        registry: &SpriteRegistry,
    ) -> Result<Self, MapError> {
        let (ir, base) = source.load(id)?;
        Self::from_ir(id, ir, &base, config, registry)
    }

    pub fn from_ir(
        id: &str,
        ir: IrMap,
        base_dir: &Path,
        config: &Config,
        registry: &SpriteRegistry,
    ) -> Result<Self, MapError> {
        if ir.tile_w != ir.tile_h || ir.tile_w != config.tile_size {
            return Err(MapError::InvalidTileSize {
                map: id.to_owned(),
                tile_w: ir.tile_w,
                tile_h: ir.tile_h,
                expected: config.tile_size,
            });
        }
        let tile_size = ir.tile_w;

        let mut ir_tilesets = ir.tilesets;
        ir_tilesets.sort_by_key(|t| t.first_gid);
        let mut tilesets: Vec<TilesetInfo> = Vec::with_capacity(ir_tilesets.len());
        let mut tile_defs = HashMap::new();

        for t in ir_tilesets {
            let Some(last_gid) = t.last_gid() else {
                return Err(MapError::InvalidMap(format!(
                    "map `{id}`: tileset `{}` covers gids {}+{}, outside the gid space",
                    t.image, t.first_gid, t.tilecount
                )));
            };
            if let Some(prev) = tilesets.last() {
                if t.first_gid < prev.first_gid + prev.tilecount {
                    return Err(MapError::InvalidMap(format!(
                        "map `{id}`: tilesets `{}` and `{}` overlap at gid {}",
                        prev.image.display(),
                        t.image,
                        t.first_gid
                    )));
                }
            }
            for tile in &t.tiles {
                if tile.id > last_gid - t.first_gid {
                    return Err(MapError::InvalidMap(format!(
                        "map `{id}`: tile {} of `{}` is past its {} tiles",
                        tile.id, t.image, t.tilecount
                    )));
                }
                let allow_direction = match tile.properties.get_non_empty("allow_direction") {
                    Some(s) => Some(s.parse::<Direction>().map_err(|_| MapError::InvalidProperty {
                        name: "allow_direction".to_owned(),
                        value: s.to_owned(),
                    })?),
                    None => None,
                };
                tile_defs.insert(
                    t.first_gid + tile.id,
                    TileDef {
                        collision: tile.properties.get_bool("collision").unwrap_or(false),
                        allow_direction,
                        animation: tile.animation.clone(),
                    },
                );
            }
            tilesets.push(TilesetInfo {
                first_gid: t.first_gid,
                tilecount: t.tilecount,
                cols: t.columns,
                image: base_dir.join(&t.image),
                tile_w: t.tile_w,
                tile_h: t.tile_h,
                spacing: t.spacing,
                margin: t.margin,
            });
        }

        let mut layers = Vec::with_capacity(ir.layers.len());
        for layer in ir.layers {
            layers.push(match layer.kind {
                IrLayerKind::Tiles { width, height, data } => MapLayer::Tiles(TileLayer {
                    name: layer.name,
                    width: width as u32,
                    height: height as u32,
                    visible: layer.visible,
                    opacity: layer.opacity,
                    offset: layer.offset,
                    tiles: data.into_iter().map(TileId).collect(),
                }),
                IrLayerKind::Objects { objects } => MapLayer::Objects(ObjectGroup {
                    name: layer.name,
                    class: layer.class,
                    objects,
                }),
                IrLayerKind::Unsupported => MapLayer::Other { name: layer.name },
            });
        }

        let sprite_layer = layers
            .iter()
            .position(|l| matches!(l, MapLayer::Objects(g) if g.class == SPRITE_CLASS));

        let mut sprites = Vec::new();
        let mut holes = Vec::new();
        for layer in &layers {
            let MapLayer::Objects(group) = layer else { continue };
            match group.class.as_str() {
                SPRITE_CLASS => {
                    for object in &group.objects {
                        let mut sprite = registry.create(object)?;
                        let ts = tile_size as i32;
                        sprite.set_position(ivec2(
                            (object.x as i32).div_euclid(ts),
                            (object.y as i32).div_euclid(ts),
                        ));
                        sprites.push(sprite);
                    }
                }
                SPLIT_CLASS => {
                    for object in group.objects.iter().filter(|o| o.class_name == HOLE_CLASS) {
                        holes.push(hole_from_object(object, tile_size)?);
                    }
                }
                _ => {}
            }
        }

        let adjacent = Direction::ALL
            .into_iter()
            .filter_map(|d| {
                ir.properties
                    .get_non_empty(d.as_str())
                    .map(|id| (d, id.to_owned()))
            })
            .collect();

        let song = ir
            .properties
            .get_non_empty("song")
            .map(|s| config.voice_dir.join("map").join(s));
        let indoor = ir.properties.get_bool("indoor").unwrap_or(false);

        debug!(
            map = id,
            sprites = sprites.len(),
            holes = holes.len(),
            "built map"
        );

        Ok(Self {
            id: id.to_owned(),
            width: ir.width,
            height: ir.height,
            tile_size,
            tilesets,
            tile_defs,
            layers,
            sprite_layer,
            properties: ir.properties,
            adjacent,
            song,
            indoor,
            holes,
            sprites: RefCell::new(sprites),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Width in tiles.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in tiles.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Size in tiles.
    pub fn size(&self) -> IVec2 {
        ivec2(self.width as i32, self.height as i32)
    }

    /// Size in unscaled pixels.
    pub fn pixel_size(&self) -> IVec2 {
        self.size() * self.tile_size as i32
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn in_bounds(&self, pos: TilePos) -> bool {
        TileRect::of_size(self.width, self.height).contains(pos)
    }

    pub fn layers(&self) -> &[MapLayer] {
        &self.layers
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn tile_def(&self, gid: TileId) -> Option<&TileDef> {
        self.tile_defs.get(&gid.clean())
    }

    #[inline]
    pub fn ts_for_gid(&self, gid: TileId) -> Option<(&TilesetInfo, u32)> {
        let clean = gid.clean();
        let after = self.tilesets.partition_point(|t| t.first_gid <= clean);
        let ts = self.tilesets.get(after.checked_sub(1)?)?;
        let local = clean - ts.first_gid;
        (local < ts.tilecount).then_some((ts, local))
    }

    pub fn adjacent_maps(&self) -> &BTreeMap<Direction, String> {
        &self.adjacent
    }

    /// Id of the map bordering this one towards `direction`.
    pub fn adjacent(&self, direction: Direction) -> Option<&str> {
        self.adjacent.get(&direction).map(String::as_str)
    }

    /// Localisation key of the display name.
    pub fn name_key(&self) -> Option<&str> {
        self.properties.get_non_empty("name")
    }

    /// Localised display name; `None` when unnamed or untranslated.
    pub fn name<'l>(&self, loc: &'l Localisation) -> Option<&'l str> {
        loc.get(self.name_key()?).filter(|s| !s.is_empty())
    }

    /// Background music file.
    pub fn song_path(&self) -> Option<&Path> {
        self.song.as_deref()
    }

    /// Indoor maps are never tinted by the day/night overlay.
    pub fn indoor(&self) -> bool {
        self.indoor
    }

    pub fn holes(&self) -> &[Hole] {
        &self.holes
    }

    pub fn sprites(&self) -> Ref<'_, Vec<Box<dyn Sprite>>> {
        self.sprites.borrow()
    }

    pub(crate) fn take_sprites(&self) -> Vec<Box<dyn Sprite>> {
        self.sprites.take()
    }

    pub(crate) fn restore_sprites(&self, sprites: Vec<Box<dyn Sprite>>) {
        let mut slot = self.sprites.borrow_mut();
        let added = std::mem::replace(&mut *slot, sprites);
        slot.extend(added);
    }

    /// First sprite standing on `pos`.
    pub fn sprite_at(&self, pos: TilePos) -> Option<Ref<'_, Box<dyn Sprite>>> {
        Ref::filter_map(self.sprites.borrow(), |sprites| {
            sprites.iter().find(|s| s.position() == pos)
        })
        .ok()
    }

    /// Whether moving onto `pos` while heading `direction` is blocked.
    ///
    /// Sprites are consulted first, then tile metadata layer by layer: the
    /// first tile carrying metadata with `collision` blocks, one with
    /// `allow_direction` decides by direction, anything else falls through.
    pub fn check_collision(&self, direction: Direction, pos: TilePos) -> bool {
        let occupied = self
            .sprites
            .borrow()
            .iter()
            .any(|s| s.collision() && s.collision_position() == pos);
        if occupied {
            return true;
        }
        if !self.in_bounds(pos) {
            return true;
        }

        for layer in &self.layers {
            let MapLayer::Tiles(layer) = layer else { continue };
            let Some(id) = layer.tile(pos) else { continue };
            if id.is_empty() {
                continue;
            }
            let Some(def) = self.tile_def(id) else { continue };
            if def.collision {
                return true;
            }
            if let Some(allowed) = def.allow_direction {
                return direction != -allowed;
            }
        }
        false
    }

    /// Layers drawn beneath sprites: everything up to and including the
    /// sprite object group, or every layer when there is none.
    pub fn background_layers(&self) -> Range<usize> {
        match self.sprite_layer {
            Some(i) => 0..i + 1,
            None => 0..self.layers.len(),
        }
    }

    /// Layers drawn above sprites.
    pub fn foreground_layers(&self) -> Range<usize> {
        self.background_layers().end..self.layers.len()
    }

    pub fn draw_background(
        &self,
        canvas: &mut dyn Canvas,
        cache: &mut TileCache,
        at: DrawContext,
        rect: TileRect,
        clock: Duration,
    ) -> Result<(), MapError> {
        self.draw_layers(self.background_layers(), canvas, cache, at, rect, clock)
    }

    pub fn draw_foreground(
        &self,
        canvas: &mut dyn Canvas,
        cache: &mut TileCache,
        at: DrawContext,
        rect: TileRect,
        clock: Duration,
    ) -> Result<(), MapError> {
        self.draw_layers(self.foreground_layers(), canvas, cache, at, rect, clock)
    }

    fn draw_layers(
        &self,
        layers: Range<usize>,
        canvas: &mut dyn Canvas,
        cache: &mut TileCache,
        at: DrawContext,
        rect: TileRect,
        clock: Duration,
    ) -> Result<(), MapError> {
        let mut renderer = Renderer::new(self, cache, clock);
        for i in layers {
            renderer.render_rect_layer(canvas, at, i, rect)?;
        }
        Ok(())
    }
}

fn hole_from_object(object: &IrObject, tile_size: u32) -> Result<Hole, MapError> {
    let missing = |name: &str| MapError::MissingProperty {
        object_id: object.id,
        name: name.to_owned(),
    };
    let to_map = object
        .properties
        .get_non_empty("to_map")
        .ok_or_else(|| missing("to_map"))?
        .to_owned();
    let to_x = object.properties.get_i32("to_x").ok_or_else(|| missing("to_x"))?;
    let to_y = object.properties.get_i32("to_y").ok_or_else(|| missing("to_y"))?;

    Ok(Hole {
        object_id: object.id,
        source: TileRect::from_pixels(object.x, object.y, object.width, object.height, tile_size),
        to_map,
        to: ivec2(to_x, to_y),
    })
}
