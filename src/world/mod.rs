//! Stitches adjacent maps into one scrollable world.
//!
//! The [`World`] owns every loaded map, the tile cache and the camera. Each
//! tick the host calls [`World::update`] and each frame [`World::draw`].

mod banner;

pub use banner::{offset as banner_offset, Banner, BannerPhase};

use crate::config::{Config, Context};
use crate::error::MapError;
use crate::loader::MapSource;
use crate::map::Map;
use crate::render::cull::{self, Viewport};
use crate::render::{Canvas, DrawContext, TileCache};
use crate::spatial::{Direction, TilePos, TileRect};
use crate::sprite::{Collider, Sprite, SpriteRegistry, Tick, UpdateInfo};
use macroquad::prelude::*;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// A map that is at least partly on screen this frame.
#[derive(Debug, Clone)]
pub struct VisibleMap {
    pub map: Rc<Map>,
    /// Top-left corner relative to the viewport, unscaled pixels.
    pub offset: IVec2,
    /// Tiles intersecting the viewport.
    pub rect: TileRect,
}

pub struct World {
    config: Config,
    source: Box<dyn MapSource>,
    registry: SpriteRegistry,
    tile_cache: TileCache,
    map_cache: HashMap<String, Rc<Map>>,
    current: Rc<Map>,
    pix_pos: IVec2,
    first_render: Option<Instant>,
    banner: Banner,
    self_pos: Option<TilePos>,
}

impl World {
    /// Loads `initial` and makes it current.
    pub fn new(
        config: Config,
        source: Box<dyn MapSource>,
        registry: SpriteRegistry,
        initial: &str,
    ) -> Result<Self, MapError> {
        let current = Rc::new(Map::load(initial, source.as_ref(), &config, &registry)?);
        info!(map = initial, "world created");

        let mut map_cache = HashMap::new();
        map_cache.insert(initial.to_owned(), Rc::clone(&current));
        Ok(Self {
            banner: Banner::new(config.banner_speed),
            config,
            source,
            registry,
            tile_cache: TileCache::new(),
            map_cache,
            current,
            pix_pos: IVec2::ZERO,
            first_render: None,
            self_pos: None,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn current_map(&self) -> &Rc<Map> {
        &self.current
    }

    /// Cached map `id`, without loading it.
    pub fn cached(&self, id: &str) -> Option<Rc<Map>> {
        self.map_cache.get(id).cloned()
    }

    pub fn loaded_maps(&self) -> usize {
        self.map_cache.len()
    }

    pub fn tile_cache(&self) -> &TileCache {
        &self.tile_cache
    }

    /// Map `id`, loaded on first request and shared afterwards.
    pub fn load_map(&mut self, id: &str) -> Result<Rc<Map>, MapError> {
        if let Some(map) = self.map_cache.get(id) {
            return Ok(Rc::clone(map));
        }
        let map = Rc::new(Map::load(id, self.source.as_ref(), &self.config, &self.registry)?);
        info!(map = id, cached = self.map_cache.len() + 1, "loaded map");
        self.map_cache.insert(id.to_owned(), Rc::clone(&map));
        Ok(map)
    }

    /// Make `id` the current map. A failed load leaves the world untouched.
    pub fn move_to(&mut self, id: &str) -> Result<(), MapError> {
        if self.current.id() == id {
            return Ok(());
        }
        let map = self.load_map(id)?;
        info!(from = self.current.id(), to = id, "changed map");
        self.current = map;
        self.banner.reset();
        Ok(())
    }

    /// Loads every neighbour of the current map so crossing a border never
    /// waits on disk.
    pub fn prefetch_adjacent(&mut self) {
        let current = Rc::clone(&self.current);
        for (direction, id) in current.adjacent_maps() {
            if let Err(err) = self.load_map(id) {
                warn!(map = current.id(), %direction, neighbour = %id, error = %err, "prefetch failed");
            }
        }
    }

    /// Camera position: top-left of the current map relative to the viewport.
    pub fn pixel_pos(&self) -> IVec2 {
        self.pix_pos
    }

    pub fn move_pixel_pos_to(&mut self, pos: IVec2) {
        self.pix_pos = pos;
    }

    /// Place the camera so `sprite` sits in the middle of the screen.
    pub fn center_on(&mut self, sprite: &dyn Sprite) {
        let ts = self.current.tile_size() as i32;
        let center = sprite.position() * ts + sprite.pixel_offset().as_ivec2() + IVec2::splat(ts / 2);
        self.pix_pos = self.viewport().world_size() / 2 - center;
    }

    fn viewport(&self) -> Viewport {
        Viewport::new(self.config.screen_width, self.config.screen_height, self.config.scale)
    }

    /// One simulation tick.
    ///
    /// `sprites` are the world-global sprites (the player); they are not
    /// updated here but decide the occupied cell and trigger holes.
    pub fn update(
        &mut self,
        ctx: &Context,
        sprites: &mut [Box<dyn Sprite>],
        tick: Tick,
    ) -> anyhow::Result<()> {
        for s in sprites.iter().filter(|s| s.collision()) {
            self.self_pos = Some(s.collision_position());
        }

        let map = Rc::clone(&self.current);
        let mut own = map.take_sprites();
        let result = self.update_map_sprites(ctx, &mut own, tick);
        map.restore_sprites(own);
        result?;

        self.resolve_holes(sprites);
        Ok(())
    }

    fn update_map_sprites(
        &self,
        ctx: &Context,
        own: &mut [Box<dyn Sprite>],
        tick: Tick,
    ) -> anyhow::Result<()> {
        for i in 0..own.len() {
            let (before, rest) = own.split_at_mut(i);
            let Some((sprite, after)) = rest.split_first_mut() else {
                break;
            };
            let collider = NeighbourCollider {
                world: self,
                others: [&*before, &*after],
            };
            let info = UpdateInfo {
                collider: &collider,
                tick,
            };
            sprite.update(ctx, &info)?;
        }
        Ok(())
    }

    /// Sends the first global sprite standing in a hole of the current map
    /// to the hole's target. At most one hole fires per call; returns whether
    /// one did.
    pub fn resolve_holes(&mut self, sprites: &mut [Box<dyn Sprite>]) -> bool {
        let map = Rc::clone(&self.current);
        for hole in map.holes() {
            let Some(sprite) = sprites
                .iter_mut()
                .find(|s| s.collision() && hole.source.contains(s.position()))
            else {
                continue;
            };
            match self.move_to(&hole.to_map) {
                Ok(()) => {
                    sprite.set_position(hole.to);
                    debug!(hole = hole.object_id, to_map = %hole.to_map, to = ?hole.to, "took hole");
                    return true;
                }
                Err(err) => {
                    error!(map = map.id(), hole = hole.object_id, to_map = %hole.to_map, error = %err, "map transition failed");
                    return false;
                }
            }
        }
        false
    }

    /// Current map plus every neighbour that reaches into the viewport,
    /// positioned edge to edge from the camera. Each map appears once.
    /// Neighbours that fail to load are logged and left out.
    pub fn visible_maps(&mut self) -> Vec<VisibleMap> {
        let vp = self.viewport();
        let mut out = Vec::new();
        let current = Rc::clone(&self.current);
        self.collect_visible(current, self.pix_pos, vp, &mut out);
        out
    }

    fn collect_visible(
        &mut self,
        map: Rc<Map>,
        offset: IVec2,
        vp: Viewport,
        out: &mut Vec<VisibleMap>,
    ) {
        let pixel_size = map.pixel_size();
        out.push(VisibleMap {
            map: Rc::clone(&map),
            offset,
            rect: cull::visible_tile_rect(offset, map.size(), map.tile_size() as i32, vp),
        });

        for (&direction, id) in map.adjacent_maps() {
            if !cull::neighbor_visible(direction, offset, pixel_size, vp) {
                continue;
            }
            let next = match self.load_map(id) {
                Ok(next) => next,
                Err(err) => {
                    warn!(map = map.id(), %direction, neighbour = %id, error = %err, "neighbour not drawn");
                    continue;
                }
            };
            if out.iter().any(|v| v.map.id() == next.id()) {
                continue;
            }
            let next_offset = cull::neighbor_offset(direction, offset, pixel_size, next.pixel_size());
            self.collect_visible(next, next_offset, vp, out);
        }
    }

    /// Draw one frame: visible backgrounds, sprites sorted by row, visible
    /// foregrounds, then the map-name banner.
    pub fn draw(
        &mut self,
        ctx: &Context,
        canvas: &mut dyn Canvas,
        sprites: &[Box<dyn Sprite>],
        now: Instant,
    ) -> anyhow::Result<()> {
        let first = *self.first_render.get_or_insert(now);
        let clock = now.saturating_duration_since(first);
        let visible = self.visible_maps();
        let base = DrawContext::new(self.viewport().scale as f32);

        for v in &visible {
            let at = base.moved(v.offset.as_vec2());
            v.map.draw_background(canvas, &mut self.tile_cache, at, v.rect, clock)?;
        }

        {
            let own = self.current.sprites();
            let mut order: Vec<&dyn Sprite> = sprites
                .iter()
                .chain(own.iter())
                .map(|s| &**s)
                .collect();
            order.sort_by_key(|s| s.position().y);

            let at = base.moved(self.pix_pos.as_vec2());
            for s in order {
                s.draw(ctx, canvas, at)?;
            }
        }

        for v in &visible {
            let at = base.moved(v.offset.as_vec2());
            v.map.draw_foreground(canvas, &mut self.tile_cache, at, v.rect, clock)?;
        }

        self.draw_banner(ctx, canvas, now);
        Ok(())
    }

    /// Returns whether the banner was drawn.
    pub fn draw_banner(&mut self, ctx: &Context, canvas: &mut dyn Canvas, now: Instant) -> bool {
        match self.current.name(&ctx.localisation) {
            Some(name) => self.banner.draw(canvas, &self.config, name, now),
            None => false,
        }
    }

    /// Resolve `pos`, given in current-map coordinates, to the cached map
    /// that contains it.
    pub fn actual_position(&self, pos: TilePos) -> Option<(Rc<Map>, TilePos)> {
        self.resolve_from(&self.current, pos)
    }

    /// Like [`World::actual_position`] with `pos` relative to `start`. Only
    /// maps already in the cache are walked through.
    pub fn resolve_from(&self, start: &Rc<Map>, pos: TilePos) -> Option<(Rc<Map>, TilePos)> {
        let mut map = Rc::clone(start);
        let mut pos = pos;
        // Each hop enters a new map, so more hops than that means a loop.
        for _ in 0..=2 * self.map_cache.len() {
            let direction = if pos.y < 0 {
                Direction::Up
            } else if pos.y >= map.height() as i32 {
                Direction::Down
            } else if pos.x < 0 {
                Direction::Left
            } else if pos.x >= map.width() as i32 {
                Direction::Right
            } else {
                return Some((map, pos));
            };

            let next = self.cached(map.adjacent(direction)?)?;
            pos = match direction {
                Direction::Up => pos + ivec2(0, next.height() as i32),
                Direction::Down => pos - ivec2(0, map.height() as i32),
                Direction::Left => pos + ivec2(next.width() as i32, 0),
                Direction::Right => pos - ivec2(map.width() as i32, 0),
            };
            map = next;
        }
        warn!(start = start.id(), "adjacency loop while resolving position");
        None
    }
}

impl Collider for World {
    fn check_collision(&self, direction: Direction, pos: TilePos) -> bool {
        if self.self_pos == Some(pos) {
            return true;
        }
        match self.actual_position(pos) {
            Some((map, local)) => map.check_collision(direction, local),
            None => true,
        }
    }
}

/// Collision seen by one map sprite during its update: its siblings, then
/// the world.
struct NeighbourCollider<'a> {
    world: &'a World,
    others: [&'a [Box<dyn Sprite>]; 2],
}

impl Collider for NeighbourCollider<'_> {
    fn check_collision(&self, direction: Direction, pos: TilePos) -> bool {
        let blocked = self
            .others
            .iter()
            .flat_map(|group| group.iter())
            .any(|s| s.collision() && s.collision_position() == pos);
        blocked || self.world.check_collision(direction, pos)
    }
}
