mod common;

use common::*;
use macroquad::prelude::*;
use overworld::loader::json_loader::decode_map_str;
use overworld::render::Renderer;
use overworld::{
    Canvas, Config, Context, DrawContext, Localisation, Map, MapError, Sprite, SpriteRegistry,
    TileCache, TileFlip, TilePos, UpdateInfo, World,
};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};

type DrawLog = Rc<RefCell<Vec<u32>>>;

/// Sprite that writes its tag into a shared log when drawn.
struct Marker {
    tag: u32,
    pos: TilePos,
    log: DrawLog,
}

impl Sprite for Marker {
    fn position(&self) -> TilePos {
        self.pos
    }

    fn set_position(&mut self, pos: TilePos) {
        self.pos = pos;
    }

    fn collision(&self) -> bool {
        false
    }

    fn update(&mut self, _ctx: &Context, _info: &UpdateInfo<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    fn draw(&self, _ctx: &Context, _canvas: &mut dyn Canvas, _at: DrawContext) -> anyhow::Result<()> {
        self.log.borrow_mut().push(self.tag);
        Ok(())
    }
}

fn marker_registry(log: &DrawLog) -> SpriteRegistry {
    let mut registry = SpriteRegistry::new();
    let log = Rc::clone(log);
    registry.register("marker", move |obj| {
        Ok(Box::new(Marker {
            tag: obj.id,
            pos: TilePos::ZERO,
            log: Rc::clone(&log),
        }))
    });
    registry
}

fn build_map(json: Value) -> Map {
    let (ir, base) = decode_map_str(&json.to_string(), Path::new("mem/m.json")).expect("decode");
    Map::from_ir("m", ir, &base, &test_config(), &SpriteRegistry::new()).expect("build")
}

fn ctx_with(config: Config, localisation: Localisation) -> Context {
    Context::new(config, localisation)
}

#[test]
fn lower_sprites_are_drawn_on_top() {
    let log = DrawLog::default();
    let people = group(
        "sprite",
        vec![object(1, "marker", 4, 5), object(2, "marker", 6, 2)],
    );
    let source = MemorySource::new().with("A", map_json(10, 10, vec![], vec![people]));
    let mut world = world(source, marker_registry(&log), "A");

    let player: Vec<Box<dyn Sprite>> = vec![Box::new(Marker {
        tag: 100,
        pos: ivec2(0, 3),
        log: Rc::clone(&log),
    })];
    let ctx = ctx_with(test_config(), Localisation::new());
    let mut canvas = RecordingCanvas::new();
    world
        .draw(&ctx, &mut canvas, &player, Instant::now())
        .expect("draw");

    assert_eq!(*log.borrow(), [2, 100, 1]);
}

#[test]
fn sprites_split_background_from_foreground() {
    // gid 1 below the sprites, gid 3 above them.
    let people = group("sprite", vec![]);
    let roofs = tile_layer("roofs", 2, 2, 3);
    let source = MemorySource::new().with("A", map_json(2, 2, vec![], vec![people, roofs]));
    let mut world = world(source, SpriteRegistry::new(), "A");

    let ctx = ctx_with(test_config(), Localisation::new());
    let mut canvas = RecordingCanvas::new();
    world.draw(&ctx, &mut canvas, &[], Instant::now()).expect("draw");

    let sources: Vec<Rect> = canvas.blits().into_iter().map(|(src, _)| src).collect();
    let ground = Rect::new(0.0, 0.0, 16.0, 16.0);
    let roof = Rect::new(32.0, 0.0, 16.0, 16.0);
    assert_eq!(sources, [ground, ground, ground, ground, roof, roof, roof, roof]);

    let loads = canvas.ops.iter().filter(|op| matches!(op, Op::Load(_))).count();
    assert_eq!(loads, 1);
    assert_eq!(world.tile_cache().tileset_count(), 1);
    assert_eq!(world.tile_cache().tile_count(), 2);
}

#[test]
fn tiles_land_on_their_scaled_cells() {
    let map = build_map(map_json(3, 2, vec![], vec![]));
    let mut cache = TileCache::new();
    let mut canvas = RecordingCanvas::new();
    let at = DrawContext::new(2.0).moved(vec2(-8.0, 4.0));
    Renderer::new(&map, &mut cache, Duration::ZERO)
        .render_layer(&mut canvas, at, 0)
        .expect("render");

    let dests: Vec<Vec2> = canvas.blits().into_iter().map(|(_, dest)| dest).collect();
    assert_eq!(dests.len(), 6);
    assert_eq!(dests[0], vec2(-16.0, 8.0));
    assert_eq!(dests[4], vec2(16.0, 40.0));
    assert!(canvas.ops.iter().all(|op| !matches!(op, Op::Texture { scale, .. } if *scale != 2.0)));
}

#[test]
fn non_positive_scale_draws_like_culling_sees_it() {
    let config = Config {
        scale: 0,
        ..test_config()
    };
    let source = MemorySource::new().with("A", map_json(2, 2, vec![], vec![]));
    let mut world = World::new(config.clone(), Box::new(source), SpriteRegistry::new(), "A")
        .expect("world");
    world.move_pixel_pos_to(ivec2(0, 0));

    let ctx = ctx_with(config, Localisation::new());
    let mut canvas = RecordingCanvas::new();
    world.draw(&ctx, &mut canvas, &[], Instant::now()).expect("draw");

    let dests: Vec<Vec2> = canvas.blits().into_iter().map(|(_, dest)| dest).collect();
    assert_eq!(dests, [vec2(0.0, 0.0), vec2(16.0, 0.0), vec2(0.0, 16.0), vec2(16.0, 16.0)]);
    assert!(canvas.ops.iter().all(|op| !matches!(op, Op::Texture { scale, .. } if *scale != 1.0)));
}

#[test]
fn only_the_requested_rect_is_drawn() {
    let map = build_map(map_json(10, 10, vec![], vec![]));
    let mut cache = TileCache::new();
    let mut canvas = RecordingCanvas::new();
    Renderer::new(&map, &mut cache, Duration::ZERO)
        .render_rect_layer(&mut canvas, DrawContext::new(1.0), 0, overworld::TileRect::new(8, 8, 14, 9))
        .expect("render");
    let dests: Vec<Vec2> = canvas.blits().into_iter().map(|(_, dest)| dest).collect();
    assert_eq!(dests, [vec2(128.0, 128.0), vec2(144.0, 128.0)]);
}

#[test]
fn animation_frames_follow_the_first_duration() {
    // gid 4 is local 3, animating 3 -> 6 every 100ms.
    let map = build_map(json!({
        "width": 1, "height": 1, "tilewidth": 16, "tileheight": 16,
        "layers": [tile_layer("water", 1, 1, 4)],
        "tilesets": [tileset()]
    }));
    let frame_at = |ms: u64| {
        let mut cache = TileCache::new();
        let mut canvas = RecordingCanvas::new();
        Renderer::new(&map, &mut cache, Duration::from_millis(ms))
            .render_layer(&mut canvas, DrawContext::new(1.0), 0)
            .expect("render");
        canvas.blits()[0].0
    };
    let first = Rect::new(48.0, 0.0, 16.0, 16.0);
    let second = Rect::new(32.0, 16.0, 16.0, 16.0);
    assert_eq!(frame_at(0), first);
    assert_eq!(frame_at(99), first);
    assert_eq!(frame_at(150), second);
    assert_eq!(frame_at(250), first);
}

#[test]
fn flipped_tiles_keep_their_flags() {
    const FLIP_H: u32 = 0x8000_0000;
    const FLIP_D: u32 = 0x2000_0000;
    let map = build_map(json!({
        "width": 2, "height": 1, "tilewidth": 16, "tileheight": 16,
        "layers": [{"type": "tilelayer", "name": "ground", "width": 2, "height": 1,
                    "data": [2, (2 | FLIP_H | FLIP_D)]}],
        "tilesets": [tileset()]
    }));
    let mut cache = TileCache::new();
    let mut canvas = RecordingCanvas::new();
    Renderer::new(&map, &mut cache, Duration::ZERO)
        .render_layer(&mut canvas, DrawContext::new(1.0), 0)
        .expect("render");

    let flips: Vec<(Rect, TileFlip)> = canvas
        .ops
        .iter()
        .filter_map(|op| match op {
            Op::Texture { source, flip, .. } => Some((*source, *flip)),
            _ => None,
        })
        .collect();
    let tile = Rect::new(16.0, 0.0, 16.0, 16.0);
    assert_eq!(
        flips,
        [
            (tile, TileFlip::default()),
            (tile, TileFlip { h: true, v: false, d: true }),
        ]
    );
}

#[test]
fn missing_layer_is_an_error() {
    let map = build_map(map_json(1, 1, vec![], vec![]));
    let mut cache = TileCache::new();
    let mut canvas = RecordingCanvas::new();
    let err = Renderer::new(&map, &mut cache, Duration::ZERO)
        .render_layer(&mut canvas, DrawContext::new(1.0), 7)
        .expect_err("no layer 7");
    assert!(matches!(err, MapError::LayerOutOfBounds(7)));
}

#[test]
#[should_panic(expected = "opacity")]
fn translucent_layers_are_refused() {
    let mut fog = tile_layer("fog", 2, 2, 1);
    fog["opacity"] = json!(0.5);
    let source = MemorySource::new().with("A", map_json(2, 2, vec![], vec![fog]));
    let mut world = world(source, SpriteRegistry::new(), "A");
    let ctx = ctx_with(test_config(), Localisation::new());
    let _ = world.draw(&ctx, &mut RecordingCanvas::new(), &[], Instant::now());
}

#[test]
fn hidden_layers_are_skipped() {
    let mut hidden = tile_layer("hidden", 2, 2, 3);
    hidden["visible"] = json!(false);
    let map = build_map(map_json(2, 2, vec![], vec![hidden]));
    let mut cache = TileCache::new();
    let mut canvas = RecordingCanvas::new();
    Renderer::new(&map, &mut cache, Duration::ZERO)
        .render_layer(&mut canvas, DrawContext::new(1.0), 1)
        .expect("render");
    assert!(canvas.blits().is_empty());
}

fn banner_world() -> (World, Context) {
    let config = Config {
        screen_height: 140,
        banner_speed: 1.0,
        ..test_config()
    };
    let mut loc = Localisation::new();
    loc.insert("map.a", "Pallet Town");
    let source = MemorySource::new()
        .with("A", map_json(4, 4, vec![str_prop("name", "map.a")], vec![]))
        .with("B", map_json(4, 4, vec![str_prop("name", "map.b")], vec![]));
    let world = World::new(config.clone(), Box::new(source), SpriteRegistry::new(), "A")
        .expect("world");
    (world, ctx_with(config, loc))
}

#[test]
fn banner_runs_its_course_then_disappears() {
    let (mut world, ctx) = banner_world();
    let t0 = Instant::now();
    let at = |secs: u64| t0 + Duration::from_secs(secs);

    for secs in [0, 19, 20, 59, 60, 79] {
        let mut canvas = RecordingCanvas::new();
        assert!(world.draw_banner(&ctx, &mut canvas, at(secs)), "shown at {secs}");
        assert_eq!(canvas.texts(), ["Pallet Town"]);
    }

    let mut canvas = RecordingCanvas::new();
    assert!(!world.draw_banner(&ctx, &mut canvas, at(80)));
    assert!(canvas.ops.is_empty());
}

#[test]
fn banner_slides_in_from_above() {
    let (mut world, ctx) = banner_world();
    let t0 = Instant::now();
    let panel_top = |world: &mut World, secs: u64| {
        let mut canvas = RecordingCanvas::new();
        world.draw_banner(&ctx, &mut canvas, t0 + Duration::from_secs(secs));
        match canvas.ops.first() {
            Some(Op::Fill(rect, _)) => rect.y,
            other => panic!("expected panel fill, got {other:?}"),
        }
    };
    assert_eq!(panel_top(&mut world, 0), -20.0);
    assert_eq!(panel_top(&mut world, 19), -1.0);
    assert_eq!(panel_top(&mut world, 30), 0.0);
    assert_eq!(panel_top(&mut world, 79), -19.0);
}

#[test]
fn banner_restarts_only_on_a_real_map_change() {
    let (mut world, ctx) = banner_world();
    let t0 = Instant::now();
    let mut canvas = RecordingCanvas::new();
    world.draw_banner(&ctx, &mut canvas, t0);

    world.move_to("A").expect("same map");
    assert!(!world.draw_banner(&ctx, &mut canvas, t0 + Duration::from_secs(100)));

    // B has no translation, so its banner is skipped.
    world.move_to("B").expect("move to B");
    assert!(!world.draw_banner(&ctx, &mut canvas, t0 + Duration::from_secs(101)));

    world.move_to("A").expect("back to A");
    assert!(world.draw_banner(&ctx, &mut canvas, t0 + Duration::from_secs(200)));
}
