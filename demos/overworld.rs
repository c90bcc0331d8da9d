use macroquad::prelude::*;
use overworld::{
    Canvas, Collider, Config, Context, Direction, DrawContext, FileMapSource, Localisation,
    MacroquadCanvas, Sprite, SpriteRegistry, Tick, TilePos, UpdateInfo, World,
};
use std::path::Path;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const START_MAP: &str = "Pallet_Town";
const START_POS: TilePos = IVec2::new(8, 8);
/// Tiles per second.
const WALK_SPEED: f32 = 4.0;

fn window_conf() -> Conf {
    let cfg = Config::default();
    Conf {
        window_title: "Overworld".into(),
        window_width: cfg.screen_width,
        window_height: cfg.screen_height,
        ..Default::default()
    }
}

/// Square walker steered with the arrow keys.
struct Player {
    pos: TilePos,
    tile_size: f32,
    step: Option<(Direction, f32)>,
}

impl Player {
    fn held_direction() -> Option<Direction> {
        [
            (KeyCode::Up, Direction::Up),
            (KeyCode::Down, Direction::Down),
            (KeyCode::Left, Direction::Left),
            (KeyCode::Right, Direction::Right),
        ]
        .into_iter()
        .find(|(key, _)| is_key_down(*key))
        .map(|(_, d)| d)
    }
}

impl Sprite for Player {
    fn position(&self) -> TilePos {
        self.pos
    }

    fn set_position(&mut self, pos: TilePos) {
        self.pos = pos;
        self.step = None;
    }

    fn collision(&self) -> bool {
        true
    }

    fn collision_position(&self) -> TilePos {
        match self.step {
            Some((d, _)) => self.pos + d.delta(),
            None => self.pos,
        }
    }

    fn pixel_offset(&self) -> Vec2 {
        match self.step {
            Some((d, progress)) => d.delta().as_vec2() * progress * self.tile_size,
            None => Vec2::ZERO,
        }
    }

    fn update(&mut self, _ctx: &Context, info: &UpdateInfo<'_>) -> anyhow::Result<()> {
        match self.step {
            Some((d, progress)) => {
                let progress = progress + info.tick.delta.as_secs_f32() * WALK_SPEED;
                if progress >= 1.0 {
                    self.pos += d.delta();
                    self.step = None;
                } else {
                    self.step = Some((d, progress));
                }
            }
            None => {
                if let Some(d) = Self::held_direction() {
                    if !info.collider.check_collision(d, self.pos + d.delta()) {
                        self.step = Some((d, 0.0));
                    }
                }
            }
        }
        Ok(())
    }

    fn draw(&self, _ctx: &Context, canvas: &mut dyn Canvas, at: DrawContext) -> anyhow::Result<()> {
        let local = self.pos.as_vec2() * self.tile_size + self.pixel_offset();
        let screen = at.screen_pos(local);
        let size = self.tile_size * at.scale;
        canvas.fill_rect(Rect::new(screen.x, screen.y, size, size), RED);
        Ok(())
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn load_context() -> anyhow::Result<Context> {
    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let localisation = if Path::new(&config.localisation_dir).is_dir() {
        Localisation::load_dir(&config.localisation_dir)?
    } else {
        Localisation::new()
    };
    Ok(Context::new(config, localisation))
}

/// Moves the player onto the neighbouring map once it walks off the edge.
fn follow_player(world: &mut World, player: &mut dyn Sprite) -> anyhow::Result<()> {
    let Some((map, local)) = world.actual_position(player.position()) else {
        return Ok(());
    };
    if map.id() != world.current_map().id() {
        world.move_to(map.id())?;
        player.set_position(local);
        world.prefetch_adjacent();
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let ctx = load_context()?;
    let source = FileMapSource::new(&ctx.config.maps_dir);
    let mut world = World::new(
        ctx.config.clone(),
        Box::new(source),
        SpriteRegistry::with_defaults(),
        START_MAP,
    )?;
    world.prefetch_adjacent();
    info!(map = START_MAP, "entering overworld");

    let mut canvas = MacroquadCanvas::new();
    let mut sprites: Vec<Box<dyn Sprite>> = vec![Box::new(Player {
        pos: START_POS,
        tile_size: ctx.config.tile_size as f32,
        step: None,
    })];
    let mut last = Instant::now();

    loop {
        let now = Instant::now();
        let tick = Tick {
            delta: now - last,
        };
        last = now;

        let collider: &dyn Collider = &world;
        sprites[0].update(&ctx, &UpdateInfo { collider, tick })?;
        follow_player(&mut world, &mut *sprites[0])?;
        let current = world.current_map().id().to_owned();
        world.update(&ctx, &mut sprites, tick)?;
        if world.current_map().id() != current {
            world.prefetch_adjacent();
        }
        world.center_on(&*sprites[0]);

        clear_background(BLACK);
        world.draw(&ctx, &mut canvas, &sprites, now)?;
        next_frame().await;
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        error!(error = ?err, "overworld stopped");
    }
}
