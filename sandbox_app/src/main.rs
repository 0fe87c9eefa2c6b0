//! Quadrant Tree Sandbox
//!
//! Drives the engine without a window:
//! - Loads a game config (first argument, `game.toml` if present, defaults otherwise)
//! - Spawns ships bouncing around the world of the first state
//! - Adds a static overlay to the second state, if configured
//! - Renders a fixed number of frames through the recording backend and logs
//!   culling statistics

use std::path::Path;

use quad_engine::config::{Config, GameConfig};
use quad_engine::foundation::logging;
use quad_engine::foundation::math::{FloatRect, IntRect, Vec2, Vec2i};
use quad_engine::render::{
    BlendMode, Color, FrameStats, HeadlessBackend, ShaderHandle, TextureHandle,
};
use quad_engine::scene::{Node2D, SceneState, Sprite};
use quad_engine::{Game, GameError};
use rand::Rng;
use thiserror::Error;

const DEFAULT_CONFIG: &str = "game.toml";

// Simulation settings
const NUM_SHIPS: usize = 200;
const FRAMES: u32 = 600;
const FRAME_TIME: f32 = 1.0 / 60.0;
const REPORT_EVERY: u32 = 120;

// Ship settings
const SHIP_SIZE: i32 = 24;
const SHIP_SPEED: f32 = 150.0;
const SHIP_SPIN: f32 = 90.0;
const SHIP_SHADER: ShaderHandle = ShaderHandle(1);
const SHIP_TEXTURE: TextureHandle = TextureHandle(1);
const OVERLAY_SHADER: ShaderHandle = ShaderHandle(2);

#[derive(Error, Debug)]
enum SandboxError {
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("Config has no states")]
    NoStates,
}

fn load_config() -> Result<GameConfig, GameError> {
    if let Some(path) = std::env::args().nth(1) {
        return Ok(GameConfig::load_from_file(path)?);
    }
    if Path::new(DEFAULT_CONFIG).exists() {
        return Ok(GameConfig::load_from_file(DEFAULT_CONFIG)?);
    }
    Ok(GameConfig::default())
}

/// Spawn ships at random positions, each bouncing off the world edges
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn spawn_ships(state: &mut SceneState, count: usize) -> Result<(), GameError> {
    let Some(world) = state.render_system().root_quadrant().map(|tree| tree.area()) else {
        return Ok(());
    };
    let mut rng = rand::thread_rng();
    let sheet = Vec2i::new(SHIP_SIZE * 4, SHIP_SIZE);

    for i in 0..count {
        let size = SHIP_SIZE as f32;
        let max = (world.end() - Vec2::new(size, size)).sup(&(world.pos() + Vec2::new(1.0, 1.0)));
        let position = Vec2::new(
            rng.gen_range(world.pos().x..max.x),
            rng.gen_range(world.pos().y..max.y),
        );
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        let velocity = Vec2::new(angle.cos(), angle.sin()) * SHIP_SPEED;
        let frame = (i % 4) as i32;

        let sprite = Sprite::with_rect(
            SHIP_TEXTURE,
            sheet,
            IntRect::new(frame * SHIP_SIZE, 0, SHIP_SIZE, SHIP_SIZE),
        );
        let ship = Node2D::with_sprite(sprite)
            .named(format!("ship_{i}"))
            .at(position)
            .with_origin(Vec2::new(size / 2.0, size / 2.0))
            .on_layer((i % 3) as i32)
            .with_shader(SHIP_SHADER)
            .with_hook(bounce(world, velocity));
        state.add_node(None, ship)?;
    }

    log::info!("Spawned {} ships in {:?}", count, world);
    Ok(())
}

fn bounce(world: FloatRect, mut velocity: Vec2) -> impl FnMut(&mut Node2D, f32) {
    move |node, delta| {
        let mut position = node.position() + velocity * delta;
        if position.x < world.pos().x || position.x > world.end().x {
            velocity.x = -velocity.x;
            position.x = position.x.clamp(world.pos().x, world.end().x);
        }
        if position.y < world.pos().y || position.y > world.end().y {
            velocity.y = -velocity.y;
            position.y = position.y.clamp(world.pos().y, world.end().y);
        }
        node.set_position(position);
        node.rotate(SHIP_SPIN * delta);
    }
}

fn spawn_overlay(state: &mut SceneState) -> Result<(), GameError> {
    let panel = Node2D::with_sprite(Sprite::solid(200, 40))
        .named("status_panel")
        .at(Vec2::new(10.0, 10.0))
        .on_layer(100)
        .with_shader(OVERLAY_SHADER)
        .with_blend(BlendMode::Alpha)
        .with_color(Color::rgba(0.0, 0.0, 0.0, 0.6));
    state.add_node(None, panel)?;
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn run() -> Result<(), SandboxError> {
    let config = load_config()?;
    logging::init_with_level(config.log_level_filter());
    log::info!("Starting {}", config.app_name);

    let mut orders: Vec<i32> = config.states.iter().map(|s| s.order).collect();
    orders.sort_unstable();
    let (&main_order, overlay_order) = orders
        .split_first()
        .map(|(first, rest)| (first, rest.first().copied()))
        .ok_or(SandboxError::NoStates)?;

    let mut game = Game::from_config(config, HeadlessBackend::new())?;
    if let Some(state) = game.world_mut().state_mut(main_order) {
        spawn_ships(state, NUM_SHIPS)?;
    }
    if let Some(order) = overlay_order {
        if let Some(state) = game.world_mut().state_mut(order) {
            spawn_overlay(state)?;
        }
    }

    let mut total = FrameStats::default();
    for frame in 1..=FRAMES {
        let stats = game.tick(FRAME_TIME);
        total += stats;
        if frame % REPORT_EVERY == 0 {
            log::info!(
                "Frame {}: {} selected, {} drawn, {} shader binds",
                frame,
                stats.selected,
                stats.drawn,
                stats.shader_binds
            );
            // Keep the recording from growing without bound
            game.backend_mut().take_commands();
        }
    }

    log::info!(
        "Ran {} frames: {:.1} drawn per frame out of {} nodes, {} failed draws",
        game.frame_count(),
        total.drawn as f64 / f64::from(FRAMES),
        game.world().states().map(SceneState::len).sum::<usize>(),
        total.failed
    );
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        log::error!("Sandbox failed: {}", e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
