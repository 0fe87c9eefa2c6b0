//! Game context
//!
//! [`Game`] ties the configuration, the world and the render backend
//! together and drives frames. It is an ordinary value owned by the
//! application; nothing in the engine reaches it through global state.

use std::path::Path;

use thiserror::Error;

use crate::config::{Config, ConfigError, GameConfig};
use crate::render::api::RenderBackend;
use crate::render::systems::FrameStats;
use crate::scene::{SceneError, World};

/// Game context owning the world and the backend it renders to
#[derive(Debug)]
pub struct Game<B: RenderBackend = Box<dyn RenderBackend>> {
    config: GameConfig,
    world: World,
    backend: B,
    frames: u64,
}

impl<B: RenderBackend> Game<B> {
    /// Validate `config` and build one scene state per configured state
    pub fn from_config(config: GameConfig, backend: B) -> Result<Self, GameError> {
        config.validate()?;
        let world = World::from_config(&config)?;
        log::info!(
            "Initialized '{}' with {} states",
            config.app_name,
            world.len()
        );
        Ok(Self {
            config,
            world,
            backend,
            frames: 0,
        })
    }

    /// Load a TOML or RON config file and build the game from it
    pub fn load(path: impl AsRef<Path>, backend: B) -> Result<Self, GameError> {
        let config = GameConfig::load_from_file(path)?;
        Self::from_config(config, backend)
    }

    /// Advance the world by `delta` seconds and render one frame
    pub fn tick(&mut self, delta: f32) -> FrameStats {
        let relocated = self.world.update(delta);
        let stats = self.world.render(&mut self.backend, &self.config.clear);
        self.frames += 1;
        log::trace!(
            "Frame {}: {} relocated, {:?}",
            self.frames,
            relocated,
            stats
        );
        stats
    }

    /// Run `count` ticks of `delta` seconds, returning accumulated stats
    pub fn run_frames(&mut self, count: u32, delta: f32) -> FrameStats {
        let mut total = FrameStats::default();
        for _ in 0..count {
            total += self.tick(delta);
        }
        total
    }

    /// Configuration the game was built from
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Scene states
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable scene states
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Render backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable render backend
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Number of ticks run so far
    pub fn frame_count(&self) -> u64 {
        self.frames
    }
}

/// Game setup errors
#[derive(Error, Debug)]
pub enum GameError {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Scene setup failed
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),
}
