//! # Game Configuration
//!
//! Describes a game as a list of states, each with its own camera and
//! quadrant grid. Missing fields fall back to their defaults so a config file
//! only needs to mention what it changes.

use std::collections::HashSet;

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use super::{Config, ConfigError};
use crate::foundation::logging;
use crate::foundation::math::Vec2;
use crate::render::api::{ClearFlags, Color};

/// Top-level game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Application name, used in log output
    pub app_name: String,
    /// Default log level (`error`, `warn`, `info`, `debug`, `trace`)
    pub log_level: String,
    /// Screen clear settings applied once per frame
    pub clear: ClearConfig,
    /// Game states, updated and rendered in ascending `order`
    pub states: Vec<StateConfig>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            app_name: "Quad Engine Game".to_string(),
            log_level: "info".to_string(),
            clear: ClearConfig::default(),
            states: vec![StateConfig::default()],
        }
    }
}

impl Config for GameConfig {}

impl GameConfig {
    /// Parsed `log_level`
    pub fn log_level_filter(&self) -> LevelFilter {
        logging::parse_level(&self.log_level)
    }

    /// Check values serde cannot check
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut orders = HashSet::new();
        for state in &self.states {
            if !orders.insert(state.order) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate state order {}",
                    state.order
                )));
            }
            state.camera.validate()?;
        }
        Ok(())
    }
}

/// Configuration of a single game state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// Position of the state in the update and render order
    pub order: i32,
    /// Whether the state is updated each tick
    pub updating: bool,
    /// Whether the state is rendered each tick
    pub rendering: bool,
    /// Initial camera
    pub camera: CameraConfig,
    /// World grid used to build the quadrant tree
    pub grid: QuadGridConfig,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            order: 0,
            updating: true,
            rendering: true,
            camera: CameraConfig::default(),
            grid: QuadGridConfig::default(),
        }
    }
}

/// Initial camera placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// View center in world coordinates
    pub center: [f32; 2],
    /// View width and height
    pub size: [f32; 2],
    /// Rotation in degrees
    pub rotation: f32,
    /// Zoom factor, greater than 1 magnifies
    pub zoom: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            center: [0.0, 0.0],
            size: [800.0, 600.0],
            rotation: 0.0,
            zoom: 1.0,
        }
    }
}

impl CameraConfig {
    /// View center as a vector
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.center[0], self.center[1])
    }

    /// View size as a vector
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.size[0], self.size[1])
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.size[0] <= 0.0 || self.size[1] <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "camera size must be positive, got {:?}",
                self.size
            )));
        }
        if self.zoom <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "camera zoom must be positive, got {}",
                self.zoom
            )));
        }
        Ok(())
    }
}

/// World grid consumed by the quadrant tree builder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadGridConfig {
    /// Top-left corner of the world
    pub origin: [f32; 2],
    /// Size of one leaf cell
    pub cell_size: [f32; 2],
    /// Number of cell columns
    pub columns: u32,
    /// Number of cell rows
    pub rows: u32,
}

impl Default for QuadGridConfig {
    fn default() -> Self {
        Self {
            origin: [0.0, 0.0],
            cell_size: [256.0, 256.0],
            columns: 8,
            rows: 8,
        }
    }
}

/// Per-frame screen clear
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClearConfig {
    /// Clear color as RGBA
    pub color: [f32; 4],
    /// Buffers to clear
    pub flags: ClearFlags,
}

impl Default for ClearConfig {
    fn default() -> Self {
        Self {
            color: [0.0, 0.0, 0.0, 1.0],
            flags: ClearFlags::COLOR,
        }
    }
}

impl ClearConfig {
    /// Clear color
    pub fn color(&self) -> Color {
        Color::from(self.color)
    }
}
