//! # Quad Engine
//!
//! A 2D game engine core built around a quadrant-tree render system.
//!
//! ## Features
//!
//! - **Spatial Indexing**: Drawables live in the deepest quadrant containing
//!   their bounds and are relocated in O(depth) when they move
//! - **Culling**: Each frame only the quadrants under the camera are visited
//! - **Layered Drawing**: Draw calls are ordered by layer with minimal shader
//!   rebinding
//! - **Scene Graph**: Node hierarchy with transform propagation and signals
//! - **Backend Agnostic**: Rendering goes through the [`render::RenderBackend`]
//!   trait; a recording backend is included
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quad_engine::prelude::*;
//!
//! fn main() -> Result<(), GameError> {
//!     let mut game = Game::from_config(GameConfig::default(), HeadlessBackend::new())?;
//!
//!     if let Some(state) = game.world_mut().state_mut(0) {
//!         let sprite = Sprite::new(TextureHandle(1), Vec2i::new(32, 32));
//!         state.add_node(
//!             None,
//!             Node2D::with_sprite(sprite)
//!                 .with_hook(|node, dt| node.move_by(Vec2::new(60.0 * dt, 0.0))),
//!         )?;
//!     }
//!
//!     let stats = game.run_frames(60, 1.0 / 60.0);
//!     log::info!("Drew {} sprites", stats.drawn);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod events;
pub mod spatial;
pub mod render;
pub mod scene;

mod game;

pub use game::{Game, GameError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        Game, GameError,
        config::{CameraConfig, ClearConfig, Config, GameConfig, QuadGridConfig, StateConfig},
        events::{Signal, SignalArg, SignalBus, SignalKind},
        foundation::math::{FloatRect, IntRect, TransformMatrix, Vec2, Vec2i},
        render::{
            Camera2D, Color, Drawable, DrawableId, FrameStats, HeadlessBackend, QTreeRenderSystem,
            RenderBackend, ShaderHandle, TextureHandle,
        },
        scene::{Node2D, NodeId, SceneError, SceneState, Sprite, World},
        spatial::{QuadTree, QuadTreeBuilder},
    };
}
