//! Scene management system
//!
//! Provides the 2D scene graph that feeds the quadrant-tree render system.
//! Following Game Engine Architecture Chapter 11.2.7 - Scene Graphs.
//!
//! ## Architecture
//!
//! ```text
//! World (ordered scene states)
//!      ↓
//! SceneState (node hierarchy + signals)
//!      ↓
//! QTreeRenderSystem (spatial index, select/draw)
//! ```
//!
//! A scene state:
//! - Owns its nodes and resolves parent/child links by [`NodeId`]
//! - Propagates transforms down the hierarchy once per update
//! - Keeps the quadrant tree in sync with every drawable node's global bounds
//! - Removes nodes from the render system before dropping them

mod node;
mod scene_state;
mod sprite;
mod transformable;
mod world;

pub use node::{Node2D, NodeContent, NodeHook, NodeId};
pub use scene_state::SceneState;
pub use sprite::{Sprite, TEXTURE_RECT_UNIFORM};
pub use transformable::Transformable2D;
pub use world::World;

use crate::render::RenderSystemError;

/// Scene errors
///
/// Each one is logged where it is detected; the scene is left unchanged.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// Node does not exist in this scene state
    #[error("No such node: {0:?}")]
    NoSuchNode(NodeId),

    /// Another node already uses the name
    #[error("Duplicate node name: {0}")]
    DuplicateName(String),

    /// No state registered under the order key
    #[error("No such state: {0}")]
    NoSuchState(i32),

    /// A state is already registered under the order key
    #[error("Duplicate state order: {0}")]
    DuplicateState(i32),

    /// Reparenting would put the node inside its own subtree
    #[error("Cannot reparent {0:?} into its own subtree")]
    InvalidReparent(NodeId),

    /// Render system rejected the operation
    #[error(transparent)]
    Render(#[from] RenderSystemError),
}
