//! Active rendering systems
//!
//! This module contains stateful runtime systems that coordinate rendering.
//! The quadrant-tree render system indexes drawables spatially and drives the
//! per-frame select and draw phases.

pub mod qtree_render_system;

pub use qtree_render_system::{FrameStats, QTreeRenderSystem, PROJECTION_UNIFORM, VIEW_UNIFORM};
