//! Spatial partitioning data structures
//!
//! Provides the quadrant tree used to index drawables by region so that
//! per-frame culling only touches the part of the world under the camera.

mod builder;
mod quadrant;

pub use builder::QuadTreeBuilder;
pub use quadrant::{Corner, LayerMap, QuadTree, Quadrant, QuadrantId};
