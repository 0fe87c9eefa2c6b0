//! Core primitive types for rendering
//!
//! This module contains the 2D camera whose view rectangle drives culling.

pub mod camera;

// Re-export commonly used types
pub use camera::Camera2D;
