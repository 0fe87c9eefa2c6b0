//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Vector and matrix math
//! - Axis-aligned rectangles
//! - Logging utilities

pub mod math;
pub mod rect;
pub mod transform_matrix;
pub mod logging;
