//! Math utilities and types
//!
//! Provides the fundamental vector types for 2D game development. Vector
//! arithmetic (add, subtract, scalar multiply, negate, dot, cross, length,
//! normalize) comes straight from `nalgebra`; this module adds the aliases the
//! rest of the engine uses and tolerance-based comparisons.

pub use nalgebra::{Matrix4, Vector2, Vector3, Vector4};

pub use super::rect::{FloatRect, IntRect, Rect};
pub use super::transform_matrix::TransformMatrix;

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 2D integer vector type
pub type Vec2i = Vector2<i32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// 2 * Pi
    pub const TAU: f32 = 2.0 * PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Bring an angle in degrees into the `[0, 360)` range
    pub fn normalize_degrees(angle: f32) -> f32 {
        let wrapped = angle.rem_euclid(360.0);
        // rem_euclid can round up to exactly 360.0 for tiny negative inputs
        if wrapped >= 360.0 {
            0.0
        } else {
            wrapped
        }
    }
}

/// Tolerance comparisons for float vectors.
///
/// `==` on nalgebra vectors is bit exact; `equals` treats components as equal
/// when they differ by no more than `precision`.
pub trait VecExt {
    /// Component-wise comparison with an absolute tolerance
    fn equals(&self, other: &Self, precision: f32) -> bool;
}

impl<const D: usize> VecExt for nalgebra::SVector<f32, D> {
    fn equals(&self, other: &Self, precision: f32) -> bool {
        self.iter()
            .zip(other.iter())
            .all(|(a, b)| (a - b).abs() <= precision)
    }
}
