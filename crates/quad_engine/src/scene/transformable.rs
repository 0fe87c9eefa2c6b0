//! Position, rotation, scale and origin of a 2D object
//!
//! The matrix is rebuilt lazily: setters only mark it dirty and
//! [`Transformable2D::calculate_matrix`] recomputes it, reporting whether
//! anything changed so callers know when bounds have to be refreshed.

use crate::foundation::math::{utils, TransformMatrix, Vec2};

/// Local 2D transform with a cached matrix
#[derive(Debug, Clone, PartialEq)]
pub struct Transformable2D {
    position: Vec2,
    origin: Vec2,
    scale: Vec2,
    rotation: f32,
    matrix: TransformMatrix,
    dirty: bool,
}

impl Default for Transformable2D {
    fn default() -> Self {
        Self {
            position: Vec2::zeros(),
            origin: Vec2::zeros(),
            scale: Vec2::new(1.0, 1.0),
            rotation: 0.0,
            matrix: TransformMatrix::identity(),
            dirty: false,
        }
    }
}

impl Transformable2D {
    /// Identity transform
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the matrix if a setter ran since the last call.
    ///
    /// The matrix maps local coordinates to parent coordinates:
    /// `translate(position) * rotate(rotation) * scale(scale) * translate(-origin)`.
    /// Returns true when the matrix was rebuilt.
    pub fn calculate_matrix(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        self.matrix = TransformMatrix::identity()
            .translate(self.position)
            .rotate(utils::deg_to_rad(self.rotation))
            .scale(self.scale)
            .translate(-self.origin);
        self.dirty = false;
        true
    }

    /// Whether a setter ran since the matrix was last built
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Matrix as of the last [`Transformable2D::calculate_matrix`]
    pub fn matrix(&self) -> TransformMatrix {
        self.matrix
    }

    /// Inverse of [`Transformable2D::matrix`]
    pub fn inverse_matrix(&self) -> TransformMatrix {
        self.matrix.affine_inv()
    }

    /// Position in parent coordinates
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Set the position
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.dirty = true;
    }

    /// Rotation in degrees, in `[0, 360)`
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Set the rotation in degrees
    pub fn set_rotation(&mut self, degrees: f32) {
        self.rotation = utils::normalize_degrees(degrees);
        self.dirty = true;
    }

    /// Scale factors
    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    /// Set the scale factors
    pub fn set_scale(&mut self, scale: Vec2) {
        self.scale = scale;
        self.dirty = true;
    }

    /// Point in local coordinates that position, rotation and scale refer to
    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Set the origin
    pub fn set_origin(&mut self, origin: Vec2) {
        self.origin = origin;
        self.dirty = true;
    }

    /// Offset the position
    pub fn move_by(&mut self, offset: Vec2) {
        self.set_position(self.position + offset);
    }

    /// Rotate relative to the current rotation
    pub fn rotate(&mut self, degrees: f32) {
        self.set_rotation(self.rotation + degrees);
    }

    /// Multiply the scale component-wise
    pub fn scale_by(&mut self, factors: Vec2) {
        self.set_scale(self.scale.component_mul(&factors));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::VecExt;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-4;

    #[test]
    fn test_calculate_matrix_reports_changes() {
        let mut t = Transformable2D::new();
        assert!(!t.calculate_matrix());

        t.set_position(Vec2::new(3.0, 4.0));
        assert!(t.is_dirty());
        assert!(t.calculate_matrix());
        assert!(!t.calculate_matrix());
        assert!((t.matrix() * Vec2::zeros()).equals(&Vec2::new(3.0, 4.0), EPSILON));
    }

    #[test]
    fn test_origin_is_the_pivot() {
        let mut t = Transformable2D::new();
        t.set_origin(Vec2::new(5.0, 5.0));
        t.set_position(Vec2::new(100.0, 100.0));
        t.set_rotation(90.0);
        t.set_scale(Vec2::new(2.0, 2.0));
        t.calculate_matrix();

        assert!((t.matrix() * Vec2::new(5.0, 5.0)).equals(&Vec2::new(100.0, 100.0), EPSILON));
        assert!((t.matrix() * Vec2::new(6.0, 5.0)).equals(&Vec2::new(100.0, 102.0), EPSILON));
        let back = t.inverse_matrix() * Vec2::new(100.0, 102.0);
        assert!(back.equals(&Vec2::new(6.0, 5.0), EPSILON));
    }

    #[test]
    fn test_relative_setters() {
        let mut t = Transformable2D::new();
        t.move_by(Vec2::new(1.0, 2.0));
        t.move_by(Vec2::new(1.0, 2.0));
        t.rotate(-30.0);
        t.scale_by(Vec2::new(2.0, 3.0));

        assert_eq!(t.position(), Vec2::new(2.0, 4.0));
        assert_relative_eq!(t.rotation(), 330.0, epsilon = EPSILON);
        assert_eq!(t.scale(), Vec2::new(2.0, 3.0));
    }
}
