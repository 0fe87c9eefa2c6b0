//! 4x4 affine transformation matrix
//!
//! `TransformMatrix` wraps a column-major `nalgebra` 4x4 matrix and offers a
//! chainable builder API in two flavours: a 2D convenience API operating in
//! the XY plane and a general 3D API.
//!
//! ## Composition order
//!
//! Every builder call post-multiplies: `m.translate(t).rotate(r).scale(s)`
//! yields `M * T * R * S`, so a point is scaled first, then rotated, then
//! translated. Pivot variants wrap the operation in a translate-to-pivot /
//! translate-back pair (`M * T(p) * Op * T(-p)`).

use std::ops::{Mul, MulAssign};

use nalgebra::Unit;

use super::math::{FloatRect, Mat4, Vec2, Vec3, Vec4};

/// 4x4 transformation matrix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformMatrix(Mat4);

impl Default for TransformMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<Mat4> for TransformMatrix {
    fn from(mat: Mat4) -> Self {
        Self(mat)
    }
}

impl TransformMatrix {
    /// Identity matrix
    pub fn identity() -> Self {
        Self(Mat4::identity())
    }

    /// Build a matrix from 16 values given row by row
    #[rustfmt::skip]
    pub fn from_rows(rows: [[f32; 4]; 4]) -> Self {
        let [r0, r1, r2, r3] = rows;
        Self(Mat4::new(
            r0[0], r0[1], r0[2], r0[3],
            r1[0], r1[1], r1[2], r1[3],
            r2[0], r2[1], r2[2], r2[3],
            r3[0], r3[1], r3[2], r3[3],
        ))
    }

    /// Underlying nalgebra matrix
    pub fn matrix(&self) -> &Mat4 {
        &self.0
    }

    /// Element at `row`, `col`
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.0[(row, col)]
    }

    /// Mutable element at `row`, `col`
    pub fn get_mut(&mut self, row: usize, col: usize) -> &mut f32 {
        &mut self.0[(row, col)]
    }

    /// Column-major element slice, ready for uniform upload
    pub fn as_slice(&self) -> &[f32] {
        self.0.as_slice()
    }

    /// Full inverse. A singular matrix yields a matrix of NaNs, use
    /// [`TransformMatrix::try_inv`] to detect that case.
    pub fn inv(&self) -> Self {
        self.try_inv()
            .unwrap_or_else(|| Self(Mat4::from_element(f32::NAN)))
    }

    /// Full inverse, `None` for singular matrices
    pub fn try_inv(&self) -> Option<Self> {
        self.0.try_inverse().map(Self)
    }

    /// Determinant
    pub fn det(&self) -> f32 {
        self.0.determinant()
    }

    /// Transposed matrix
    pub fn transpose(&self) -> Self {
        Self(self.0.transpose())
    }

    /// Fast inverse for affine matrices (no projective row).
    ///
    /// Only the upper 3x3 block is inverted; the translation column is
    /// rotated back through it.
    pub fn affine_inv(&self) -> Self {
        let linear = self.0.fixed_view::<3, 3>(0, 0).into_owned();
        let Some(inv_linear) = linear.try_inverse() else {
            return Self(Mat4::from_element(f32::NAN));
        };
        let translation = self.0.fixed_view::<3, 1>(0, 3).into_owned();
        let inv_translation = -(inv_linear * translation);

        let mut result = Mat4::identity();
        result.fixed_view_mut::<3, 3>(0, 0).copy_from(&inv_linear);
        result.fixed_view_mut::<3, 1>(0, 3).copy_from(&inv_translation);
        Self(result)
    }

    /// Inverse transpose, used to transform normal vectors
    pub fn inv_transpose(&self) -> Self {
        self.inv().transpose()
    }

    /// Compare element-wise with an absolute tolerance
    pub fn equals(&self, other: &Self, precision: f32) -> bool {
        approx::abs_diff_eq!(self.0, other.0, epsilon = precision)
    }

    // 2D API

    /// Translate in the XY plane
    #[must_use]
    pub fn translate(self, offset: Vec2) -> Self {
        self.translate3(Vec3::new(offset.x, offset.y, 0.0))
    }

    /// Scale in the XY plane
    #[must_use]
    pub fn scale(self, factors: Vec2) -> Self {
        self.scale3(Vec3::new(factors.x, factors.y, 1.0))
    }

    /// Scale in the XY plane around a pivot point
    #[must_use]
    pub fn scale_about(self, factors: Vec2, pivot: Vec2) -> Self {
        self.scale3_about(
            Vec3::new(factors.x, factors.y, 1.0),
            Vec3::new(pivot.x, pivot.y, 0.0),
        )
    }

    /// Rotate around the Z axis, angle in radians
    #[must_use]
    pub fn rotate(self, angle: f32) -> Self {
        self.rotate3(angle, Vec3::z())
    }

    /// Rotate around the Z axis through a pivot point, angle in radians
    #[must_use]
    pub fn rotate_about(self, angle: f32, pivot: Vec2) -> Self {
        self.rotate3_about(angle, Vec3::z(), Vec3::new(pivot.x, pivot.y, 0.0))
    }

    // 3D API

    /// Translate by a 3D offset
    #[must_use]
    pub fn translate3(self, offset: Vec3) -> Self {
        Self(self.0 * Mat4::new_translation(&offset))
    }

    /// Scale along the three axes
    #[must_use]
    pub fn scale3(self, factors: Vec3) -> Self {
        Self(self.0 * Mat4::new_nonuniform_scaling(&factors))
    }

    /// Scale along the three axes around a pivot point
    #[must_use]
    pub fn scale3_about(self, factors: Vec3, pivot: Vec3) -> Self {
        self.translate3(pivot).scale3(factors).translate3(-pivot)
    }

    /// Rotate around an arbitrary axis, angle in radians.
    ///
    /// A zero-length axis leaves the matrix unchanged.
    #[must_use]
    pub fn rotate3(self, angle: f32, axis: Vec3) -> Self {
        match Unit::try_new(axis, f32::EPSILON) {
            Some(axis) => Self(self.0 * Mat4::from_axis_angle(&axis, angle)),
            None => self,
        }
    }

    /// Rotate around an arbitrary axis through a pivot point
    #[must_use]
    pub fn rotate3_about(self, angle: f32, axis: Vec3, pivot: Vec3) -> Self {
        self.translate3(pivot).rotate3(angle, axis).translate3(-pivot)
    }
}

impl Mul for TransformMatrix {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self(self.0 * rhs.0)
    }
}

impl MulAssign for TransformMatrix {
    fn mul_assign(&mut self, rhs: Self) {
        self.0 *= rhs.0;
    }
}

impl Mul<Vec4> for TransformMatrix {
    type Output = Vec4;

    fn mul(self, rhs: Vec4) -> Vec4 {
        self.0 * rhs
    }
}

impl Mul<Vec3> for TransformMatrix {
    type Output = Vec3;

    /// Transforms a point (w = 1)
    fn mul(self, rhs: Vec3) -> Vec3 {
        (self.0 * rhs.push(1.0)).xyz()
    }
}

impl Mul<Vec2> for TransformMatrix {
    type Output = Vec2;

    /// Transforms a point in the XY plane (z = 0, w = 1)
    fn mul(self, rhs: Vec2) -> Vec2 {
        (self.0 * Vec4::new(rhs.x, rhs.y, 0.0, 1.0)).xy()
    }
}

impl Mul<FloatRect> for TransformMatrix {
    type Output = FloatRect;

    /// Transforms all four corners and returns their axis-aligned bounds
    fn mul(self, rhs: FloatRect) -> FloatRect {
        let pos = rhs.pos();
        let end = rhs.end();
        let corners = [
            self * pos,
            self * Vec2::new(end.x, pos.y),
            self * Vec2::new(pos.x, end.y),
            self * end,
        ];

        let (mut min, mut max) = (corners[0], corners[0]);
        for corner in &corners[1..] {
            min = min.inf(corner);
            max = max.sup(corner);
        }
        FloatRect::from_pos(min, max.x - min.x, max.y - min.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{constants::PI, VecExt};
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_default_is_identity() {
        let m = TransformMatrix::default();
        assert_eq!(m, TransformMatrix::identity());
        assert_relative_eq!(m.det(), 1.0, epsilon = EPSILON);
    }

    #[test]
    fn test_translate_then_scale_order() {
        let m = TransformMatrix::identity()
            .translate(Vec2::new(10.0, 5.0))
            .scale(Vec2::new(2.0, 3.0));
        let p = m * Vec2::new(1.0, 1.0);
        assert!(p.equals(&Vec2::new(12.0, 8.0), EPSILON));
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let m = TransformMatrix::identity().rotate(PI / 2.0);
        let p = m * Vec2::new(1.0, 0.0);
        assert!(p.equals(&Vec2::new(0.0, 1.0), EPSILON));
    }

    #[test]
    fn test_rotate_about_pivot_keeps_pivot_fixed() {
        let pivot = Vec2::new(5.0, 5.0);
        let m = TransformMatrix::identity().rotate_about(PI / 3.0, pivot);
        assert!((m * pivot).equals(&pivot, EPSILON));

        let s = TransformMatrix::identity().scale_about(Vec2::new(4.0, 4.0), pivot);
        assert!((s * pivot).equals(&pivot, EPSILON));
        assert!((s * Vec2::new(6.0, 5.0)).equals(&Vec2::new(9.0, 5.0), EPSILON));
    }

    #[test]
    fn test_3d_api() {
        let m = TransformMatrix::identity()
            .translate3(Vec3::new(0.0, 0.0, 2.0))
            .rotate3(PI / 2.0, Vec3::x())
            .scale3(Vec3::new(1.0, 2.0, 1.0));
        let p = m * Vec3::new(0.0, 1.0, 0.0);
        assert!(p.equals(&Vec3::new(0.0, 0.0, 4.0), EPSILON));

        let unchanged = TransformMatrix::identity().rotate3(1.0, Vec3::zeros());
        assert_eq!(unchanged, TransformMatrix::identity());
    }

    #[test]
    fn test_rect_multiplication_stays_axis_aligned() {
        let m = TransformMatrix::identity().rotate(PI / 4.0);
        let rect = m * FloatRect::new(-1.0, -1.0, 2.0, 2.0);
        let half_diag = 2.0_f32.sqrt();
        assert!(rect.equals(
            &FloatRect::new(-half_diag, -half_diag, 2.0 * half_diag, 2.0 * half_diag),
            EPSILON
        ));
    }

    #[test]
    fn test_inverse_variants_agree() {
        let m = TransformMatrix::identity()
            .translate(Vec2::new(3.0, -7.0))
            .rotate(0.7)
            .scale(Vec2::new(2.0, 0.5));

        let full = m.inv();
        let affine = m.affine_inv();
        assert!(full.equals(&affine, EPSILON));
        assert!((m * full).equals(&TransformMatrix::identity(), EPSILON));
        assert!(m.inv_transpose().equals(&full.transpose(), EPSILON));
    }

    #[test]
    fn test_singular_inverse() {
        let m = TransformMatrix::identity().scale(Vec2::new(0.0, 1.0));
        assert!(m.try_inv().is_none());
        assert!(m.inv().get(0, 0).is_nan());
        assert_relative_eq!(m.det(), 0.0, epsilon = EPSILON);
    }

    #[test]
    fn test_exact_and_tolerant_equality() {
        let a = TransformMatrix::identity().translate(Vec2::new(1.0, 0.0));
        let mut b = a;
        *b.get_mut(0, 3) += 1e-7;
        assert_ne!(a, b);
        assert!(a.equals(&b, EPSILON));
        assert!(!a.equals(&b, 0.0));
    }
}
