//! Axis-aligned rectangles
//!
//! `Rect` replaces the 3D `AABB` for the 2D engine: a position (top-left
//! corner) plus a non-negative width and height. Both `contains` and
//! `intersects` treat the rectangle as closed, so a rectangle contains its own
//! far corner and two rectangles sharing an edge intersect.

use nalgebra::{Scalar, Vector2};
use std::ops::{Add, Sub};

use super::math::Vec2;

/// Scalar types usable as rectangle coordinates
pub trait Coordinate:
    Scalar + Copy + PartialOrd + Default + Add<Output = Self> + Sub<Output = Self>
{
}

impl<T> Coordinate for T where
    T: Scalar + Copy + PartialOrd + Default + Add<Output = T> + Sub<Output = T>
{
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect<T: Coordinate> {
    pos: Vector2<T>,
    width: T,
    height: T,
}

/// Rectangle with float coordinates, used for world-space bounds
pub type FloatRect = Rect<f32>;

/// Rectangle with integer coordinates, used for texture areas
pub type IntRect = Rect<i32>;

fn min_of<T: PartialOrd>(a: T, b: T) -> T {
    if b < a {
        b
    } else {
        a
    }
}

fn max_of<T: PartialOrd>(a: T, b: T) -> T {
    if b > a {
        b
    } else {
        a
    }
}

impl<T: Coordinate> Rect<T> {
    /// Create a rectangle from its top-left corner and size.
    ///
    /// Negative sizes are clamped to zero.
    pub fn new(x: T, y: T, width: T, height: T) -> Self {
        Self::from_pos(Vector2::new(x, y), width, height)
    }

    /// Create a rectangle from a position vector and size
    pub fn from_pos(pos: Vector2<T>, width: T, height: T) -> Self {
        let zero = T::default();
        Self {
            pos,
            width: max_of(width, zero),
            height: max_of(height, zero),
        }
    }

    /// Create the smallest rectangle spanning two corner points
    pub fn from_corners(a: Vector2<T>, b: Vector2<T>) -> Self {
        let min = Vector2::new(min_of(a.x, b.x), min_of(a.y, b.y));
        let max = Vector2::new(max_of(a.x, b.x), max_of(a.y, b.y));
        Self::from_pos(min, max.x - min.x, max.y - min.y)
    }

    /// Top-left corner
    pub fn pos(&self) -> Vector2<T> {
        self.pos
    }

    /// Width of the rectangle
    pub fn width(&self) -> T {
        self.width
    }

    /// Height of the rectangle
    pub fn height(&self) -> T {
        self.height
    }

    /// Width and height as a vector
    pub fn size(&self) -> Vector2<T> {
        Vector2::new(self.width, self.height)
    }

    /// Bottom-right corner
    pub fn end(&self) -> Vector2<T> {
        Vector2::new(self.pos.x + self.width, self.pos.y + self.height)
    }

    /// Check whether the rectangle has zero area
    pub fn is_empty(&self) -> bool {
        let zero = T::default();
        self.width == zero || self.height == zero
    }

    /// Check if a point lies inside the rectangle (edges included)
    pub fn contains(&self, point: Vector2<T>) -> bool {
        let end = self.end();
        self.pos.x <= point.x && point.x <= end.x && self.pos.y <= point.y && point.y <= end.y
    }

    /// Check if another rectangle lies entirely inside this one
    pub fn contains_rect(&self, other: &Self) -> bool {
        self.contains(other.pos) && self.contains(other.end())
    }

    /// Check if this rectangle overlaps another one
    pub fn intersects(&self, other: &Self) -> bool {
        let end = self.end();
        let other_end = other.end();
        self.pos.x <= other_end.x
            && other.pos.x <= end.x
            && self.pos.y <= other_end.y
            && other.pos.y <= end.y
    }

    /// Smallest rectangle containing both rectangles
    pub fn union(&self, other: &Self) -> Self {
        let end = self.end();
        let other_end = other.end();
        Self::from_corners(
            Vector2::new(min_of(self.pos.x, other.pos.x), min_of(self.pos.y, other.pos.y)),
            Vector2::new(max_of(end.x, other_end.x), max_of(end.y, other_end.y)),
        )
    }
}

impl FloatRect {
    /// Center point of the rectangle
    pub fn center(&self) -> Vec2 {
        self.pos + self.size() * 0.5
    }

    /// Compare with an absolute tolerance on position and size
    pub fn equals(&self, other: &Self, precision: f32) -> bool {
        (self.pos.x - other.pos.x).abs() <= precision
            && (self.pos.y - other.pos.y).abs() <= precision
            && (self.width - other.width).abs() <= precision
            && (self.height - other.height).abs() <= precision
    }
}

impl Default for FloatRect {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }
}

impl From<IntRect> for FloatRect {
    #[allow(clippy::cast_precision_loss)]
    fn from(rect: IntRect) -> Self {
        Self::new(
            rect.pos.x as f32,
            rect.pos.y as f32,
            rect.width as f32,
            rect.height as f32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_size_is_clamped() {
        let rect = FloatRect::new(1.0, 2.0, -5.0, 3.0);
        assert_eq!(rect.width(), 0.0);
        assert_eq!(rect.height(), 3.0);
        assert!(rect.is_empty());
    }

    #[test]
    fn test_contains_point_includes_edges() {
        let rect = FloatRect::new(0.0, 0.0, 50.0, 50.0);
        assert!(rect.contains(Vec2::new(0.0, 0.0)));
        assert!(rect.contains(Vec2::new(50.0, 50.0)));
        assert!(rect.contains(Vec2::new(25.0, 10.0)));
        assert!(!rect.contains(Vec2::new(50.1, 10.0)));
        assert!(!rect.contains(Vec2::new(-0.1, 10.0)));
    }

    #[test]
    fn test_contains_rect() {
        let area = FloatRect::new(0.0, 0.0, 50.0, 50.0);
        assert!(area.contains_rect(&FloatRect::new(40.0, 40.0, 10.0, 10.0)));
        assert!(!area.contains_rect(&FloatRect::new(44.0, 46.0, 10.0, 10.0)));
    }

    #[test]
    fn test_intersects() {
        let a = FloatRect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&FloatRect::new(5.0, 5.0, 10.0, 10.0)));
        assert!(a.intersects(&FloatRect::new(10.0, 0.0, 10.0, 10.0)));
        assert!(!a.intersects(&FloatRect::new(10.5, 0.0, 10.0, 10.0)));
        assert!(!a.intersects(&FloatRect::new(0.0, -20.0, 10.0, 10.0)));
    }

    #[test]
    fn test_union() {
        let a = IntRect::new(0, 0, 10, 10);
        let b = IntRect::new(10, 5, 10, 20);
        assert_eq!(a.union(&b), IntRect::new(0, 0, 20, 25));
    }

    #[test]
    fn test_equals_with_precision() {
        let a = FloatRect::new(0.0, 0.0, 10.0, 10.0);
        let b = FloatRect::new(0.000_001, 0.0, 10.0, 9.999_999);
        assert!(a.equals(&b, 1e-5));
        assert_ne!(a, b);
    }
}
