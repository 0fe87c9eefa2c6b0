//! # 2D Camera System
//!
//! Provides the view used for culling and for the camera shader uniforms.
//!
//! ## Design Principles
//! - **Lazy**: the transform and the view bounds are computed on first access
//!   after a change and cached until the next setter call
//! - **Library-agnostic**: no backend types in camera math
//! - **Y-down**: world coordinates grow right and down, like screen space

use std::cell::Cell;

use crate::config::CameraConfig;
use crate::foundation::math::{utils, FloatRect, TransformMatrix, Vec2};

#[derive(Debug, Clone, Copy)]
struct Derived {
    transform: TransformMatrix,
    bounds: FloatRect,
}

/// 2D camera: a rectangular view that can be moved, rotated and zoomed
///
/// # Coordinate System
/// The camera transform maps camera space, where the view spans
/// `[-w/2, w/2] x [-h/2, h/2]`, onto the world:
/// `translate(center) * rotate(rotation) * scale(1 / zoom)`.
///
/// # Caching
/// [`Camera2D::transform_matrix`] and [`Camera2D::global_bounds`] recompute
/// only after a setter ran. The cache is interior so both accessors take
/// `&self`.
#[derive(Debug, Clone)]
pub struct Camera2D {
    center: Vec2,
    half_size: Vec2,
    /// Degrees, always in `[0, 360)`
    rotation: f32,
    /// Inverse of the zoom factor
    scale: f32,
    derived: Cell<Option<Derived>>,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self::new(Vec2::zeros(), Vec2::new(800.0, 600.0))
    }
}

impl Camera2D {
    /// Create a camera centered on `center` showing `size` world units
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self {
            center,
            half_size: size * 0.5,
            rotation: 0.0,
            scale: 1.0,
            derived: Cell::new(None),
        }
    }

    /// Create a camera from its configuration
    pub fn from_config(config: &CameraConfig) -> Self {
        let mut camera = Self::new(config.center(), config.size());
        camera.set_rotation(config.rotation);
        camera.set_zoom(config.zoom);
        camera
    }

    fn invalidate(&mut self) {
        self.derived.set(None);
    }

    /// View center in world coordinates
    pub fn center(&self) -> Vec2 {
        self.center
    }

    /// Move the view center to `center`
    pub fn set_center(&mut self, center: Vec2) {
        self.center = center;
        self.invalidate();
        log::trace!("Camera center updated to: {:?}", center);
    }

    /// Unzoomed view size
    pub fn size(&self) -> Vec2 {
        self.half_size * 2.0
    }

    /// Change the unzoomed view size
    pub fn set_size(&mut self, size: Vec2) {
        self.half_size = size * 0.5;
        self.invalidate();
        log::trace!("Camera size updated to: {:?}", size);
    }

    /// Rotation in degrees, in `[0, 360)`
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Set the rotation in degrees. Any angle is accepted and wrapped.
    pub fn set_rotation(&mut self, degrees: f32) {
        self.rotation = utils::normalize_degrees(degrees);
        self.invalidate();
        log::trace!("Camera rotation updated to: {}", self.rotation);
    }

    /// Zoom factor
    pub fn zoom(&self) -> f32 {
        1.0 / self.scale
    }

    /// Set the zoom factor. Values above 1 magnify. Non-positive values are
    /// ignored.
    pub fn set_zoom(&mut self, zoom: f32) {
        if zoom <= 0.0 {
            return;
        }
        self.scale = 1.0 / zoom;
        self.invalidate();
        log::trace!("Camera zoom updated to: {}", zoom);
    }

    /// Offset the view center
    pub fn move_by(&mut self, offset: Vec2) {
        self.set_center(self.center + offset);
    }

    /// Rotate by `degrees` relative to the current rotation
    pub fn rotate(&mut self, degrees: f32) {
        self.set_rotation(self.rotation + degrees);
    }

    /// Multiply the zoom by `factor`. Non-positive factors are ignored.
    pub fn zoom_by(&mut self, factor: f32) {
        if factor <= 0.0 {
            return;
        }
        self.set_zoom(self.zoom() * factor);
    }

    fn derived(&self) -> Derived {
        if let Some(derived) = self.derived.get() {
            return derived;
        }

        let transform = TransformMatrix::identity()
            .translate(self.center)
            .rotate(utils::deg_to_rad(self.rotation))
            .scale(Vec2::new(self.scale, self.scale));
        let view = FloatRect::from_pos(-self.half_size, self.half_size.x * 2.0, self.half_size.y * 2.0);
        let derived = Derived {
            transform,
            bounds: transform * view,
        };
        self.derived.set(Some(derived));
        derived
    }

    /// Camera to world transform
    pub fn transform_matrix(&self) -> TransformMatrix {
        self.derived().transform
    }

    /// Axis-aligned world rectangle covered by the view, used as the culling
    /// query
    pub fn global_bounds(&self) -> FloatRect {
        self.derived().bounds
    }

    /// World to camera transform, uploaded as `view_matr`
    pub fn view_matrix(&self) -> TransformMatrix {
        self.transform_matrix().affine_inv()
    }

    /// Camera space to clip space, uploaded as `proj_matr`
    pub fn projection_matrix(&self) -> TransformMatrix {
        TransformMatrix::identity().scale(Vec2::new(
            1.0 / self.half_size.x,
            1.0 / self.half_size.y,
        ))
    }
}
