//! The drawable capability
//!
//! Anything the quadrant tree indexes and the render system draws implements
//! [`Drawable`]. The render system never owns drawables: it stores their
//! [`DrawableId`] and resolves them through a [`DrawableStore`] when it needs
//! layer, visibility, or render data.

use slotmap::SlotMap;

use crate::foundation::math::FloatRect;
use crate::render::api::{BlendMode, Color, DrawInfo, ShaderHandle};

slotmap::new_key_type! {
    /// Identifies a drawable for as long as it stays registered
    pub struct DrawableId;
}

/// Render attributes shared by every drawable
#[derive(Debug, Clone, PartialEq)]
pub struct DrawableState {
    /// Hidden drawables stay indexed but are skipped when drawing
    pub visible: bool,
    /// Draw order key, lower layers are drawn first
    pub layer: i32,
    /// Program used to draw, `None` keeps the active one
    pub shader: Option<ShaderHandle>,
    /// Compositing mode
    pub blend: BlendMode,
    /// Modulation color
    pub color: Color,
}

impl Default for DrawableState {
    fn default() -> Self {
        Self {
            visible: true,
            layer: 0,
            shader: None,
            blend: BlendMode::default(),
            color: Color::WHITE,
        }
    }
}

/// Capability of objects that take part in spatial indexing and rendering
///
/// Implementors provide storage for a [`DrawableState`] and the bounds and
/// render data queries; the attribute accessors come for free.
///
/// Changing layer, visibility, shader, blend, or color never requires
/// relocation. Anything that changes [`Drawable::global_bounds`] must be
/// followed by exactly one `handle_change` on the render system before the
/// next frame is selected.
pub trait Drawable {
    /// Shared render attributes
    fn state(&self) -> &DrawableState;

    /// Mutable shared render attributes
    fn state_mut(&mut self) -> &mut DrawableState;

    /// Bounds in object space
    fn local_bounds(&self) -> FloatRect;

    /// Axis-aligned bounds in world space
    fn global_bounds(&self) -> FloatRect;

    /// Render data for one draw call
    fn draw_info(&self) -> DrawInfo;

    /// Whether the drawable is drawn
    fn is_visible(&self) -> bool {
        self.state().visible
    }

    /// Show or hide the drawable
    fn set_visible(&mut self, visible: bool) {
        self.state_mut().visible = visible;
    }

    /// Draw layer
    fn layer(&self) -> i32 {
        self.state().layer
    }

    /// Change the draw layer
    fn set_layer(&mut self, layer: i32) {
        self.state_mut().layer = layer;
    }

    /// Shader used to draw
    fn shader(&self) -> Option<ShaderHandle> {
        self.state().shader
    }

    /// Change the shader
    fn set_shader(&mut self, shader: Option<ShaderHandle>) {
        self.state_mut().shader = shader;
    }

    /// Blend mode
    fn blend(&self) -> BlendMode {
        self.state().blend
    }

    /// Change the blend mode
    fn set_blend(&mut self, blend: BlendMode) {
        self.state_mut().blend = blend;
    }

    /// Modulation color
    fn color(&self) -> Color {
        self.state().color
    }

    /// Change the modulation color
    fn set_color(&mut self, color: Color) {
        self.state_mut().color = color;
    }
}

impl<T: Drawable + ?Sized> Drawable for Box<T> {
    fn state(&self) -> &DrawableState {
        (**self).state()
    }

    fn state_mut(&mut self) -> &mut DrawableState {
        (**self).state_mut()
    }

    fn local_bounds(&self) -> FloatRect {
        (**self).local_bounds()
    }

    fn global_bounds(&self) -> FloatRect {
        (**self).global_bounds()
    }

    fn draw_info(&self) -> DrawInfo {
        (**self).draw_info()
    }
}

/// Lookup from ids to drawables, used by the render system at frame time
pub trait DrawableStore {
    /// Resolve an id, `None` if the drawable no longer exists
    fn drawable(&self, id: DrawableId) -> Option<&dyn Drawable>;
}

impl<T: Drawable> DrawableStore for SlotMap<DrawableId, T> {
    fn drawable(&self, id: DrawableId) -> Option<&dyn Drawable> {
        self.get(id).map(|d| d as &dyn Drawable)
    }
}
