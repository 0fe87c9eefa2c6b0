//! Render data handed from drawables to the backend

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::foundation::math::{TransformMatrix, Vec2, Vec3, Vec4};
use crate::render::api::render_backend::{ShaderHandle, TextureHandle, VertexBufferHandle};

/// RGBA color with float components in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
    /// Alpha
    pub a: f32,
}

impl Color {
    /// Opaque white
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);
    /// Opaque black
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);
    /// Fully transparent black
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);

    /// Create a color from its components
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Components as an array, for uniform upload
    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[f32; 4]> for Color {
    fn from([r, g, b, a]: [f32; 4]) -> Self {
        Self::rgba(r, g, b, a)
    }
}

/// How a drawable is composited onto the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlendMode {
    /// Standard alpha blending
    #[default]
    Alpha,
    /// Source added onto destination
    Additive,
    /// Source multiplied with destination
    Multiply,
    /// Overwrite destination
    None,
}

/// Primitive topology of a vertex buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveType {
    /// Independent triangles
    Triangles,
    /// Triangle strip
    #[default]
    TriangleStrip,
    /// Independent lines
    Lines,
    /// Points
    Points,
}

/// Parameters of a single draw call
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams {
    /// Textures bound to consecutive texture units
    pub textures: Vec<TextureHandle>,
    /// Geometry source
    pub vertex_buffer: Option<VertexBufferHandle>,
    /// Primitive topology
    pub primitive: PrimitiveType,
    /// Number of vertices to draw
    pub vertex_count: u32,
    /// Number of instances to draw
    pub instance_count: u32,
    /// Blend state for this call
    pub blend: BlendMode,
    /// Modulation color
    pub color: Color,
    /// Object to world transform
    pub transform: TransformMatrix,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            textures: Vec::new(),
            vertex_buffer: None,
            primitive: PrimitiveType::default(),
            vertex_count: 0,
            instance_count: 1,
            blend: BlendMode::default(),
            color: Color::default(),
            transform: TransformMatrix::identity(),
        }
    }
}

/// Typed uniform value
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    /// Single float
    Float(f32),
    /// Signed integer
    Int(i32),
    /// 2 component vector
    Vec2(Vec2),
    /// 3 component vector
    Vec3(Vec3),
    /// 4 component vector
    Vec4(Vec4),
    /// 4x4 matrix
    Mat4(TransformMatrix),
    /// Texture unit binding
    Texture(TextureHandle),
}

/// Sink for uniform uploads, implemented by backends
pub trait ShaderUniforms {
    /// Set the uniform called `name` on the active program
    fn set_uniform(&mut self, name: &str, value: UniformValue);
}

/// Closure that uploads uniforms for the active program.
///
/// Setups own everything they capture so they can be queued by backends
/// that defer work past the current call.
pub type ShaderSetup = Arc<dyn Fn(&mut dyn ShaderUniforms) + Send + Sync>;

/// Everything needed to draw one object
#[derive(Clone, Default)]
pub struct DrawInfo {
    /// Program to bind, `None` keeps whatever is active
    pub shader: Option<ShaderHandle>,
    /// Per-object uniforms, applied after the camera uniforms
    pub shader_setup: Option<ShaderSetup>,
    /// Draw call parameters
    pub render_params: RenderParams,
}

impl fmt::Debug for DrawInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawInfo")
            .field("shader", &self.shader)
            .field("shader_setup", &self.shader_setup.as_ref().map(|_| "<closure>"))
            .field("render_params", &self.render_params)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_conversions() {
        let color = Color::from([0.5, 0.25, 1.0, 1.0]);
        assert_eq!(color.to_array(), [0.5, 0.25, 1.0, 1.0]);
        assert_eq!(Color::default(), Color::WHITE);
    }

    #[test]
    fn test_render_params_default() {
        let params = RenderParams::default();
        assert_eq!(params.instance_count, 1);
        assert_eq!(params.blend, BlendMode::Alpha);
        assert!(params.textures.is_empty());
        assert_eq!(params.transform, TransformMatrix::identity());
    }
}
