//! Textured quad content for scene nodes

use std::sync::Arc;

use crate::foundation::math::{FloatRect, IntRect, Vec2i, Vec4};
use crate::render::api::{
    PrimitiveType, RenderParams, ShaderSetup, ShaderUniforms, TextureHandle, UniformValue,
    VertexBufferHandle,
};

/// Uniform receiving the displayed texture area, normalized to the texture
pub const TEXTURE_RECT_UNIFORM: &str = "tex_rect";

/// A rectangular part of a texture drawn as a quad
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    texture: Option<TextureHandle>,
    texture_size: Vec2i,
    texture_rect: IntRect,
    vertex_buffer: Option<VertexBufferHandle>,
}

impl Sprite {
    /// Sprite showing the whole texture
    pub fn new(texture: TextureHandle, texture_size: Vec2i) -> Self {
        Self {
            texture: Some(texture),
            texture_size,
            texture_rect: IntRect::new(0, 0, texture_size.x, texture_size.y),
            vertex_buffer: None,
        }
    }

    /// Untextured sprite of a given size, drawn in its modulation color
    pub fn solid(width: i32, height: i32) -> Self {
        Self {
            texture: None,
            texture_size: Vec2i::new(width, height),
            texture_rect: IntRect::new(0, 0, width, height),
            vertex_buffer: None,
        }
    }

    /// Sprite showing part of a texture
    pub fn with_rect(texture: TextureHandle, texture_size: Vec2i, rect: IntRect) -> Self {
        let mut sprite = Self::new(texture, texture_size);
        sprite.set_texture_rect(rect);
        sprite
    }

    /// Use a vertex buffer for the quad geometry (builder pattern)
    #[must_use]
    pub fn with_vertex_buffer(mut self, buffer: VertexBufferHandle) -> Self {
        self.vertex_buffer = Some(buffer);
        self
    }

    /// Texture, if any
    pub fn texture(&self) -> Option<TextureHandle> {
        self.texture
    }

    /// Change the texture. With `reset_rect` the whole new texture is shown,
    /// otherwise the current area is kept.
    pub fn set_texture(&mut self, texture: TextureHandle, texture_size: Vec2i, reset_rect: bool) {
        self.texture = Some(texture);
        self.texture_size = texture_size;
        if reset_rect {
            self.texture_rect = IntRect::new(0, 0, texture_size.x, texture_size.y);
        }
    }

    /// Displayed area of the texture, in texels
    pub fn texture_rect(&self) -> IntRect {
        self.texture_rect
    }

    /// Change the displayed area
    pub fn set_texture_rect(&mut self, rect: IntRect) {
        self.texture_rect = rect;
    }

    /// Bounds in object space: the displayed area moved to the origin
    #[allow(clippy::cast_precision_loss)]
    pub fn local_bounds(&self) -> FloatRect {
        FloatRect::new(
            0.0,
            0.0,
            self.texture_rect.width() as f32,
            self.texture_rect.height() as f32,
        )
    }

    /// Draw call parameters, without blend, color and transform
    pub fn render_params(&self) -> RenderParams {
        RenderParams {
            textures: self.texture.into_iter().collect(),
            vertex_buffer: self.vertex_buffer,
            primitive: PrimitiveType::TriangleStrip,
            vertex_count: 4,
            ..RenderParams::default()
        }
    }

    /// Uniform setup uploading the normalized texture area
    #[allow(clippy::cast_precision_loss)]
    pub fn shader_setup(&self) -> Option<ShaderSetup> {
        let texture = self.texture?;
        let size = self.texture_size;
        if size.x <= 0 || size.y <= 0 {
            return None;
        }

        let rect = self.texture_rect;
        let normalized = Vec4::new(
            rect.pos().x as f32 / size.x as f32,
            rect.pos().y as f32 / size.y as f32,
            rect.width() as f32 / size.x as f32,
            rect.height() as f32 / size.y as f32,
        );
        Some(Arc::new(move |uniforms: &mut dyn ShaderUniforms| {
            uniforms.set_uniform("tex", UniformValue::Texture(texture));
            uniforms.set_uniform(TEXTURE_RECT_UNIFORM, UniformValue::Vec4(normalized));
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_bounds_follow_texture_rect() {
        let mut sprite = Sprite::new(TextureHandle(1), Vec2i::new(64, 32));
        assert_eq!(sprite.local_bounds(), FloatRect::new(0.0, 0.0, 64.0, 32.0));

        sprite.set_texture_rect(IntRect::new(16, 0, 16, 16));
        assert_eq!(sprite.local_bounds(), FloatRect::new(0.0, 0.0, 16.0, 16.0));

        sprite.set_texture(TextureHandle(2), Vec2i::new(8, 8), false);
        assert_eq!(sprite.texture_rect(), IntRect::new(16, 0, 16, 16));
        sprite.set_texture(TextureHandle(2), Vec2i::new(8, 8), true);
        assert_eq!(sprite.texture_rect(), IntRect::new(0, 0, 8, 8));
    }

    #[test]
    fn test_render_params() {
        let sprite = Sprite::new(TextureHandle(3), Vec2i::new(4, 4))
            .with_vertex_buffer(VertexBufferHandle(9));
        let params = sprite.render_params();
        assert_eq!(params.textures, vec![TextureHandle(3)]);
        assert_eq!(params.vertex_buffer, Some(VertexBufferHandle(9)));
        assert_eq!(params.vertex_count, 4);

        assert!(Sprite::solid(4, 4).render_params().textures.is_empty());
    }

    #[test]
    fn test_shader_setup_normalizes_rect() {
        struct Sink(Vec<(String, UniformValue)>);
        impl ShaderUniforms for Sink {
            fn set_uniform(&mut self, name: &str, value: UniformValue) {
                self.0.push((name.to_string(), value));
            }
        }

        let sprite = Sprite::with_rect(
            TextureHandle(1),
            Vec2i::new(64, 32),
            IntRect::new(16, 8, 32, 16),
        );
        let setup = sprite.shader_setup().unwrap();
        let mut sink = Sink(Vec::new());
        setup(&mut sink);

        assert_eq!(
            sink.0[1],
            (
                TEXTURE_RECT_UNIFORM.to_string(),
                UniformValue::Vec4(Vec4::new(0.25, 0.25, 0.5, 0.5))
            )
        );
        assert!(Sprite::solid(4, 4).shader_setup().is_none());
    }
}
