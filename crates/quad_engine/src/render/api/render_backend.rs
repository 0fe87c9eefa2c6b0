//! Backend abstraction traits for the rendering system
//!
//! This module defines the small capability interface that rendering
//! backends implement. The render system never talks to a graphics API
//! directly; it clears, binds shaders, uploads uniforms, and submits draw
//! calls through [`RenderBackend`].

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::render::api::draw_info::{Color, RenderParams, ShaderSetup};
use crate::render::RenderError;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

/// Handle to a shader program stored in the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderHandle(pub u64);

/// Handle to a texture stored in the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u64);

/// Handle to a vertex buffer stored in the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexBufferHandle(pub u64);

bitflags! {
    /// Buffers cleared at the start of a frame
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ClearFlags: u8 {
        /// Color attachment
        const COLOR = 1 << 0;
        /// Depth buffer
        const DEPTH = 1 << 1;
        /// Stencil buffer
        const STENCIL = 1 << 2;
    }
}

impl Default for ClearFlags {
    fn default() -> Self {
        Self::COLOR
    }
}

/// Main rendering backend trait
///
/// Calls arrive in frame order: `clear`, then any number of
/// `bind_shader` / `set_shader_params` / `render` triples, then `process`
/// and `end_frame`.
pub trait RenderBackend {
    /// Clear the selected buffers, using `color` for the color attachment
    fn clear(&mut self, color: Color, flags: ClearFlags) -> BackendResult<()>;

    /// Make `shader` the active program for subsequent draw calls
    fn bind_shader(&mut self, shader: ShaderHandle) -> BackendResult<()>;

    /// Run a uniform setup closure against the active program
    fn set_shader_params(&mut self, setup: ShaderSetup) -> BackendResult<()>;

    /// Submit one draw call
    fn render(&mut self, params: &RenderParams) -> BackendResult<()>;

    /// Flush queued work (resource loads, recorded commands)
    fn process(&mut self) -> BackendResult<()>;

    /// Present the frame
    fn end_frame(&mut self) -> BackendResult<()>;
}

impl<T: RenderBackend + ?Sized> RenderBackend for Box<T> {
    fn clear(&mut self, color: Color, flags: ClearFlags) -> BackendResult<()> {
        (**self).clear(color, flags)
    }

    fn bind_shader(&mut self, shader: ShaderHandle) -> BackendResult<()> {
        (**self).bind_shader(shader)
    }

    fn set_shader_params(&mut self, setup: ShaderSetup) -> BackendResult<()> {
        (**self).set_shader_params(setup)
    }

    fn render(&mut self, params: &RenderParams) -> BackendResult<()> {
        (**self).render(params)
    }

    fn process(&mut self) -> BackendResult<()> {
        (**self).process()
    }

    fn end_frame(&mut self) -> BackendResult<()> {
        (**self).end_frame()
    }
}
