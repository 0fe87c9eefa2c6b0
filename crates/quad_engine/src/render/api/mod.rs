//! Public rendering API
//!
//! The backend capability trait plus the render data types exchanged
//! between drawables, the render system, and backends.

pub mod draw_info;
pub mod render_backend;

// Re-export commonly used types
pub use draw_info::{
    BlendMode, Color, DrawInfo, PrimitiveType, RenderParams, ShaderSetup, ShaderUniforms,
    UniformValue,
};
pub use render_backend::{
    BackendResult, ClearFlags, RenderBackend, ShaderHandle, TextureHandle, VertexBufferHandle,
};
