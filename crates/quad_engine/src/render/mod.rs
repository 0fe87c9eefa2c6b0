//! # Rendering System
//!
//! This module provides the rendering layer of the engine: a GPU-agnostic
//! backend interface, the drawable capability that scene objects implement,
//! the 2D camera, and the quadrant-tree render system that culls and
//! dispatches drawables each frame.
//!
//! ## Architecture
//!
//! - **Backend API**: [`RenderBackend`] plus the render data types drawables
//!   produce ([`DrawInfo`], [`RenderParams`])
//! - **Drawable**: the capability indexed by the quadrant tree
//! - **Camera2D**: view rectangle used as the culling query
//! - **QTreeRenderSystem**: spatial index plus two-phase select/draw frame

pub mod api;

// Core primitives
pub mod primitives;

/// Drawable capability
pub mod drawable;

// Systems
pub mod systems;

/// Graphics backend implementations
///
/// Contains the headless recording backend used by tools and tests.
pub mod backends;

pub use api::{
    BackendResult, BlendMode, ClearFlags, Color, DrawInfo, PrimitiveType, RenderBackend,
    RenderParams, ShaderHandle, ShaderSetup, ShaderUniforms, TextureHandle, UniformValue,
    VertexBufferHandle,
};
pub use backends::{BackendCommand, HeadlessBackend};
pub use drawable::{Drawable, DrawableId, DrawableState, DrawableStore};
pub use primitives::Camera2D;
pub use systems::{FrameStats, QTreeRenderSystem};

/// Rendering errors
///
/// Errors reported by backends. The render system logs them and keeps the
/// frame going.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A draw call failed during execution
    ///
    /// The next frame may well succeed.
    #[error("Rendering failed: {0}")]
    RenderingFailed(String),

    /// Shader handle the backend does not know
    #[error("Unknown shader: {0:?}")]
    UnknownShader(ShaderHandle),

    /// Texture handle the backend does not know
    #[error("Unknown texture: {0:?}")]
    UnknownTexture(TextureHandle),

    /// Shader parameters uploaded with no shader bound
    #[error("No shader bound")]
    NoShaderBound,
}

/// Render system errors
///
/// Returned by the quadrant-tree render system. Each one has already been
/// logged when it reaches the caller, and no state was changed.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderSystemError {
    /// No root quadrant installed
    #[error("Root quadrant not set")]
    RootNotSet,

    /// No camera installed
    #[error("Camera not set")]
    CameraNotSet,

    /// Drawable not registered with the render system
    #[error("No such node: {0:?}")]
    NoSuchDrawable(DrawableId),
}
