//! Backend implementations for the render module
//!
//! The engine ships a headless backend that records every call. GPU backends
//! live outside this crate and implement [`crate::render::RenderBackend`].

/// Command-recording backend
pub mod headless;

pub use headless::{BackendCommand, HeadlessBackend};
