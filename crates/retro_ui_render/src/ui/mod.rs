//! UI System Module
//!
//! Connects an immediate-mode UI library's context to the renderer.
//!
//! Architecture:
//! - context: the UI library state a backend registers with
//! - backend: the renderer backend session object

pub mod backend;
pub mod context;

pub use backend::UiRenderBackend;
pub use context::{BackendFlags, BackendIo, FontAtlas, UiContext};
