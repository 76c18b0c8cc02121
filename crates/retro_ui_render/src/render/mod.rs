//! # Rendering System
//!
//! Translates immediate-mode UI draw data into draw calls for a fixed-function
//! rasterizer that can only clip against its whole viewport.
//!
//! ## Architecture
//!
//! - **API**: draw data consumed from the UI library and the device traits
//!   implemented by the host
//! - **Batching**: flattens a frame's draw lists into device-layout arrays
//! - **Clipping**: exact per-command rectangle clipping in software
//! - **Dispatch**: walks commands and issues one draw call per command
//! - **State**: captures and restores the host's pipeline state around a pass
//! - **Texture**: uploads and owns the font atlas
//! - **Backends**: device implementations (an in-memory recorder)

pub mod api;
pub mod backends;
pub mod batch;
pub mod clip;
pub mod color;
pub mod dispatch;
pub mod state;
pub mod texture;

// Frame scenarios need UI indices the device can draw
#[cfg(all(test, not(feature = "wide-indices")))]
mod tests;

pub use api::{
    shared, DeviceError, DeviceIndex, DeviceResult, DeviceVertex, DrawCallback, DrawCmd, DrawCmdParams, DrawData,
    DrawIdx, DrawList, DrawVert, RasterDevice, Shared, SurfaceFactory, TextureHandle, TextureId, Viewport,
};
pub use batch::FrameBatcher;
pub use clip::{clip_triangle, ClipRect};
pub use color::{PackedColorOrder, TexelFormat};
pub use dispatch::{CommandDispatcher, FrameStats};
pub use state::{setup_render_state, PipelineStateSnapshot};
pub use texture::{FontAtlasManager, FontTexture};

use thiserror::Error;

/// Render system errors
#[derive(Error, Debug)]
pub enum RenderError {
    /// The UI context already has a renderer backend
    #[error("A renderer backend is already initialized for this context")]
    AlreadyInitialized,

    /// The backend was used before `init` or after `shutdown`
    #[error("Renderer backend is not initialized")]
    NotInitialized,

    /// UI indices are wider than the device can address
    ///
    /// The UI library was built with an index type the device's indexed draw
    /// call cannot take. Indices are never truncated.
    #[error("UI index type is {ui_bytes} bytes but the device takes {device_bytes}-byte indices")]
    IndexWidthUnsupported {
        /// Size of one UI index
        ui_bytes: usize,
        /// Size of one device index
        device_bytes: usize,
    },

    /// The font atlas is already uploaded and must be released first
    #[error("Font atlas already uploaded as {0:?}")]
    FontAtlasAlreadyUploaded(TextureHandle),

    /// Resource creation or management failed
    ///
    /// Occurs when textures cannot be created in any memory class or the
    /// source data does not describe a valid texture.
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// A device call failed
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
