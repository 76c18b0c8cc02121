//! # Retro UI Render
//!
//! Immediate-mode UI renderer backend for fixed-function rasterizers that
//! have no hardware scissor test.
//!
//! ## Features
//!
//! - **Software Clipping**: exact Sutherland–Hodgman clipping of every triangle
//!   against its command's clip rectangle
//! - **State Isolation**: host pipeline state is captured before and restored
//!   after every frame
//! - **Font Atlas Upload**: video memory with system memory fallback
//! - **Device Agnostic**: drives any device implementing two small traits
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use retro_ui_render::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let device = shared(RecordingDevice::new());
//!     let mut ctx = UiContext::new(FontAtlas::from_rgba32(1, 1, vec![0xFF; 4]));
//!
//!     let mut backend = UiRenderBackend::init(&mut ctx, &device, &device, BackendConfig::default())?;
//!     backend.create_device_objects(&mut ctx)?;
//!
//!     backend.new_frame()?;
//!     let draw_data = DrawData::new(Vec::new(), Vec2::zeros(), Vec2::new(800.0, 600.0), Vec2::new(1.0, 1.0));
//!     let stats = backend.render_draw_data(&draw_data)?;
//!     println!("{} draw calls", stats.draw_calls);
//!
//!     backend.shutdown(&mut ctx)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

pub mod config;
pub mod foundation;
pub mod render;
pub mod ui;

/// Common imports for backend users
pub mod prelude {
    pub use crate::{
        config::{BackendConfig, Config, ConfigError},
        foundation::math::Vec2,
        render::{
            backends::recording::RecordingDevice,
            shared, DrawCmd, DrawData, DrawList, DrawVert, FrameStats, PackedColorOrder, RasterDevice, RenderError,
            RenderResult, Shared, SurfaceFactory, TexelFormat, TextureId,
        },
        ui::{BackendFlags, FontAtlas, UiContext, UiRenderBackend},
    };
}
