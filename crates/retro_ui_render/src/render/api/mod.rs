//! Public rendering API
//!
//! This module contains the contracts the backend sits between: the draw data
//! the UI library hands over each frame, and the device traits the host's
//! fixed-function rasterizer implements.

pub mod device;
pub mod draw_data;
pub mod vertex;

// Re-export commonly used types
pub use device::{
    shared, DeviceError, DeviceIndex, DeviceResult, LockedSurface, MemoryClass, RasterDevice, RenderState, Shared,
    SurfaceFactory, TextureDesc, TextureHandle, TextureStageState, TransformKind, Viewport,
};
pub use draw_data::{DrawCallback, DrawCmd, DrawCmdParams, DrawData, DrawIdx, DrawList, DrawVert, TextureId};
pub use vertex::DeviceVertex;
