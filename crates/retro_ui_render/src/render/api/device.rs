//! Device abstraction traits for the fixed-function rasterizer
//!
//! This module defines the traits a legacy rendering device must implement
//! so the backend can drive it. The split mirrors the hardware APIs this
//! backend targets: a raster device that owns pipeline state and draws
//! pre-transformed triangles, and a surface factory that creates and fills
//! textures.
//!
//! Handles are shared with the host application as [`Shared`] values. Holding
//! a clone is a retained reference; dropping it releases that reference.

use std::cell::RefCell;
use std::rc::Rc;

use super::vertex::DeviceVertex;
use crate::foundation::math::Mat4;
use crate::render::color::TexelFormat;

/// Host-shared, single-threaded device handle
pub type Shared<T> = Rc<RefCell<T>>;

/// Wrap a device so it can be shared between host and backend
pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

/// Native index type of the rasterizer's indexed draw call
pub type DeviceIndex = u16;

/// Result type for device operations
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Errors reported by a device call
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// Video memory could not satisfy the allocation
    #[error("out of video memory")]
    OutOfVideoMemory,

    /// System memory could not satisfy the allocation
    #[error("out of memory")]
    OutOfMemory,

    /// Handle does not name a live texture
    #[error("invalid texture handle {0:?}")]
    InvalidTexture(TextureHandle),

    /// Texture is already locked for writing
    #[error("texture {0:?} is already locked")]
    AlreadyLocked(TextureHandle),

    /// Surface could not be locked
    #[error("surface lock failed: {0}")]
    LockFailed(String),

    /// Requested value or operation is not supported by the device
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Generic call failure
    #[error("device call failed: {0}")]
    CallFailed(String),
}

/// Handle to a native texture surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u64);

/// Global render states the backend touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RenderState {
    /// Alpha blending on/off
    AlphaBlendEnable,
    /// Source blend factor
    SrcBlend,
    /// Destination blend factor
    DestBlend,
    /// Depth test on/off
    ZEnable,
    /// Depth write on/off
    ZWriteEnable,
    /// Triangle culling mode
    CullMode,
    /// Fixed-function lighting on/off
    Lighting,
    /// Shading mode
    ShadeMode,
    /// Fog on/off
    FogEnable,
    /// Viewport clip test on/off
    Clipping,
}

impl RenderState {
    /// Every render state, in capture and restore order
    pub const ALL: [Self; 10] = [
        Self::AlphaBlendEnable,
        Self::SrcBlend,
        Self::DestBlend,
        Self::ZEnable,
        Self::ZWriteEnable,
        Self::CullMode,
        Self::Lighting,
        Self::ShadeMode,
        Self::FogEnable,
        Self::Clipping,
    ];
}

/// Per-stage texture blending and sampler states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextureStageState {
    /// Color blending operation
    ColorOp,
    /// First color argument
    ColorArg1,
    /// Second color argument
    ColorArg2,
    /// Alpha blending operation
    AlphaOp,
    /// First alpha argument
    AlphaArg1,
    /// Second alpha argument
    AlphaArg2,
    /// Minification filter
    MinFilter,
    /// Magnification filter
    MagFilter,
    /// Mipmap filter
    MipFilter,
    /// U addressing mode
    AddressU,
    /// V addressing mode
    AddressV,
}

impl TextureStageState {
    /// Every texture stage state
    pub const ALL: [Self; 11] = [
        Self::ColorOp,
        Self::ColorArg1,
        Self::ColorArg2,
        Self::AlphaOp,
        Self::AlphaArg1,
        Self::AlphaArg2,
        Self::MinFilter,
        Self::MagFilter,
        Self::MipFilter,
        Self::AddressU,
        Self::AddressV,
    ];
}

/// Fixed-function transform slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransformKind {
    /// World matrix
    World,
    /// View matrix
    View,
    /// Projection matrix
    Projection,
}

impl TransformKind {
    /// Every transform slot, in capture and restore order
    pub const ALL: [Self; 3] = [Self::World, Self::View, Self::Projection];
}

/// Device viewport in render target pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Left edge
    pub x: u32,
    /// Top edge
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Near depth
    pub min_z: f32,
    /// Far depth
    pub max_z: f32,
}

impl Viewport {
    /// Full-target viewport with the standard depth range
    #[must_use]
    pub const fn full(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height, min_z: 0.0, max_z: 1.0 }
    }
}

/// Raw state values understood by fixed-function devices
pub mod values {
    /// Boolean true
    pub const TRUE: u32 = 1;
    /// Boolean false
    pub const FALSE: u32 = 0;

    /// Blend factors
    pub mod blend {
        /// `0`
        pub const ZERO: u32 = 1;
        /// `1`
        pub const ONE: u32 = 2;
        /// Source alpha
        pub const SRC_ALPHA: u32 = 5;
        /// One minus source alpha
        pub const INV_SRC_ALPHA: u32 = 6;
    }

    /// Cull modes
    pub mod cull {
        /// No culling
        pub const NONE: u32 = 1;
        /// Cull counter-clockwise triangles
        pub const CCW: u32 = 3;
    }

    /// Shade modes
    pub mod shade {
        /// Flat shading
        pub const FLAT: u32 = 1;
        /// Gouraud shading
        pub const GOURAUD: u32 = 2;
    }

    /// Texture stage operations
    pub mod texture_op {
        /// Stage disabled
        pub const DISABLE: u32 = 1;
        /// Pass the first argument
        pub const SELECT_ARG1: u32 = 2;
        /// Multiply both arguments
        pub const MODULATE: u32 = 4;
    }

    /// Texture stage arguments
    pub mod texture_arg {
        /// Vertex diffuse color
        pub const DIFFUSE: u32 = 0;
        /// Output of the previous stage
        pub const CURRENT: u32 = 1;
        /// Texture sample
        pub const TEXTURE: u32 = 2;
    }

    /// Texture filters
    pub mod filter {
        /// Nearest texel
        pub const POINT: u32 = 1;
        /// Bilinear
        pub const LINEAR: u32 = 2;
    }

    /// Texture address modes
    pub mod address {
        /// Repeat
        pub const WRAP: u32 = 1;
        /// Clamp to edge
        pub const CLAMP: u32 = 3;
    }
}

/// Memory pool a texture is created in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryClass {
    /// Fast, scarce on-card memory
    Video,
    /// Slower system memory the driver can always fall back to
    System,
}

/// Texture creation parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// Channel layout
    pub format: TexelFormat,
    /// Memory pool
    pub memory: MemoryClass,
}

/// Writable view of a locked texture
///
/// Rows start every `pitch` bytes; `pitch` may exceed `width * 4`.
#[derive(Debug)]
pub struct LockedSurface<'a> {
    /// Distance between row starts in bytes
    pub pitch: usize,
    /// Surface memory, at least `pitch * height` bytes
    pub bytes: &'a mut [u8],
}

/// Fixed-function raster device
///
/// Only whole-viewport clipping is available; the backend does per-command
/// clipping itself and submits pre-transformed vertices.
pub trait RasterDevice {
    /// Read a render state
    fn render_state(&self, state: RenderState) -> DeviceResult<u32>;

    /// Write a render state
    fn set_render_state(&mut self, state: RenderState, value: u32) -> DeviceResult<()>;

    /// Read a texture stage state
    fn texture_stage_state(&self, stage: u32, state: TextureStageState) -> DeviceResult<u32>;

    /// Write a texture stage state
    fn set_texture_stage_state(&mut self, stage: u32, state: TextureStageState, value: u32) -> DeviceResult<()>;

    /// Read a transform matrix
    fn transform(&self, kind: TransformKind) -> DeviceResult<Mat4>;

    /// Write a transform matrix
    fn set_transform(&mut self, kind: TransformKind, matrix: &Mat4) -> DeviceResult<()>;

    /// Read the viewport
    fn viewport(&self) -> DeviceResult<Viewport>;

    /// Write the viewport
    fn set_viewport(&mut self, viewport: &Viewport) -> DeviceResult<()>;

    /// Texture currently bound to `stage`
    ///
    /// Does not retain the texture; pair with [`RasterDevice::retain_texture`]
    /// when the handle must outlive the binding.
    fn bound_texture(&self, stage: u32) -> DeviceResult<Option<TextureHandle>>;

    /// Bind a texture to `stage`, or unbind with `None`
    fn set_texture(&mut self, stage: u32, texture: Option<TextureHandle>) -> DeviceResult<()>;

    /// Add a reference to a texture, returning the new count
    fn retain_texture(&mut self, texture: TextureHandle) -> DeviceResult<u32>;

    /// Drop a reference to a texture, returning the remaining count
    fn release_texture(&mut self, texture: TextureHandle) -> DeviceResult<u32>;

    /// Draw an indexed triangle list of pre-transformed vertices
    fn draw_indexed_triangles(&mut self, vertices: &[DeviceVertex], indices: &[DeviceIndex]) -> DeviceResult<()>;
}

/// Texture surface factory
pub trait SurfaceFactory {
    /// Create a texture; the caller owns one reference
    fn create_texture(&mut self, desc: &TextureDesc) -> DeviceResult<TextureHandle>;

    /// Describe a live texture
    fn texture_desc(&self, texture: TextureHandle) -> DeviceResult<TextureDesc>;

    /// Lock a texture for CPU writes
    fn lock_texture(&mut self, texture: TextureHandle) -> DeviceResult<LockedSurface<'_>>;

    /// Unlock a previously locked texture
    fn unlock_texture(&mut self, texture: TextureHandle) -> DeviceResult<()>;

    /// Drop the creator's reference, returning the remaining count
    fn release_surface(&mut self, texture: TextureHandle) -> DeviceResult<u32>;
}
