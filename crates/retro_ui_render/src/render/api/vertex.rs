//! Vertex types submitted to the device

use bytemuck::{Pod, Zeroable};

/// Pre-transformed vertex in device layout
///
/// Screen-space position with depth and reciprocal homogeneous W, diffuse
/// color as `0xAARRGGBB`, one texture coordinate set.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct DeviceVertex {
    /// Screen x in framebuffer pixels
    pub x: f32,
    /// Screen y in framebuffer pixels
    pub y: f32,
    /// Depth
    pub z: f32,
    /// Reciprocal homogeneous W
    pub rhw: f32,
    /// Diffuse color, `0xAARRGGBB`
    pub color: u32,
    /// Texture u
    pub u: f32,
    /// Texture v
    pub v: f32,
}

impl DeviceVertex {
    /// Size of one vertex in bytes
    pub const STRIDE: usize = std::mem::size_of::<Self>();

    /// Vertex at `(x, y)` with unit rhw and zero depth
    #[must_use]
    pub const fn at(x: f32, y: f32, color: u32, uv: [f32; 2]) -> Self {
        Self { x, y, z: 0.0, rhw: 1.0, color, u: uv[0], v: uv[1] }
    }

    /// Screen position
    #[must_use]
    pub const fn position(&self) -> [f32; 2] {
        [self.x, self.y]
    }
}
