//! Per-frame draw data produced by the UI library
//!
//! The UI library hands the backend one immutable [`DrawData`] per frame. It
//! is read-only to the backend: vertices and indices are consumed as emitted,
//! commands are walked in order.

use std::fmt;
use std::rc::Rc;

use bytemuck::{Pod, Zeroable};

use super::device::TextureHandle;
use crate::foundation::math::Vec2;

/// Index type emitted by the UI library
#[cfg(not(feature = "wide-indices"))]
pub type DrawIdx = u16;

/// Index type emitted by the UI library
#[cfg(feature = "wide-indices")]
pub type DrawIdx = u32;

/// Opaque texture identifier shared with the UI library
///
/// Every native handle value, including 0, names a texture; only
/// [`TextureId::NONE`] means unbound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureId(Option<TextureHandle>);

impl TextureId {
    /// No texture
    pub const NONE: Self = Self(None);

    /// Wrap a raw native handle value
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(Some(TextureHandle(id)))
    }

    /// Raw native handle value
    #[must_use]
    pub const fn id(self) -> Option<u64> {
        match self.0 {
            Some(handle) => Some(handle.0),
            None => None,
        }
    }

    /// Whether this is [`TextureId::NONE`]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0.is_none()
    }

    /// Native texture this id names, if any
    #[must_use]
    pub const fn to_handle(self) -> Option<TextureHandle> {
        self.0
    }
}

impl From<TextureHandle> for TextureId {
    fn from(handle: TextureHandle) -> Self {
        Self(Some(handle))
    }
}

/// UI vertex as emitted by the UI library
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct DrawVert {
    /// Position in UI coordinates
    pub pos: [f32; 2],
    /// Texture coordinates
    pub uv: [f32; 2],
    /// Packed color; byte order per [`crate::render::color::PackedColorOrder`]
    pub col: u32,
}

impl DrawVert {
    /// Construct a vertex
    #[must_use]
    pub const fn new(pos: [f32; 2], uv: [f32; 2], col: u32) -> Self {
        Self { pos, uv, col }
    }
}

/// Parameters shared by geometry and callback commands
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCmdParams {
    /// Clip rectangle `[min_x, min_y, max_x, max_y]` in UI coordinates
    pub clip_rect: [f32; 4],
    /// Texture to bind
    pub texture_id: TextureId,
    /// Added to every index of the command
    pub vtx_offset: usize,
    /// First index of the command within its draw list
    pub idx_offset: usize,
}

/// User callback embedded in a draw list
pub type DrawCallback = Rc<dyn Fn(&DrawList, &DrawCmdParams)>;

/// One command of a draw list
#[derive(Clone)]
pub enum DrawCmd {
    /// Draw `count` indices (a multiple of 3) as triangles
    Elements {
        /// Number of indices
        count: usize,
        /// Texture, clip and offsets
        params: DrawCmdParams,
    },
    /// Run a user callback, then return to the backend's baseline state
    Callback {
        /// The callback
        callback: DrawCallback,
        /// Parameters passed to the callback
        params: DrawCmdParams,
    },
    /// Re-establish the backend's baseline state
    ResetRenderState,
}

impl fmt::Debug for DrawCmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Elements { count, params } => f
                .debug_struct("Elements")
                .field("count", count)
                .field("params", params)
                .finish(),
            Self::Callback { params, .. } => f
                .debug_struct("Callback")
                .field("params", params)
                .finish_non_exhaustive(),
            Self::ResetRenderState => f.write_str("ResetRenderState"),
        }
    }
}

/// One layer of UI geometry
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    /// Vertex buffer
    pub vtx_buffer: Vec<DrawVert>,
    /// Index buffer
    pub idx_buffer: Vec<DrawIdx>,
    /// Commands in emission order
    pub commands: Vec<DrawCmd>,
}

impl DrawList {
    /// Create an empty draw list
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an axis-aligned quad as two triangles
    ///
    /// Indices are relative to the start of the vertex buffer.
    pub fn add_rect(&mut self, min: [f32; 2], max: [f32; 2], uv_min: [f32; 2], uv_max: [f32; 2], col: u32) {
        let base = self.vtx_buffer.len() as DrawIdx;
        self.vtx_buffer.extend_from_slice(&[
            DrawVert::new(min, uv_min, col),
            DrawVert::new([max[0], min[1]], [uv_max[0], uv_min[1]], col),
            DrawVert::new(max, uv_max, col),
            DrawVert::new([min[0], max[1]], [uv_min[0], uv_max[1]], col),
        ]);
        self.idx_buffer
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Append a single triangle
    pub fn add_triangle(&mut self, vertices: [DrawVert; 3]) {
        let base = self.vtx_buffer.len() as DrawIdx;
        self.vtx_buffer.extend_from_slice(&vertices);
        self.idx_buffer.extend_from_slice(&[base, base + 1, base + 2]);
    }

    /// Close a geometry command covering every index added since the last one
    pub fn push_elements(&mut self, texture_id: TextureId, clip_rect: [f32; 4]) {
        let idx_offset = self.indices_in_commands();
        let count = self.idx_buffer.len() - idx_offset;
        self.commands.push(DrawCmd::Elements {
            count,
            params: DrawCmdParams { clip_rect, texture_id, vtx_offset: 0, idx_offset },
        });
    }

    /// Append a user callback command
    pub fn push_callback(&mut self, callback: DrawCallback, clip_rect: [f32; 4]) {
        let idx_offset = self.indices_in_commands();
        self.commands.push(DrawCmd::Callback {
            callback,
            params: DrawCmdParams { clip_rect, texture_id: TextureId::NONE, vtx_offset: 0, idx_offset },
        });
    }

    /// Append a reset-state command
    pub fn push_reset_render_state(&mut self) {
        self.commands.push(DrawCmd::ResetRenderState);
    }

    fn indices_in_commands(&self) -> usize {
        self.commands
            .iter()
            .map(|cmd| match cmd {
                DrawCmd::Elements { count, params } => params.idx_offset + count,
                _ => 0,
            })
            .max()
            .unwrap_or(0)
    }
}

/// Everything the UI library emitted for one frame
#[derive(Debug, Clone)]
pub struct DrawData {
    /// Draw lists, back to front
    pub draw_lists: Vec<DrawList>,
    /// Upper-left of the displayed region in UI coordinates
    pub display_pos: Vec2,
    /// Size of the displayed region in UI coordinates
    pub display_size: Vec2,
    /// UI units to framebuffer pixels
    pub framebuffer_scale: Vec2,
    /// Declared vertex count across all lists
    pub total_vtx_count: usize,
    /// Declared index count across all lists
    pub total_idx_count: usize,
}

impl DrawData {
    /// Assemble draw data, deriving the declared totals from the lists
    #[must_use]
    pub fn new(draw_lists: Vec<DrawList>, display_pos: Vec2, display_size: Vec2, framebuffer_scale: Vec2) -> Self {
        let total_vtx_count = draw_lists.iter().map(|l| l.vtx_buffer.len()).sum();
        let total_idx_count = draw_lists.iter().map(|l| l.idx_buffer.len()).sum();
        Self {
            draw_lists,
            display_pos,
            display_size,
            framebuffer_scale,
            total_vtx_count,
            total_idx_count,
        }
    }

    /// Whether the display has no area; such frames draw nothing
    #[must_use]
    pub fn is_display_empty(&self) -> bool {
        self.display_size.x <= 0.0 || self.display_size.y <= 0.0
    }

    /// Framebuffer size in whole pixels
    #[must_use]
    pub fn framebuffer_size(&self) -> (f32, f32) {
        let width = (self.display_size.x * self.framebuffer_scale.x) as i32;
        let height = (self.display_size.y * self.framebuffer_scale.y) as i32;
        (width as f32, height as f32)
    }
}
