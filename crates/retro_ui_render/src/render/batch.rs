//! Frame batching
//!
//! Flattens every draw list of a frame into one device-layout vertex array
//! and one index array. Buffers only ever grow, so a steady UI stops
//! allocating after its first frames.

use super::api::{DeviceIndex, DeviceVertex, DrawData, DrawIdx, DrawVert};
use super::color::{to_device_argb, PackedColorOrder};
use super::{RenderError, RenderResult};
use crate::foundation::math::Vec2;

/// Where one draw list starts inside the frame arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListBase {
    /// First vertex of the list
    pub vertex: usize,
    /// First index of the list
    pub index: usize,
}

/// Reject UI index types the device cannot address
///
/// Indices are never narrowed: a UI library built with wider indices than the
/// device's native type is a build mismatch, not something to truncate.
pub fn check_index_width(ui_index_bytes: usize, device_index_bytes: usize) -> RenderResult<()> {
    if ui_index_bytes > device_index_bytes {
        return Err(RenderError::IndexWidthUnsupported {
            ui_bytes: ui_index_bytes,
            device_bytes: device_index_bytes,
        });
    }
    Ok(())
}

/// Check this build's UI index type against the device index type
pub fn check_draw_index_width() -> RenderResult<()> {
    check_index_width(std::mem::size_of::<DrawIdx>(), std::mem::size_of::<DeviceIndex>())
}

/// Map one UI vertex into framebuffer space
#[must_use]
pub fn transform_vertex(vert: &DrawVert, origin: Vec2, scale: Vec2, order: PackedColorOrder, depth: f32) -> DeviceVertex {
    DeviceVertex {
        x: (vert.pos[0] - origin.x) * scale.x,
        y: (vert.pos[1] - origin.y) * scale.y,
        z: depth,
        rhw: 1.0,
        color: to_device_argb(vert.col, order),
        u: vert.uv[0],
        v: vert.uv[1],
    }
}

/// Reusable per-frame vertex and index arrays
#[derive(Debug, Default)]
pub struct FrameBatcher {
    vertices: Vec<DeviceVertex>,
    indices: Vec<DrawIdx>,
    list_bases: Vec<ListBase>,
}

impl FrameBatcher {
    /// Create an empty batcher
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten `draw_data` into the frame arrays
    pub fn batch(&mut self, draw_data: &DrawData, order: PackedColorOrder, depth: f32) {
        self.vertices.clear();
        self.indices.clear();
        self.list_bases.clear();

        self.vertices.reserve(draw_data.total_vtx_count);
        self.indices.reserve(draw_data.total_idx_count);
        self.list_bases.reserve(draw_data.draw_lists.len());

        let origin = draw_data.display_pos;
        let scale = draw_data.framebuffer_scale;

        for list in &draw_data.draw_lists {
            self.list_bases.push(ListBase {
                vertex: self.vertices.len(),
                index: self.indices.len(),
            });
            self.vertices.extend(
                list.vtx_buffer
                    .iter()
                    .map(|v| transform_vertex(v, origin, scale, order, depth)),
            );
            self.indices.extend_from_slice(&list.idx_buffer);
        }

        if self.vertices.len() != draw_data.total_vtx_count || self.indices.len() != draw_data.total_idx_count {
            log::warn!(
                "Draw data declared {} vertices / {} indices but lists hold {} / {}",
                draw_data.total_vtx_count,
                draw_data.total_idx_count,
                self.vertices.len(),
                self.indices.len()
            );
        }
    }

    /// Frame vertices in device layout
    #[must_use]
    pub fn vertices(&self) -> &[DeviceVertex] {
        &self.vertices
    }

    /// Frame indices, relative to each list's first vertex
    #[must_use]
    pub fn indices(&self) -> &[DrawIdx] {
        &self.indices
    }

    /// Offsets of draw list `list` within the frame arrays
    #[must_use]
    pub fn list_base(&self, list: usize) -> Option<ListBase> {
        self.list_bases.get(list).copied()
    }

    /// Current vertex and index capacity
    #[must_use]
    pub fn capacity(&self) -> (usize, usize) {
        (self.vertices.capacity(), self.indices.capacity())
    }
}
