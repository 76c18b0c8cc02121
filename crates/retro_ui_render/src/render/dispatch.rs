//! Command dispatch
//!
//! Walks every command of every draw list in order. Geometry commands are
//! clipped in software and submitted as one indexed draw call each; callback
//! and reset commands hand the device to user code or back to the baseline.

use super::api::{DrawCmd, DrawCmdParams, DrawData, DrawIdx, DrawList, RasterDevice, Shared, Viewport};
use super::batch::{FrameBatcher, ListBase};
use super::clip::{ClipRect, ClipScratch};
use super::state::setup_render_state;

/// Counters for one rendered frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Indexed draw calls issued
    pub draw_calls: usize,
    /// Triangles read from the draw data
    pub triangles_in: usize,
    /// Triangles submitted after clipping
    pub triangles_out: usize,
    /// Geometry commands that drew nothing because of their clip rectangle or a device error
    pub skipped_commands: usize,
    /// User callbacks invoked
    pub callbacks: usize,
}

/// Per-frame command walker holding reusable clip scratch space
#[derive(Debug, Default)]
pub struct CommandDispatcher {
    scratch: ClipScratch,
}

impl CommandDispatcher {
    /// Create a dispatcher with empty scratch space
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute every command of `draw_data`
    ///
    /// `batcher` must hold this frame's arrays. `host_viewport` is put back
    /// after each user callback. The device is never borrowed while user
    /// code runs.
    pub fn dispatch<D: RasterDevice>(
        &mut self,
        device: &Shared<D>,
        draw_data: &DrawData,
        batcher: &FrameBatcher,
        host_viewport: Option<&Viewport>,
    ) -> FrameStats {
        let mut stats = FrameStats::default();

        for (list_index, list) in draw_data.draw_lists.iter().enumerate() {
            let Some(base) = batcher.list_base(list_index) else {
                log::warn!("Draw list {list_index} missing from frame batch");
                continue;
            };

            for command in &list.commands {
                match command {
                    DrawCmd::Elements { count, params } => {
                        self.draw_elements(device, draw_data, batcher, list, base, *count, params, &mut stats);
                    }
                    DrawCmd::Callback { callback, params } => {
                        callback(list, params);
                        stats.callbacks += 1;
                        reset_device(device, host_viewport);
                    }
                    DrawCmd::ResetRenderState => reset_device(device, None),
                }
            }
        }

        log::trace!(
            "Frame: {} draw calls, {} -> {} triangles, {} skipped",
            stats.draw_calls,
            stats.triangles_in,
            stats.triangles_out,
            stats.skipped_commands
        );
        stats
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_elements<D: RasterDevice>(
        &mut self,
        device: &Shared<D>,
        draw_data: &DrawData,
        batcher: &FrameBatcher,
        list: &DrawList,
        base: ListBase,
        count: usize,
        params: &DrawCmdParams,
        stats: &mut FrameStats,
    ) {
        let (fb_width, fb_height) = draw_data.framebuffer_size();
        let Some(rect) = ClipRect::to_framebuffer(
            params.clip_rect,
            draw_data.display_pos,
            draw_data.framebuffer_scale,
            fb_width,
            fb_height,
        ) else {
            log::debug!("Skipping command with clip rect {:?}: nothing visible", params.clip_rect);
            stats.skipped_commands += 1;
            return;
        };

        let index_end = params.idx_offset + count;
        if index_end > list.idx_buffer.len() {
            log::warn!(
                "Command indices {}..{index_end} exceed list of {} indices",
                params.idx_offset,
                list.idx_buffer.len()
            );
            stats.skipped_commands += 1;
            return;
        }

        if let Err(e) = device.borrow_mut().set_texture(0, params.texture_id.to_handle()) {
            log::warn!("Could not bind texture {:?}: {e}", params.texture_id);
            stats.skipped_commands += 1;
            return;
        }

        let indices = &batcher.indices()[base.index + params.idx_offset..base.index + index_end];
        let vertex_base = base.vertex + params.vtx_offset;
        let vertex_end = base.vertex + list.vtx_buffer.len();
        let vertices = batcher.vertices();
        let fetch = |index: DrawIdx| {
            let at = vertex_base + index as usize;
            (at < vertex_end).then(|| vertices[at])
        };

        self.scratch.clear();
        self.scratch.reserve(count / 3);
        for triangle in indices.chunks_exact(3) {
            stats.triangles_in += 1;
            let (Some(a), Some(b), Some(c)) = (fetch(triangle[0]), fetch(triangle[1]), fetch(triangle[2])) else {
                log::debug!("Skipping triangle with out-of-range indices {triangle:?}");
                continue;
            };
            if !self.scratch.has_room_for_polygon() {
                self.flush(device, stats);
            }
            stats.triangles_out += self.scratch.emit_triangle([a, b, c], &rect);
        }
        self.flush(device, stats);
    }

    fn flush<D: RasterDevice>(&mut self, device: &Shared<D>, stats: &mut FrameStats) {
        if self.scratch.is_empty() {
            return;
        }
        let result = device
            .borrow_mut()
            .draw_indexed_triangles(self.scratch.vertices(), self.scratch.indices());
        match result {
            Ok(()) => stats.draw_calls += 1,
            Err(e) => log::warn!("Indexed draw of {} indices failed: {e}", self.scratch.indices().len()),
        }
        self.scratch.clear();
    }
}

/// Return the device to the UI baseline, optionally re-applying a viewport
fn reset_device<D: RasterDevice>(device: &Shared<D>, viewport: Option<&Viewport>) {
    let mut device = device.borrow_mut();
    if let Err(e) = setup_render_state(&mut *device) {
        log::warn!("Could not re-establish render state: {e}");
    }
    if let Some(viewport) = viewport {
        if let Err(e) = device.set_viewport(viewport) {
            log::warn!("Could not restore viewport: {e}");
        }
    }
}
