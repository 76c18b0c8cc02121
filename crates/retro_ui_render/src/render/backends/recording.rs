//! In-memory recording device
//!
//! Implements both device traits over plain data structures. State writes are
//! stored, textures live in a slot map with reference counts, and every draw
//! call is recorded with the texture bound at the time. Failure modes of real
//! drivers can be switched on with the `with_*`/`without_*` builders.

use std::collections::{BTreeMap, BTreeSet};

use slotmap::{DefaultKey, Key, KeyData, SlotMap};

use crate::foundation::math::utils::signed_area2;
use crate::foundation::math::Mat4;
use crate::render::api::device::values::{address, blend, cull, filter, shade, texture_arg, texture_op, FALSE, TRUE};
use crate::render::api::{
    DeviceError, DeviceIndex, DeviceResult, DeviceVertex, LockedSurface, MemoryClass, RasterDevice, RenderState,
    SurfaceFactory, TextureDesc, TextureHandle, TextureStageState, TransformKind, Viewport,
};
use crate::render::color::TexelFormat;

/// Number of texture stages the device exposes
pub const TEXTURE_STAGES: u32 = 8;

/// Viewport of a freshly created recording device
pub const DEFAULT_VIEWPORT: Viewport = Viewport::full(800, 600);

/// One recorded indexed draw call
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    /// Texture bound to stage 0 when the call was made
    pub texture: Option<TextureHandle>,
    /// Submitted vertices
    pub vertices: Vec<DeviceVertex>,
    /// Submitted triangle-list indices
    pub indices: Vec<DeviceIndex>,
}

impl RecordedDraw {
    /// Number of triangles drawn
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Triangles as vertex triplets
    pub fn triangles(&self) -> impl Iterator<Item = [DeviceVertex; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| {
            [
                self.vertices[usize::from(t[0])],
                self.vertices[usize::from(t[1])],
                self.vertices[usize::from(t[2])],
            ]
        })
    }

    /// Total covered area in square pixels
    #[must_use]
    pub fn area(&self) -> f32 {
        self.triangles()
            .map(|[a, b, c]| signed_area2(a.position(), b.position(), c.position()).abs() / 2.0)
            .sum()
    }
}

/// Every piece of pipeline state the device holds
///
/// Two dumps compare equal only if every value is bit-for-bit the same.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceState {
    render_states: BTreeMap<RenderState, u32>,
    stage_states: BTreeMap<(u32, TextureStageState), u32>,
    transforms: BTreeMap<TransformKind, Mat4>,
    viewport: Viewport,
    bound: [Option<TextureHandle>; TEXTURE_STAGES as usize],
}

impl Default for DeviceState {
    fn default() -> Self {
        let render_states = [
            (RenderState::AlphaBlendEnable, FALSE),
            (RenderState::SrcBlend, blend::ONE),
            (RenderState::DestBlend, blend::ZERO),
            (RenderState::ZEnable, TRUE),
            (RenderState::ZWriteEnable, TRUE),
            (RenderState::CullMode, cull::CCW),
            (RenderState::Lighting, TRUE),
            (RenderState::ShadeMode, shade::GOURAUD),
            (RenderState::FogEnable, FALSE),
            (RenderState::Clipping, TRUE),
        ]
        .into_iter()
        .collect();

        let mut stage_states = BTreeMap::new();
        for stage in 0..TEXTURE_STAGES {
            for state in TextureStageState::ALL {
                stage_states.insert((stage, state), default_stage_state(stage, state));
            }
        }

        Self {
            render_states,
            stage_states,
            transforms: TransformKind::ALL.into_iter().map(|k| (k, Mat4::identity())).collect(),
            viewport: DEFAULT_VIEWPORT,
            bound: [None; TEXTURE_STAGES as usize],
        }
    }
}

fn default_stage_state(stage: u32, state: TextureStageState) -> u32 {
    match state {
        TextureStageState::ColorOp if stage == 0 => texture_op::MODULATE,
        TextureStageState::AlphaOp if stage == 0 => texture_op::SELECT_ARG1,
        TextureStageState::ColorOp | TextureStageState::AlphaOp => texture_op::DISABLE,
        TextureStageState::ColorArg1 | TextureStageState::AlphaArg1 => texture_arg::TEXTURE,
        TextureStageState::ColorArg2 | TextureStageState::AlphaArg2 => texture_arg::CURRENT,
        TextureStageState::MinFilter | TextureStageState::MagFilter | TextureStageState::MipFilter => filter::POINT,
        TextureStageState::AddressU | TextureStageState::AddressV => address::WRAP,
    }
}

#[derive(Debug)]
struct RecordedTexture {
    desc: TextureDesc,
    pitch: usize,
    pixels: Vec<u8>,
    ref_count: u32,
    locked: bool,
}

/// Device double that stores everything written to it
#[derive(Debug)]
pub struct RecordingDevice {
    state: DeviceState,
    textures: SlotMap<DefaultKey, RecordedTexture>,
    draws: Vec<RecordedDraw>,
    row_padding: usize,
    video_memory: bool,
    texture_memory: bool,
    failing_lock: bool,
    failing_retain: bool,
    unreadable: BTreeSet<RenderState>,
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self {
            state: DeviceState::default(),
            textures: SlotMap::new(),
            draws: Vec::new(),
            row_padding: 0,
            video_memory: true,
            texture_memory: true,
            failing_lock: false,
            failing_retain: false,
            unreadable: BTreeSet::new(),
        }
    }
}

impl RecordingDevice {
    /// Create a device with default host state and no textures
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pad every texture row by `bytes`, so pitch exceeds `width * 4`
    #[must_use]
    pub fn with_row_padding(mut self, bytes: usize) -> Self {
        self.row_padding = bytes;
        self
    }

    /// Fail texture creation in video memory
    #[must_use]
    pub fn without_video_memory(mut self) -> Self {
        self.video_memory = false;
        self
    }

    /// Fail texture creation in any memory class
    #[must_use]
    pub fn without_texture_memory(mut self) -> Self {
        self.video_memory = false;
        self.texture_memory = false;
        self
    }

    /// Fail every texture lock
    #[must_use]
    pub fn with_failing_lock(mut self) -> Self {
        self.failing_lock = true;
        self
    }

    /// Fail every attempt to add a texture reference
    #[must_use]
    pub fn with_failing_retain(mut self) -> Self {
        self.failing_retain = true;
        self
    }

    /// Fail reads of one render state; writes still succeed
    #[must_use]
    pub fn with_unreadable_state(mut self, state: RenderState) -> Self {
        self.unreadable.insert(state);
        self
    }

    /// Draw calls recorded so far
    #[must_use]
    pub fn draws(&self) -> &[RecordedDraw] {
        &self.draws
    }

    /// Take the recorded draw calls, leaving none
    pub fn take_draws(&mut self) -> Vec<RecordedDraw> {
        std::mem::take(&mut self.draws)
    }

    /// Copy of all pipeline state
    #[must_use]
    pub fn state_dump(&self) -> DeviceState {
        self.state.clone()
    }

    /// Stored render state value, bypassing read failures
    #[must_use]
    pub fn recorded_render_state(&self, state: RenderState) -> Option<u32> {
        self.state.render_states.get(&state).copied()
    }

    /// Reference count of a live texture
    #[must_use]
    pub fn texture_ref_count(&self, texture: TextureHandle) -> Option<u32> {
        self.textures.get(key_of(texture)).map(|t| t.ref_count)
    }

    /// Raw texture memory, including row padding
    #[must_use]
    pub fn texture_pixels(&self, texture: TextureHandle) -> Option<&[u8]> {
        self.textures.get(key_of(texture)).map(|t| t.pixels.as_slice())
    }

    /// Number of live textures
    #[must_use]
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    /// Create a zero-filled system-memory texture owned by the caller
    pub fn create_test_texture(&mut self, width: u32, height: u32) -> TextureHandle {
        let desc = TextureDesc { width, height, format: TexelFormat::Argb8888, memory: MemoryClass::System };
        self.insert_texture(desc)
    }

    fn insert_texture(&mut self, desc: TextureDesc) -> TextureHandle {
        let pitch = desc.width as usize * TexelFormat::BYTES_PER_TEXEL + self.row_padding;
        let key = self.textures.insert(RecordedTexture {
            desc,
            pitch,
            pixels: vec![0; pitch * desc.height as usize],
            ref_count: 1,
            locked: false,
        });
        TextureHandle(key.data().as_ffi())
    }

    fn texture_mut(&mut self, texture: TextureHandle) -> DeviceResult<&mut RecordedTexture> {
        self.textures
            .get_mut(key_of(texture))
            .ok_or(DeviceError::InvalidTexture(texture))
    }

    fn check_stage(stage: u32) -> DeviceResult<usize> {
        if stage < TEXTURE_STAGES {
            Ok(stage as usize)
        } else {
            Err(DeviceError::Unsupported(format!("texture stage {stage}")))
        }
    }

    fn release(&mut self, texture: TextureHandle) -> DeviceResult<u32> {
        let entry = self.texture_mut(texture)?;
        entry.ref_count -= 1;
        let remaining = entry.ref_count;
        if remaining == 0 {
            self.textures.remove(key_of(texture));
            for slot in &mut self.state.bound {
                if *slot == Some(texture) {
                    *slot = None;
                }
            }
        }
        Ok(remaining)
    }
}

fn key_of(texture: TextureHandle) -> DefaultKey {
    KeyData::from_ffi(texture.0).into()
}

impl RasterDevice for RecordingDevice {
    fn render_state(&self, state: RenderState) -> DeviceResult<u32> {
        if self.unreadable.contains(&state) {
            return Err(DeviceError::CallFailed(format!("{state:?} is write-only")));
        }
        self.recorded_render_state(state)
            .ok_or_else(|| DeviceError::Unsupported(format!("{state:?}")))
    }

    fn set_render_state(&mut self, state: RenderState, value: u32) -> DeviceResult<()> {
        self.state.render_states.insert(state, value);
        Ok(())
    }

    fn texture_stage_state(&self, stage: u32, state: TextureStageState) -> DeviceResult<u32> {
        Self::check_stage(stage)?;
        self.state
            .stage_states
            .get(&(stage, state))
            .copied()
            .ok_or_else(|| DeviceError::Unsupported(format!("stage {stage} {state:?}")))
    }

    fn set_texture_stage_state(&mut self, stage: u32, state: TextureStageState, value: u32) -> DeviceResult<()> {
        Self::check_stage(stage)?;
        self.state.stage_states.insert((stage, state), value);
        Ok(())
    }

    fn transform(&self, kind: TransformKind) -> DeviceResult<Mat4> {
        self.state
            .transforms
            .get(&kind)
            .copied()
            .ok_or_else(|| DeviceError::Unsupported(format!("{kind:?} transform")))
    }

    fn set_transform(&mut self, kind: TransformKind, matrix: &Mat4) -> DeviceResult<()> {
        self.state.transforms.insert(kind, *matrix);
        Ok(())
    }

    fn viewport(&self) -> DeviceResult<Viewport> {
        Ok(self.state.viewport)
    }

    fn set_viewport(&mut self, viewport: &Viewport) -> DeviceResult<()> {
        self.state.viewport = *viewport;
        Ok(())
    }

    fn bound_texture(&self, stage: u32) -> DeviceResult<Option<TextureHandle>> {
        Ok(self.state.bound[Self::check_stage(stage)?])
    }

    fn set_texture(&mut self, stage: u32, texture: Option<TextureHandle>) -> DeviceResult<()> {
        let slot = Self::check_stage(stage)?;
        if let Some(handle) = texture {
            if !self.textures.contains_key(key_of(handle)) {
                return Err(DeviceError::InvalidTexture(handle));
            }
        }
        self.state.bound[slot] = texture;
        Ok(())
    }

    fn retain_texture(&mut self, texture: TextureHandle) -> DeviceResult<u32> {
        if self.failing_retain {
            return Err(DeviceError::CallFailed(format!("{texture:?} cannot be retained")));
        }
        let entry = self.texture_mut(texture)?;
        entry.ref_count += 1;
        Ok(entry.ref_count)
    }

    fn release_texture(&mut self, texture: TextureHandle) -> DeviceResult<u32> {
        self.release(texture)
    }

    fn draw_indexed_triangles(&mut self, vertices: &[DeviceVertex], indices: &[DeviceIndex]) -> DeviceResult<()> {
        if indices.len() % 3 != 0 {
            return Err(DeviceError::CallFailed(format!("{} indices is not a triangle list", indices.len())));
        }
        if let Some(&bad) = indices.iter().find(|&&i| usize::from(i) >= vertices.len()) {
            return Err(DeviceError::CallFailed(format!(
                "index {bad} out of range for {} vertices",
                vertices.len()
            )));
        }
        self.draws.push(RecordedDraw {
            texture: self.state.bound[0],
            vertices: vertices.to_vec(),
            indices: indices.to_vec(),
        });
        Ok(())
    }
}

impl SurfaceFactory for RecordingDevice {
    fn create_texture(&mut self, desc: &TextureDesc) -> DeviceResult<TextureHandle> {
        if !self.texture_memory {
            return Err(DeviceError::OutOfMemory);
        }
        if desc.memory == MemoryClass::Video && !self.video_memory {
            return Err(DeviceError::OutOfVideoMemory);
        }
        Ok(self.insert_texture(*desc))
    }

    fn texture_desc(&self, texture: TextureHandle) -> DeviceResult<TextureDesc> {
        self.textures
            .get(key_of(texture))
            .map(|t| t.desc)
            .ok_or(DeviceError::InvalidTexture(texture))
    }

    fn lock_texture(&mut self, texture: TextureHandle) -> DeviceResult<LockedSurface<'_>> {
        if self.failing_lock {
            return Err(DeviceError::LockFailed(format!("{texture:?} surface lost")));
        }
        let entry = self.texture_mut(texture)?;
        if entry.locked {
            return Err(DeviceError::AlreadyLocked(texture));
        }
        entry.locked = true;
        Ok(LockedSurface {
            pitch: entry.pitch,
            bytes: &mut entry.pixels,
        })
    }

    fn unlock_texture(&mut self, texture: TextureHandle) -> DeviceResult<()> {
        let entry = self.texture_mut(texture)?;
        if !entry.locked {
            return Err(DeviceError::CallFailed(format!("{texture:?} is not locked")));
        }
        entry.locked = false;
        Ok(())
    }

    fn release_surface(&mut self, texture: TextureHandle) -> DeviceResult<u32> {
        self.release(texture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_lifetime() {
        let mut device = RecordingDevice::new();
        let texture = device.create_test_texture(2, 2);
        assert_ne!(texture.0, 0);
        device.set_texture(0, Some(texture)).unwrap();

        assert_eq!(device.retain_texture(texture).unwrap(), 2);
        assert_eq!(device.release_texture(texture).unwrap(), 1);
        assert_eq!(device.release_surface(texture).unwrap(), 0);

        assert_eq!(device.live_textures(), 0);
        assert_eq!(device.bound_texture(0).unwrap(), None);
        assert!(matches!(
            device.retain_texture(texture),
            Err(DeviceError::InvalidTexture(_))
        ));
    }

    #[test]
    fn test_lock_is_exclusive() {
        let mut device = RecordingDevice::new().with_row_padding(4);
        let texture = device.create_test_texture(3, 1);
        {
            let surface = device.lock_texture(texture).unwrap();
            assert_eq!(surface.pitch, 16);
            assert_eq!(surface.bytes.len(), 16);
        }
        assert!(matches!(device.lock_texture(texture), Err(DeviceError::AlreadyLocked(_))));
        device.unlock_texture(texture).unwrap();
        assert!(device.unlock_texture(texture).is_err());
    }

    #[test]
    fn test_draw_validates_indices() {
        let mut device = RecordingDevice::new();
        let vertices = [DeviceVertex::at(0.0, 0.0, 0, [0.0, 0.0]); 3];
        assert!(device.draw_indexed_triangles(&vertices, &[0, 1, 3]).is_err());
        assert!(device.draw_indexed_triangles(&vertices, &[0, 1]).is_err());
        device.draw_indexed_triangles(&vertices, &[0, 1, 2]).unwrap();
        assert_eq!(device.draws().len(), 1);
        assert_eq!(device.take_draws()[0].triangle_count(), 1);
        assert!(device.draws().is_empty());
    }

    #[test]
    fn test_recorded_area() {
        let draw = RecordedDraw {
            texture: None,
            vertices: vec![
                DeviceVertex::at(0.0, 0.0, 0, [0.0, 0.0]),
                DeviceVertex::at(10.0, 0.0, 0, [0.0, 0.0]),
                DeviceVertex::at(10.0, 10.0, 0, [0.0, 0.0]),
                DeviceVertex::at(0.0, 10.0, 0, [0.0, 0.0]),
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
        };
        assert_eq!(draw.area(), 100.0);
    }
}
