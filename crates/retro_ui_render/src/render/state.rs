//! Pipeline state isolation
//!
//! The backend changes global device state while drawing. Everything it
//! touches is captured before the pass and written back afterwards, so the
//! host's own rendering never observes UI state.

use super::api::device::values::{address, blend, cull, filter, shade, texture_arg, texture_op, FALSE, TRUE};
use super::api::{DeviceResult, RasterDevice, RenderState, TextureHandle, TextureStageState, TransformKind, Viewport};
use crate::foundation::math::Mat4;

/// Texture stage states the backend writes, as `(stage, state)`
pub const TOUCHED_STAGE_STATES: [(u32, TextureStageState); 17] = [
    (0, TextureStageState::ColorOp),
    (0, TextureStageState::ColorArg1),
    (0, TextureStageState::ColorArg2),
    (0, TextureStageState::AlphaOp),
    (0, TextureStageState::AlphaArg1),
    (0, TextureStageState::AlphaArg2),
    (0, TextureStageState::MinFilter),
    (0, TextureStageState::MagFilter),
    (0, TextureStageState::MipFilter),
    (0, TextureStageState::AddressU),
    (0, TextureStageState::AddressV),
    (1, TextureStageState::ColorOp),
    (1, TextureStageState::ColorArg1),
    (1, TextureStageState::ColorArg2),
    (1, TextureStageState::AlphaOp),
    (1, TextureStageState::AlphaArg1),
    (1, TextureStageState::AlphaArg2),
];

/// Snapshot of every piece of device state the backend touches
///
/// Owns one reference to the stage-0 texture that was bound at capture time,
/// unless the device refused to add it. That reference is given back by
/// [`PipelineStateSnapshot::restore`], which must be called on the same device.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipelineStateSnapshot {
    transforms: Vec<(TransformKind, Mat4)>,
    render_states: Vec<(RenderState, u32)>,
    /// `None` if the binding could not be read
    texture: Option<Option<TextureHandle>>,
    texture_retained: bool,
    stage_states: Vec<(u32, TextureStageState, u32)>,
    viewport: Option<Viewport>,
    failed_reads: usize,
}

impl PipelineStateSnapshot {
    /// Read all touched state from `device`
    ///
    /// Best effort: a read that fails is logged and left out of the snapshot,
    /// and restore leaves that value alone.
    pub fn capture<D: RasterDevice + ?Sized>(device: &mut D) -> Self {
        let mut snapshot = Self::default();

        for kind in TransformKind::ALL {
            match device.transform(kind) {
                Ok(matrix) => snapshot.transforms.push((kind, matrix)),
                Err(e) => snapshot.note_failure(&format!("{kind:?} transform"), &e),
            }
        }

        for state in RenderState::ALL {
            match device.render_state(state) {
                Ok(value) => snapshot.render_states.push((state, value)),
                Err(e) => snapshot.note_failure(&format!("{state:?}"), &e),
            }
        }

        match device.bound_texture(0) {
            Ok(Some(handle)) => {
                snapshot.texture = Some(Some(handle));
                match device.retain_texture(handle) {
                    Ok(_) => snapshot.texture_retained = true,
                    Err(e) => log::warn!("Could not retain stage 0 texture {handle:?}: {e}"),
                }
            }
            Ok(None) => snapshot.texture = Some(None),
            Err(e) => snapshot.note_failure("stage 0 texture", &e),
        }

        for (stage, state) in TOUCHED_STAGE_STATES {
            match device.texture_stage_state(stage, state) {
                Ok(value) => snapshot.stage_states.push((stage, state, value)),
                Err(e) => snapshot.note_failure(&format!("stage {stage} {state:?}"), &e),
            }
        }

        match device.viewport() {
            Ok(viewport) => snapshot.viewport = Some(viewport),
            Err(e) => snapshot.note_failure("viewport", &e),
        }

        snapshot
    }

    fn note_failure(&mut self, what: &str, error: &super::api::DeviceError) {
        log::warn!("Could not capture {what}: {error}");
        self.failed_reads += 1;
    }

    /// Write every captured value back, then drop the texture reference
    pub fn restore<D: RasterDevice + ?Sized>(self, device: &mut D) {
        for (kind, matrix) in &self.transforms {
            if let Err(e) = device.set_transform(*kind, matrix) {
                log::warn!("Could not restore {kind:?} transform: {e}");
            }
        }

        for &(state, value) in &self.render_states {
            if let Err(e) = device.set_render_state(state, value) {
                log::warn!("Could not restore {state:?}: {e}");
            }
        }

        if let Some(texture) = self.texture {
            if let Err(e) = device.set_texture(0, texture) {
                log::warn!("Could not restore stage 0 texture: {e}");
            }
            if let Some(handle) = texture.filter(|_| self.texture_retained) {
                if let Err(e) = device.release_texture(handle) {
                    log::warn!("Could not release captured texture {handle:?}: {e}");
                }
            }
        }

        for &(stage, state, value) in &self.stage_states {
            if let Err(e) = device.set_texture_stage_state(stage, state, value) {
                log::warn!("Could not restore stage {stage} {state:?}: {e}");
            }
        }

        if let Some(viewport) = &self.viewport {
            if let Err(e) = device.set_viewport(viewport) {
                log::warn!("Could not restore viewport: {e}");
            }
        }
    }

    /// Viewport at capture time, if it could be read
    #[must_use]
    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }

    /// Texture bound to stage 0 at capture time
    #[must_use]
    pub fn texture(&self) -> Option<TextureHandle> {
        self.texture.flatten()
    }

    /// Number of values that could not be read
    #[must_use]
    pub fn failed_reads(&self) -> usize {
        self.failed_reads
    }
}

/// Put the device into the state UI rendering expects
///
/// Alpha blended, untested and unculled, with stage 0 modulating texture by
/// vertex color and identity transforms. The viewport is left to the host.
pub fn setup_render_state<D: RasterDevice + ?Sized>(device: &mut D) -> DeviceResult<()> {
    device.set_render_state(RenderState::ZEnable, FALSE)?;
    device.set_render_state(RenderState::ZWriteEnable, FALSE)?;
    device.set_render_state(RenderState::CullMode, cull::NONE)?;
    device.set_render_state(RenderState::AlphaBlendEnable, TRUE)?;
    device.set_render_state(RenderState::SrcBlend, blend::SRC_ALPHA)?;
    device.set_render_state(RenderState::DestBlend, blend::INV_SRC_ALPHA)?;
    device.set_render_state(RenderState::Lighting, FALSE)?;
    device.set_render_state(RenderState::ShadeMode, shade::GOURAUD)?;
    device.set_render_state(RenderState::FogEnable, FALSE)?;
    device.set_render_state(RenderState::Clipping, TRUE)?;

    device.set_texture_stage_state(0, TextureStageState::ColorOp, texture_op::MODULATE)?;
    device.set_texture_stage_state(0, TextureStageState::ColorArg1, texture_arg::TEXTURE)?;
    device.set_texture_stage_state(0, TextureStageState::ColorArg2, texture_arg::DIFFUSE)?;
    device.set_texture_stage_state(0, TextureStageState::AlphaOp, texture_op::MODULATE)?;
    device.set_texture_stage_state(0, TextureStageState::AlphaArg1, texture_arg::TEXTURE)?;
    device.set_texture_stage_state(0, TextureStageState::AlphaArg2, texture_arg::DIFFUSE)?;
    device.set_texture_stage_state(1, TextureStageState::ColorOp, texture_op::DISABLE)?;
    device.set_texture_stage_state(1, TextureStageState::AlphaOp, texture_op::DISABLE)?;

    // Sampler
    device.set_texture_stage_state(0, TextureStageState::MinFilter, filter::LINEAR)?;
    device.set_texture_stage_state(0, TextureStageState::MagFilter, filter::LINEAR)?;
    device.set_texture_stage_state(0, TextureStageState::MipFilter, filter::POINT)?;
    device.set_texture_stage_state(0, TextureStageState::AddressU, address::CLAMP)?;
    device.set_texture_stage_state(0, TextureStageState::AddressV, address::CLAMP)?;

    let identity = Mat4::identity();
    for kind in TransformKind::ALL {
        device.set_transform(kind, &identity)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::api::device::values;
    use crate::render::backends::recording::RecordingDevice;

    #[test]
    fn test_setup_writes_baseline() {
        let mut device = RecordingDevice::new();
        setup_render_state(&mut device).unwrap();

        assert_eq!(device.render_state(RenderState::ZEnable).unwrap(), FALSE);
        assert_eq!(device.render_state(RenderState::AlphaBlendEnable).unwrap(), TRUE);
        assert_eq!(device.render_state(RenderState::CullMode).unwrap(), cull::NONE);
        assert_eq!(device.render_state(RenderState::SrcBlend).unwrap(), blend::SRC_ALPHA);
        assert_eq!(
            device.texture_stage_state(0, TextureStageState::ColorOp).unwrap(),
            texture_op::MODULATE
        );
        assert_eq!(
            device.texture_stage_state(1, TextureStageState::AlphaOp).unwrap(),
            texture_op::DISABLE
        );
        assert_eq!(
            device.texture_stage_state(0, TextureStageState::AddressU).unwrap(),
            address::CLAMP
        );
        assert_eq!(device.transform(TransformKind::Projection).unwrap(), Mat4::identity());
    }

    #[test]
    fn test_capture_restore_round_trip() {
        let mut device = RecordingDevice::new();
        device.set_render_state(RenderState::CullMode, cull::CCW).unwrap();
        device.set_render_state(RenderState::ZEnable, TRUE).unwrap();
        device.set_render_state(RenderState::ShadeMode, shade::FLAT).unwrap();
        device
            .set_texture_stage_state(0, TextureStageState::AddressU, address::WRAP)
            .unwrap();
        device
            .set_texture_stage_state(0, TextureStageState::ColorOp, texture_op::SELECT_ARG1)
            .unwrap();
        device
            .set_transform(TransformKind::View, &Mat4::new_scaling(3.0))
            .unwrap();
        device.set_viewport(&Viewport::full(320, 200)).unwrap();
        let before = device.state_dump();

        let snapshot = PipelineStateSnapshot::capture(&mut device);
        assert_eq!(snapshot.failed_reads(), 0);
        setup_render_state(&mut device).unwrap();
        device.set_viewport(&Viewport::full(10, 10)).unwrap();
        assert_ne!(device.state_dump(), before);

        snapshot.restore(&mut device);
        assert_eq!(device.state_dump(), before);
    }

    #[test]
    fn test_bound_texture_retained_for_snapshot_lifetime() {
        let mut device = RecordingDevice::new();
        let texture = device.create_test_texture(4, 4);
        device.set_texture(0, Some(texture)).unwrap();
        assert_eq!(device.texture_ref_count(texture), Some(1));

        let snapshot = PipelineStateSnapshot::capture(&mut device);
        assert_eq!(snapshot.texture(), Some(texture));
        assert_eq!(device.texture_ref_count(texture), Some(2));

        device.set_texture(0, None).unwrap();
        snapshot.restore(&mut device);
        assert_eq!(device.bound_texture(0).unwrap(), Some(texture));
        assert_eq!(device.texture_ref_count(texture), Some(1));
    }

    #[test]
    fn test_unretained_texture_still_rebound() {
        let mut device = RecordingDevice::new();
        let texture = device.create_test_texture(4, 4);
        device.set_texture(0, Some(texture)).unwrap();
        let mut device = device.with_failing_retain();

        let snapshot = PipelineStateSnapshot::capture(&mut device);
        assert_eq!(snapshot.texture(), Some(texture));
        assert_eq!(device.texture_ref_count(texture), Some(1));

        let ui_texture = device.create_test_texture(2, 2);
        device.set_texture(0, Some(ui_texture)).unwrap();
        snapshot.restore(&mut device);

        assert_eq!(device.bound_texture(0).unwrap(), Some(texture));
        assert_eq!(device.texture_ref_count(texture), Some(1));
    }

    #[test]
    fn test_failed_read_skipped() {
        let mut device = RecordingDevice::new().with_unreadable_state(RenderState::FogEnable);
        device.set_render_state(RenderState::Lighting, values::TRUE).unwrap();
        device.set_render_state(RenderState::FogEnable, values::TRUE).unwrap();

        let snapshot = PipelineStateSnapshot::capture(&mut device);
        assert_eq!(snapshot.failed_reads(), 1);

        setup_render_state(&mut device).unwrap();
        snapshot.restore(&mut device);

        // Readable state comes back; the unreadable one keeps the UI value
        assert_eq!(device.render_state(RenderState::Lighting).unwrap(), values::TRUE);
        assert_eq!(device.recorded_render_state(RenderState::FogEnable), Some(values::FALSE));
    }
}
