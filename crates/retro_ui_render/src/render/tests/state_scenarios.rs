//! Host state isolation across whole frames

use std::rc::Rc;

use nalgebra::Vector3;

use crate::config::BackendConfig;
use crate::foundation::math::{Mat4, Vec2};
use crate::render::api::device::values::{address, blend, cull, filter, shade, texture_op, FALSE, TRUE};
use crate::render::api::{
    shared, DrawCmdParams, DrawData, DrawList, RasterDevice, RenderState, TextureStageState, TransformKind, Viewport,
};
use crate::render::backends::recording::RecordingDevice;
use crate::ui::{FontAtlas, UiContext, UiRenderBackend};

#[cfg(test)]
mod tests {
    use super::*;

    type Backend = UiRenderBackend<RecordingDevice, RecordingDevice>;

    fn host_device(device: RecordingDevice) -> RecordingDevice {
        let mut device = device;
        device.set_render_state(RenderState::AlphaBlendEnable, FALSE).unwrap();
        device.set_render_state(RenderState::SrcBlend, blend::ONE).unwrap();
        device.set_render_state(RenderState::ZEnable, TRUE).unwrap();
        device.set_render_state(RenderState::CullMode, cull::CCW).unwrap();
        device.set_render_state(RenderState::ShadeMode, shade::FLAT).unwrap();
        device.set_render_state(RenderState::FogEnable, TRUE).unwrap();
        device
            .set_texture_stage_state(0, TextureStageState::ColorOp, texture_op::SELECT_ARG1)
            .unwrap();
        device
            .set_texture_stage_state(0, TextureStageState::MagFilter, filter::POINT)
            .unwrap();
        device
            .set_texture_stage_state(0, TextureStageState::AddressV, address::WRAP)
            .unwrap();
        device
            .set_texture_stage_state(1, TextureStageState::ColorOp, texture_op::MODULATE)
            .unwrap();
        device
            .set_transform(TransformKind::World, &Mat4::new_translation(&Vector3::new(5.0, -3.0, 0.0)))
            .unwrap();
        device
            .set_transform(TransformKind::Projection, &Mat4::new_nonuniform_scaling(&Vector3::new(0.5, 2.0, 1.0)))
            .unwrap();
        device.set_viewport(&Viewport { x: 16, y: 8, width: 640, height: 480, min_z: 0.25, max_z: 0.75 }).unwrap();
        device
    }

    fn busy_frame(font: crate::render::api::TextureId) -> DrawData {
        let mut list = DrawList::new();
        list.add_rect([10.0, 10.0], [90.0, 40.0], [0.0, 0.0], [1.0, 1.0], 0xFF80_40FF);
        list.push_elements(font, [20.0, 0.0, 60.0, 100.0]);
        list.push_callback(Rc::new(|_: &DrawList, _: &DrawCmdParams| {}), [0.0, 0.0, 100.0, 100.0]);
        list.push_reset_render_state();
        list.add_rect([0.0, 50.0], [100.0, 90.0], [0.0, 0.0], [1.0, 1.0], 0xFFFF_FFFF);
        list.push_elements(crate::render::api::TextureId::NONE, [0.0, 0.0, 100.0, 100.0]);
        DrawData::new(vec![list], Vec2::zeros(), Vec2::new(100.0, 100.0), Vec2::new(1.0, 1.0))
    }

    #[test]
    fn test_frame_leaves_host_state_bit_identical() {
        let device = shared(host_device(RecordingDevice::new()));
        let host_texture = device.borrow_mut().create_test_texture(2, 2);
        device.borrow_mut().set_texture(0, Some(host_texture)).unwrap();

        let mut ctx = UiContext::new(FontAtlas::from_rgba32(4, 4, vec![0xFF; 64]));
        let mut backend = Backend::init(&mut ctx, &device, &device, BackendConfig::default()).unwrap();
        let font = backend.create_device_objects(&mut ctx).unwrap();

        let before = device.borrow().state_dump();
        let host_refs = device.borrow().texture_ref_count(host_texture);
        let font_refs = device.borrow().texture_ref_count(font.handle);

        for _ in 0..3 {
            let stats = backend.render_draw_data(&busy_frame(ctx.fonts.texture_id())).unwrap();
            assert_eq!(stats.draw_calls, 2);
            assert_eq!(stats.callbacks, 1);
        }

        let device = device.borrow();
        assert_eq!(device.state_dump(), before);
        assert_eq!(device.bound_texture(0).unwrap(), Some(host_texture));
        assert_eq!(device.texture_ref_count(host_texture), host_refs);
        assert_eq!(device.texture_ref_count(font.handle), font_refs);
        assert_eq!(device.draws()[0].texture, Some(font.handle));
    }

    #[test]
    fn test_unreadable_state_does_not_abort_frame() {
        let device = shared(host_device(RecordingDevice::new().with_unreadable_state(RenderState::ShadeMode)));
        let mut ctx = UiContext::new(FontAtlas::from_rgba32(1, 1, vec![0xFF; 4]));
        let mut backend = Backend::init(&mut ctx, &device, &device, BackendConfig::default()).unwrap();

        let stats = backend
            .render_draw_data(&busy_frame(crate::render::api::TextureId::NONE))
            .unwrap();
        assert_eq!(stats.draw_calls, 2);

        let device = device.borrow();
        // Everything readable was restored
        assert_eq!(device.render_state(RenderState::CullMode).unwrap(), cull::CCW);
        assert_eq!(device.render_state(RenderState::FogEnable).unwrap(), TRUE);
        assert_eq!(device.viewport().unwrap().width, 640);
        // The unreadable value keeps what the frame wrote
        assert_eq!(device.recorded_render_state(RenderState::ShadeMode), Some(shade::GOURAUD));
    }
}
