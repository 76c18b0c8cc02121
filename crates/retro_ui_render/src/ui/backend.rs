//! UI Render Backend
//!
//! The session object a host creates once per UI context. It registers
//! itself with the context, owns the font atlas texture, and renders one
//! frame of draw data at a time onto the host's device.

use crate::config::BackendConfig;
use crate::render::api::{DrawData, RasterDevice, Shared, SurfaceFactory, TextureId};
use crate::render::batch::{check_draw_index_width, FrameBatcher};
use crate::render::dispatch::{CommandDispatcher, FrameStats};
use crate::render::state::{setup_render_state, PipelineStateSnapshot};
use crate::render::texture::{FontAtlasManager, FontTexture};
use crate::render::{RenderError, RenderResult};
use crate::ui::context::{BackendFlags, UiContext};

/// Renderer backend bound to one UI context and one device
///
/// Holds a clone of the host's device and surface factory handles from
/// [`UiRenderBackend::init`] until [`UiRenderBackend::shutdown`].
pub struct UiRenderBackend<D: RasterDevice, F: SurfaceFactory> {
    device: Option<Shared<D>>,
    factory: Option<Shared<F>>,
    config: BackendConfig,
    font: FontAtlasManager,
    batcher: FrameBatcher,
    dispatcher: CommandDispatcher,
}

impl<D: RasterDevice, F: SurfaceFactory> UiRenderBackend<D, F> {
    /// Attach a backend to `ctx`
    ///
    /// Fails if the context already has a renderer backend or this build's UI
    /// index type is wider than the device's.
    pub fn init(ctx: &mut UiContext, device: &Shared<D>, factory: &Shared<F>, config: BackendConfig) -> RenderResult<Self> {
        if let Some(existing) = &ctx.io.renderer_name {
            log::warn!("Context already has renderer backend '{existing}'");
            return Err(RenderError::AlreadyInitialized);
        }
        check_draw_index_width()?;

        ctx.io.renderer_name = Some(config.renderer_name.clone());
        ctx.io.backend_flags.insert(BackendFlags::RENDERER_HAS_VTX_OFFSET);
        log::info!("Initialized renderer backend '{}'", config.renderer_name);

        Ok(Self {
            device: Some(device.clone()),
            factory: Some(factory.clone()),
            config,
            font: FontAtlasManager::new(),
            batcher: FrameBatcher::new(),
            dispatcher: CommandDispatcher::new(),
        })
    }

    /// Detach from `ctx`, releasing device objects and handles
    pub fn shutdown(&mut self, ctx: &mut UiContext) -> RenderResult<()> {
        if !self.is_initialized() {
            return Err(RenderError::NotInitialized);
        }
        self.invalidate_device_objects(ctx)?;
        self.device = None;
        self.factory = None;

        ctx.io.renderer_name = None;
        ctx.io.backend_flags.remove(BackendFlags::RENDERER_HAS_VTX_OFFSET);
        log::info!("Shut down renderer backend '{}'", self.config.renderer_name);
        Ok(())
    }

    /// Start a frame
    pub fn new_frame(&mut self) -> RenderResult<()> {
        if !self.is_initialized() {
            return Err(RenderError::NotInitialized);
        }
        Ok(())
    }

    /// Upload the font atlas and publish its texture id
    ///
    /// If no texture can be created the context keeps [`TextureId::NONE`] and
    /// text renders untextured.
    pub fn create_device_objects(&mut self, ctx: &mut UiContext) -> RenderResult<FontTexture> {
        let factory = self.factory.as_ref().ok_or(RenderError::NotInitialized)?;
        let (pixels, width, height) = ctx.fonts.tex_data_as_rgba32();
        let result = self
            .font
            .upload(&mut *factory.borrow_mut(), pixels, width, height, &self.config);

        match result {
            Ok(texture) => {
                ctx.fonts.set_texture_id(texture.texture_id());
                Ok(texture)
            }
            Err(e @ RenderError::FontAtlasAlreadyUploaded(_)) => Err(e),
            Err(e) => {
                log::warn!("Font atlas unavailable, text will render untextured: {e}");
                ctx.fonts.set_texture_id(TextureId::NONE);
                Err(e)
            }
        }
    }

    /// Release the font atlas and unpublish its texture id
    pub fn invalidate_device_objects(&mut self, ctx: &mut UiContext) -> RenderResult<()> {
        let factory = self.factory.as_ref().ok_or(RenderError::NotInitialized)?;
        if let Some(texture) = self.font.release(&mut *factory.borrow_mut()) {
            log::info!("Invalidated font atlas {:?}", texture.handle);
        }
        ctx.fonts.set_texture_id(TextureId::NONE);
        Ok(())
    }

    /// Render one frame of draw data
    ///
    /// Host pipeline state is captured first and restored last, so the
    /// device looks untouched afterwards. A display with no area draws
    /// nothing and touches no state.
    pub fn render_draw_data(&mut self, draw_data: &DrawData) -> RenderResult<FrameStats> {
        let device = self.device.as_ref().ok_or(RenderError::NotInitialized)?;
        check_draw_index_width()?;
        if draw_data.is_display_empty() {
            log::debug!("Skipping frame with empty display {:?}", draw_data.display_size);
            return Ok(FrameStats::default());
        }

        let snapshot = PipelineStateSnapshot::capture(&mut *device.borrow_mut());
        let setup = setup_render_state(&mut *device.borrow_mut());
        if let Err(e) = setup {
            snapshot.restore(&mut *device.borrow_mut());
            return Err(e.into());
        }

        self.batcher
            .batch(draw_data, self.config.ui_color_order, self.config.vertex_depth);
        let stats = self
            .dispatcher
            .dispatch(device, draw_data, &self.batcher, snapshot.viewport());

        snapshot.restore(&mut *device.borrow_mut());
        Ok(stats)
    }

    /// Current font atlas texture
    #[must_use]
    pub fn font_texture(&self) -> Option<&FontTexture> {
        self.font.current()
    }

    /// Whether `init` succeeded and `shutdown` has not run
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.device.is_some()
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }
}

impl<D: RasterDevice, F: SurfaceFactory> Drop for UiRenderBackend<D, F> {
    fn drop(&mut self) {
        let Some(factory) = self.factory.take() else {
            return;
        };
        log::warn!("Renderer backend '{}' dropped without shutdown", self.config.renderer_name);
        if let Ok(mut factory) = factory.try_borrow_mut() {
            self.font.release(&mut *factory);
        };
    }
}

#[cfg(all(test, not(feature = "wide-indices")))]
mod tests {
    use super::*;
    use crate::render::api::shared;
    use crate::render::backends::recording::RecordingDevice;
    use crate::ui::context::FontAtlas;

    type Backend = UiRenderBackend<RecordingDevice, RecordingDevice>;

    fn context() -> UiContext {
        UiContext::new(FontAtlas::from_rgba32(4, 4, vec![0xFF; 64]))
    }

    #[test]
    fn test_init_registers_with_context() {
        let device = shared(RecordingDevice::new());
        let mut ctx = context();
        ctx.io.backend_flags = BackendFlags::HAS_MOUSE_CURSORS;

        let mut backend = Backend::init(&mut ctx, &device, &device, BackendConfig::new("test_renderer")).unwrap();
        assert_eq!(ctx.io.renderer_name.as_deref(), Some("test_renderer"));
        assert!(ctx.io.backend_flags.contains(BackendFlags::RENDERER_HAS_VTX_OFFSET));
        // Held by the test and by the backend
        assert_eq!(std::rc::Rc::strong_count(&device), 3);

        backend.shutdown(&mut ctx).unwrap();
        assert_eq!(ctx.io.renderer_name, None);
        assert_eq!(ctx.io.backend_flags, BackendFlags::HAS_MOUSE_CURSORS);
        assert_eq!(std::rc::Rc::strong_count(&device), 1);
    }

    #[test]
    fn test_double_init_rejected() {
        let device = shared(RecordingDevice::new());
        let mut ctx = context();
        let _first = Backend::init(&mut ctx, &device, &device, BackendConfig::default()).unwrap();
        let second = Backend::init(&mut ctx, &device, &device, BackendConfig::default());
        assert!(matches!(second, Err(RenderError::AlreadyInitialized)));
    }

    #[test]
    fn test_use_after_shutdown_rejected() {
        let device = shared(RecordingDevice::new());
        let mut ctx = context();
        let mut backend = Backend::init(&mut ctx, &device, &device, BackendConfig::default()).unwrap();
        backend.shutdown(&mut ctx).unwrap();

        assert!(matches!(backend.shutdown(&mut ctx), Err(RenderError::NotInitialized)));
        assert!(matches!(backend.new_frame(), Err(RenderError::NotInitialized)));
        assert!(matches!(
            backend.create_device_objects(&mut ctx),
            Err(RenderError::NotInitialized)
        ));
    }

    #[test]
    fn test_device_objects_publish_texture_id() {
        let device = shared(RecordingDevice::new());
        let mut ctx = context();
        let mut backend = Backend::init(&mut ctx, &device, &device, BackendConfig::default()).unwrap();

        let texture = backend.create_device_objects(&mut ctx).unwrap();
        assert_eq!(ctx.fonts.texture_id(), texture.texture_id());
        assert_eq!(backend.font_texture().map(FontTexture::size), Some((4, 4)));

        backend.invalidate_device_objects(&mut ctx).unwrap();
        assert!(ctx.fonts.texture_id().is_none());
        assert_eq!(device.borrow().live_textures(), 0);

        // Objects can be recreated after invalidation
        backend.create_device_objects(&mut ctx).unwrap();
        backend.shutdown(&mut ctx).unwrap();
        assert_eq!(device.borrow().live_textures(), 0);
    }

    #[test]
    fn test_drop_without_shutdown_releases_atlas() {
        let device = shared(RecordingDevice::new());
        let mut ctx = context();
        {
            let mut backend = Backend::init(&mut ctx, &device, &device, BackendConfig::default()).unwrap();
            backend.create_device_objects(&mut ctx).unwrap();
            assert_eq!(device.borrow().live_textures(), 1);
        }
        assert_eq!(device.borrow().live_textures(), 0);
    }
}

#[cfg(all(test, feature = "wide-indices"))]
mod wide_index_tests {
    use super::*;
    use crate::render::api::shared;
    use crate::render::backends::recording::RecordingDevice;
    use crate::ui::context::FontAtlas;

    #[test]
    fn test_wide_indices_rejected_before_registration() {
        let device = shared(RecordingDevice::new());
        let mut ctx = UiContext::new(FontAtlas::from_rgba32(1, 1, vec![0xFF; 4]));

        let result = UiRenderBackend::init(&mut ctx, &device, &device, BackendConfig::default());
        assert!(matches!(
            result,
            Err(RenderError::IndexWidthUnsupported { ui_bytes: 4, device_bytes: 2 })
        ));
        assert_eq!(ctx.io.renderer_name, None);
        assert!(!ctx.io.backend_flags.contains(BackendFlags::RENDERER_HAS_VTX_OFFSET));
        assert_eq!(device.borrow().state_dump(), RecordingDevice::new().state_dump());
    }
}
