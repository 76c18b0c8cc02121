//! Overlay demo application
//!
//! Drives the UI render backend against the in-memory recording device: a
//! few frames of overlapping windows, each clipped to its own rectangle,
//! with the per-frame statistics logged.
//!
//! Usage: `overlay_demo [config.toml|config.ron]`

use std::rc::Rc;

use retro_ui_render::config::{BackendConfig, Config, ConfigError};
use retro_ui_render::foundation::logging;
use retro_ui_render::foundation::math::Vec2;
use retro_ui_render::render::api::{shared, DrawCmdParams, DrawData, DrawList, DrawVert, Shared, TextureId};
use retro_ui_render::render::backends::recording::RecordingDevice;
use retro_ui_render::render::RenderError;
use retro_ui_render::ui::{FontAtlas, UiContext, UiRenderBackend};

const DISPLAY_WIDTH: f32 = 800.0;
const DISPLAY_HEIGHT: f32 = 600.0;
const ATLAS_SIZE: u32 = 64;
const FRAMES: usize = 4;

/// Demo failures
#[derive(thiserror::Error, Debug)]
enum DemoError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("renderer: {0}")]
    Render(#[from] RenderError),
}

struct OverlayApp {
    device: Shared<RecordingDevice>,
    ctx: UiContext,
    backend: UiRenderBackend<RecordingDevice, RecordingDevice>,
}

impl OverlayApp {
    fn new(config: BackendConfig) -> Result<Self, DemoError> {
        log::info!("Creating recording device...");
        let device = shared(RecordingDevice::new().with_row_padding(16));
        let mut ctx = UiContext::new(checkerboard_atlas(ATLAS_SIZE));

        let mut backend = UiRenderBackend::init(&mut ctx, &device, &device, config)?;
        let font = backend.create_device_objects(&mut ctx)?;
        log::info!("Font atlas {}x{} in {:?} memory", font.width, font.height, font.memory);

        Ok(Self { device, ctx, backend })
    }

    fn run(&mut self, frames: usize) -> Result<(), DemoError> {
        for frame in 0..frames {
            self.backend.new_frame()?;
            let draw_data = self.build_frame(frame as f32);
            let stats = self.backend.render_draw_data(&draw_data)?;
            let draws = self.device.borrow_mut().take_draws();
            let area: f32 = draws.iter().map(|d| d.area()).sum();
            log::info!(
                "Frame {frame}: {} draw calls, {} -> {} triangles, {} skipped, {} callbacks, {area:.0} px covered",
                stats.draw_calls,
                stats.triangles_in,
                stats.triangles_out,
                stats.skipped_commands,
                stats.callbacks
            );
        }
        Ok(())
    }

    fn build_frame(&self, t: f32) -> DrawData {
        let font = self.ctx.fonts.texture_id();
        let mut background = DrawList::new();
        background.add_rect([0.0, 0.0], [DISPLAY_WIDTH, DISPLAY_HEIGHT], [0.0, 0.0], [0.0, 0.0], 0xFF30_2020);
        background.push_elements(TextureId::NONE, [0.0, 0.0, DISPLAY_WIDTH, DISPLAY_HEIGHT]);

        let mut windows = DrawList::new();
        for i in 0..3 {
            let x = 40.0 + i as f32 * 180.0 + t * 25.0;
            let y = 60.0 + i as f32 * 40.0;
            let clip = [x, y, x + 220.0, y + 140.0];

            // Title text spills past the window and is clipped
            windows.add_rect([x - 30.0, y + 4.0], [x + 300.0, y + 24.0], [0.0, 0.0], [1.0, 1.0], 0xFFFF_FFFF);
            windows.add_triangle([
                DrawVert::new([x + 110.0, y - 60.0], [0.5, 0.0], 0xC000_FF00),
                DrawVert::new([x + 300.0, y + 200.0], [1.0, 1.0], 0xC0FF_0000),
                DrawVert::new([x - 80.0, y + 200.0], [0.0, 1.0], 0xC000_00FF),
            ]);
            windows.push_elements(font, clip);
        }
        windows.push_callback(
            Rc::new(|list: &DrawList, params: &DrawCmdParams| {
                log::debug!("User callback over {:?} ({} vertices in list)", params.clip_rect, list.vtx_buffer.len());
            }),
            [0.0, 0.0, DISPLAY_WIDTH, DISPLAY_HEIGHT],
        );
        windows.push_reset_render_state();

        // A tooltip that has scrolled off screen
        windows.add_rect([900.0, 10.0], [980.0, 30.0], [0.0, 0.0], [1.0, 1.0], 0xFFFF_FFFF);
        windows.push_elements(font, [900.0, 10.0, 980.0, 30.0]);

        DrawData::new(
            vec![background, windows],
            Vec2::zeros(),
            Vec2::new(DISPLAY_WIDTH, DISPLAY_HEIGHT),
            Vec2::new(1.0, 1.0),
        )
    }

    fn shutdown(&mut self) -> Result<(), DemoError> {
        self.backend.shutdown(&mut self.ctx)?;
        log::info!("Live textures after shutdown: {}", self.device.borrow().live_textures());
        Ok(())
    }
}

fn checkerboard_atlas(size: u32) -> FontAtlas {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let alpha = if (x / 8 + y / 8) % 2 == 0 { 0xFF } else { 0x00 };
            pixels.extend_from_slice(&[0xFF, 0xFF, 0xFF, alpha]);
        }
    }
    FontAtlas::from_rgba32(size, size, pixels)
}

fn load_config() -> Result<BackendConfig, DemoError> {
    match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading backend config from {path}");
            Ok(BackendConfig::load_from_file(&path)?)
        }
        None => Ok(BackendConfig::new("overlay_demo")),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var_os("RUST_LOG").is_some() {
        logging::init();
    } else {
        logging::init_with_filter("info");
    }

    log::info!("Starting overlay demo");
    let config = load_config()?;
    let mut app = OverlayApp::new(config)?;
    app.run(FRAMES)?;
    app.shutdown()?;
    log::info!("Overlay demo finished");
    Ok(())
}
