//! Font atlas texture management
//!
//! The UI library rasterizes its fonts into one RGBA32 atlas. This module
//! turns that atlas into a native texture and owns it until invalidation.

use bytemuck::{cast_slice, cast_slice_mut};

use super::api::{MemoryClass, SurfaceFactory, TextureDesc, TextureHandle, TextureId};
use super::color::TexelFormat;
use super::{RenderError, RenderResult};
use crate::config::BackendConfig;

/// The uploaded font atlas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontTexture {
    /// Native texture
    pub handle: TextureHandle,
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// Memory pool the texture ended up in
    pub memory: MemoryClass,
    /// Channel layout of the texture
    pub format: TexelFormat,
}

impl FontTexture {
    /// Identifier to publish to the UI library
    #[must_use]
    pub fn texture_id(&self) -> TextureId {
        TextureId::from(self.handle)
    }

    /// Width and height in texels
    #[must_use]
    pub const fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Owner of the single font atlas texture
#[derive(Debug, Default)]
pub struct FontAtlasManager {
    current: Option<FontTexture>,
}

impl FontAtlasManager {
    /// Create a manager with no texture
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently uploaded atlas, if any
    #[must_use]
    pub fn current(&self) -> Option<&FontTexture> {
        self.current.as_ref()
    }

    /// Upload RGBA32 atlas pixels into a new native texture
    ///
    /// Fails with [`RenderError::FontAtlasAlreadyUploaded`] while a previous
    /// upload is still live. If the texture cannot be filled it is released
    /// before the error is returned.
    pub fn upload<F: SurfaceFactory + ?Sized>(
        &mut self,
        factory: &mut F,
        pixels: &[u8],
        width: u32,
        height: u32,
        config: &BackendConfig,
    ) -> RenderResult<FontTexture> {
        if let Some(existing) = &self.current {
            return Err(RenderError::FontAtlasAlreadyUploaded(existing.handle));
        }
        if width == 0 || height == 0 {
            return Err(RenderError::ResourceCreationFailed(format!(
                "font atlas has no area ({width}x{height})"
            )));
        }
        let expected = width as usize * height as usize * TexelFormat::BYTES_PER_TEXEL;
        if pixels.len() < expected {
            return Err(RenderError::ResourceCreationFailed(format!(
                "font atlas {width}x{height} needs {expected} bytes, got {}",
                pixels.len()
            )));
        }

        let format = config.atlas_format;
        let (handle, memory) = create_with_fallback(factory, width, height, format, config.prefer_video_memory)?;

        if let Err(e) = fill_texture(factory, handle, &pixels[..expected], width as usize, format) {
            log::warn!("Font atlas fill failed, releasing texture {handle:?}: {e}");
            if let Err(release_err) = factory.release_surface(handle) {
                log::warn!("Could not release texture {handle:?}: {release_err}");
            }
            return Err(e);
        }

        let texture = FontTexture { handle, width, height, memory, format };
        log::info!("Uploaded {width}x{height} font atlas to {memory:?} memory as {format:?}");
        self.current = Some(texture);
        Ok(texture)
    }

    /// Release the atlas texture, returning what was released
    pub fn release<F: SurfaceFactory + ?Sized>(&mut self, factory: &mut F) -> Option<FontTexture> {
        let texture = self.current.take()?;
        match factory.release_surface(texture.handle) {
            Ok(remaining) => log::debug!("Released font atlas {:?} ({remaining} refs left)", texture.handle),
            Err(e) => log::warn!("Could not release font atlas {:?}: {e}", texture.handle),
        }
        Some(texture)
    }
}

fn create_with_fallback<F: SurfaceFactory + ?Sized>(
    factory: &mut F,
    width: u32,
    height: u32,
    format: TexelFormat,
    prefer_video: bool,
) -> RenderResult<(TextureHandle, MemoryClass)> {
    let mut desc = TextureDesc { width, height, format, memory: MemoryClass::System };

    if prefer_video {
        desc.memory = MemoryClass::Video;
        match factory.create_texture(&desc) {
            Ok(handle) => return Ok((handle, MemoryClass::Video)),
            Err(e) => log::warn!("Video memory texture creation failed ({e}), falling back to system memory"),
        }
        desc.memory = MemoryClass::System;
    }

    factory
        .create_texture(&desc)
        .map(|handle| (handle, MemoryClass::System))
        .map_err(|e| RenderError::ResourceCreationFailed(format!("font atlas texture: {e}")))
}

fn fill_texture<F: SurfaceFactory + ?Sized>(
    factory: &mut F,
    handle: TextureHandle,
    pixels: &[u8],
    width: usize,
    format: TexelFormat,
) -> RenderResult<()> {
    let row_bytes = width * TexelFormat::BYTES_PER_TEXEL;
    {
        let surface = factory.lock_texture(handle)?;
        let pitch = surface.pitch;
        let rows = pixels.len() / row_bytes;
        if pitch < row_bytes || surface.bytes.len() < pitch * (rows - 1) + row_bytes {
            drop(surface);
            factory.unlock_texture(handle)?;
            return Err(RenderError::ResourceCreationFailed(format!(
                "locked surface too small: pitch {pitch} for rows of {row_bytes} bytes"
            )));
        }

        for (y, src_row) in pixels.chunks_exact(row_bytes).enumerate() {
            let start = y * pitch;
            let dst_row = &mut surface.bytes[start..start + row_bytes];
            let src: &[[u8; 4]] = cast_slice(src_row);
            let dst: &mut [[u8; 4]] = cast_slice_mut(dst_row);
            for (out, &rgba) in dst.iter_mut().zip(src) {
                *out = format.encode_rgba(rgba);
            }
        }
    }
    factory.unlock_texture(handle)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::recording::RecordingDevice;

    fn gradient(width: u32, height: u32) -> Vec<u8> {
        (0..width * height)
            .flat_map(|i| [i as u8, (i >> 8) as u8, 0x40, 0xFF])
            .collect()
    }

    #[test]
    fn test_upload_reports_size_and_rejects_second_upload() {
        let mut device = RecordingDevice::new();
        let mut manager = FontAtlasManager::new();
        let config = BackendConfig::default();

        let texture = manager
            .upload(&mut device, &gradient(256, 256), 256, 256, &config)
            .unwrap();
        assert_eq!(texture.size(), (256, 256));
        assert_eq!(texture.memory, MemoryClass::Video);
        assert_eq!(device.texture_ref_count(texture.handle), Some(1));

        let again = manager.upload(&mut device, &gradient(256, 256), 256, 256, &config);
        assert!(matches!(again, Err(RenderError::FontAtlasAlreadyUploaded(h)) if h == texture.handle));
        assert_eq!(device.live_textures(), 1);

        assert_eq!(manager.release(&mut device), Some(texture));
        assert_eq!(device.live_textures(), 0);
        assert!(manager.release(&mut device).is_none());
    }

    #[test]
    fn test_channel_order_follows_format() {
        let pixels = [0x11, 0x22, 0x33, 0x44];
        let mut device = RecordingDevice::new();
        let mut manager = FontAtlasManager::new();
        let texture = manager
            .upload(&mut device, &pixels, 1, 1, &BackendConfig::default())
            .unwrap();
        assert_eq!(device.texture_pixels(texture.handle).unwrap(), &[0x33, 0x22, 0x11, 0x44]);

        let mut device = RecordingDevice::new();
        let mut manager = FontAtlasManager::new();
        let config = BackendConfig::default().with_atlas_format(TexelFormat::Abgr8888);
        let texture = manager.upload(&mut device, &pixels, 1, 1, &config).unwrap();
        assert_eq!(device.texture_pixels(texture.handle).unwrap(), &pixels);
    }

    #[test]
    fn test_upload_honors_pitch() {
        let mut device = RecordingDevice::new().with_row_padding(12);
        let mut manager = FontAtlasManager::new();
        let pixels = gradient(3, 2);
        let texture = manager
            .upload(&mut device, &pixels, 3, 2, &BackendConfig::default())
            .unwrap();

        let stored = device.texture_pixels(texture.handle).unwrap();
        let pitch = 3 * 4 + 12;
        assert_eq!(stored.len(), pitch * 2);
        for y in 0..2 {
            for x in 0..3 {
                let src = &pixels[(y * 3 + x) * 4..][..4];
                let dst = &stored[y * pitch + x * 4..][..4];
                assert_eq!(dst, &[src[2], src[1], src[0], src[3]]);
            }
            // Padding untouched
            assert!(stored[y * pitch + 12..(y + 1) * pitch].iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn test_video_memory_falls_back_to_system() {
        let mut device = RecordingDevice::new().without_video_memory();
        let mut manager = FontAtlasManager::new();
        let texture = manager
            .upload(&mut device, &gradient(8, 8), 8, 8, &BackendConfig::default())
            .unwrap();
        assert_eq!(texture.memory, MemoryClass::System);
    }

    #[test]
    fn test_total_creation_failure() {
        let mut device = RecordingDevice::new().without_texture_memory();
        let mut manager = FontAtlasManager::new();
        let result = manager.upload(&mut device, &gradient(8, 8), 8, 8, &BackendConfig::default());
        assert!(matches!(result, Err(RenderError::ResourceCreationFailed(_))));
        assert!(manager.current().is_none());
    }

    #[test]
    fn test_lock_failure_releases_texture() {
        let mut device = RecordingDevice::new().with_failing_lock();
        let mut manager = FontAtlasManager::new();
        let result = manager.upload(&mut device, &gradient(8, 8), 8, 8, &BackendConfig::default());
        assert!(matches!(result, Err(RenderError::Device(_))));
        assert_eq!(device.live_textures(), 0);
        assert!(manager.current().is_none());
    }

    #[test]
    fn test_rejects_short_pixel_buffer() {
        let mut device = RecordingDevice::new();
        let mut manager = FontAtlasManager::new();
        let result = manager.upload(&mut device, &[0u8; 12], 2, 2, &BackendConfig::default());
        assert!(matches!(result, Err(RenderError::ResourceCreationFailed(_))));
        assert_eq!(device.live_textures(), 0);
    }
}
