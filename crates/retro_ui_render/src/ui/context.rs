//! UI library context
//!
//! The parts of the UI library's global context a renderer backend talks to:
//! the IO block where backends register themselves, and the font atlas whose
//! pixels the backend uploads and whose texture id it publishes.

use bitflags::bitflags;

use crate::render::api::TextureId;

bitflags! {
    /// Capabilities advertised by the platform and renderer backends
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BackendFlags: u32 {
        /// Platform backend supports gamepad input
        const HAS_GAMEPAD = 1 << 0;
        /// Platform backend can change the OS cursor shape
        const HAS_MOUSE_CURSORS = 1 << 1;
        /// Platform backend can warp the OS cursor
        const HAS_SET_MOUSE_POS = 1 << 2;
        /// Renderer honors per-command vertex offsets, allowing lists over 64k vertices
        const RENDERER_HAS_VTX_OFFSET = 1 << 3;
    }
}

/// Backend registration block of the UI context
#[derive(Debug, Clone, Default)]
pub struct BackendIo {
    /// Name of the active renderer backend; `Some` while one is attached
    pub renderer_name: Option<String>,
    /// Capability flags
    pub backend_flags: BackendFlags,
}

/// Font atlas as rasterized by the UI library
#[derive(Debug, Clone, Default)]
pub struct FontAtlas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    texture_id: TextureId,
}

impl FontAtlas {
    /// Wrap already rasterized RGBA32 pixels
    #[must_use]
    pub fn from_rgba32(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self { width, height, pixels, texture_id: TextureId::NONE }
    }

    /// Pixels as tightly packed `R, G, B, A` bytes with the atlas size
    #[must_use]
    pub fn tex_data_as_rgba32(&self) -> (&[u8], u32, u32) {
        (&self.pixels, self.width, self.height)
    }

    /// Texture id draw commands use for text
    #[must_use]
    pub fn texture_id(&self) -> TextureId {
        self.texture_id
    }

    /// Publish the texture id of the uploaded atlas
    pub fn set_texture_id(&mut self, id: TextureId) {
        self.texture_id = id;
    }
}

/// UI library context a backend attaches to
#[derive(Debug, Clone, Default)]
pub struct UiContext {
    /// Backend registration
    pub io: BackendIo,
    /// Shared font atlas
    pub fonts: FontAtlas,
}

impl UiContext {
    /// Create a context with the given font atlas
    #[must_use]
    pub fn new(fonts: FontAtlas) -> Self {
        Self { io: BackendIo::default(), fonts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_are_independent() {
        let mut flags = BackendFlags::HAS_MOUSE_CURSORS;
        flags.insert(BackendFlags::RENDERER_HAS_VTX_OFFSET);
        flags.remove(BackendFlags::RENDERER_HAS_VTX_OFFSET);
        assert_eq!(flags, BackendFlags::HAS_MOUSE_CURSORS);
        assert_eq!(BackendFlags::RENDERER_HAS_VTX_OFFSET.bits(), 8);
    }

    #[test]
    fn test_atlas_starts_unpublished() {
        let mut atlas = FontAtlas::from_rgba32(2, 1, vec![0; 8]);
        assert!(atlas.texture_id().is_none());
        atlas.set_texture_id(TextureId::new(3));
        assert_eq!(atlas.texture_id().id(), Some(3));
        let (pixels, w, h) = atlas.tex_data_as_rgba32();
        assert_eq!((pixels.len(), w, h), (8, 2, 1));
    }
}
