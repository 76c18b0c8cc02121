//! Packed color conventions
//!
//! The UI library packs vertex colors into a `u32` whose byte order depends on
//! how it was built. Fixed-function devices want `0xAARRGGBB` for vertex
//! diffuse colors, and textures come in whichever channel layout the driver
//! accepted.

use serde::{Deserialize, Serialize};

/// Byte order of colors packed by the UI library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackedColorOrder {
    /// Red in the low byte (`0xAABBGGRR`), the UI library's default
    Abgr,
    /// Already in device order (`0xAARRGGBB`)
    Argb,
}

/// Channel layout of a 32-bit texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TexelFormat {
    /// `0xAARRGGBB`, stored little-endian as `B, G, R, A`
    Argb8888,
    /// `0xAABBGGRR`, stored little-endian as `R, G, B, A`
    Abgr8888,
}

/// Swap the red and blue channels of a packed color
#[must_use]
pub const fn swap_red_blue(color: u32) -> u32 {
    (color & 0xFF00_FF00) | ((color & 0x00FF_0000) >> 16) | ((color & 0x0000_00FF) << 16)
}

/// Convert a UI-packed color to the device's `0xAARRGGBB`
#[must_use]
pub const fn to_device_argb(color: u32, order: PackedColorOrder) -> u32 {
    match order {
        PackedColorOrder::Abgr => swap_red_blue(color),
        PackedColorOrder::Argb => color,
    }
}

/// Split a device color into `[a, r, g, b]`
#[must_use]
pub const fn unpack_argb(color: u32) -> [u8; 4] {
    [
        (color >> 24) as u8,
        (color >> 16) as u8,
        (color >> 8) as u8,
        color as u8,
    ]
}

/// Join `[a, r, g, b]` into a device color
#[must_use]
pub const fn pack_argb(channels: [u8; 4]) -> u32 {
    ((channels[0] as u32) << 24)
        | ((channels[1] as u32) << 16)
        | ((channels[2] as u32) << 8)
        | channels[3] as u32
}

impl TexelFormat {
    /// Bytes per texel
    pub const BYTES_PER_TEXEL: usize = 4;

    /// Encode one `R, G, B, A` source texel into this format's memory order
    #[must_use]
    pub const fn encode_rgba(self, rgba: [u8; 4]) -> [u8; 4] {
        let [r, g, b, a] = rgba;
        match self {
            Self::Argb8888 => [b, g, r, a],
            Self::Abgr8888 => [r, g, b, a],
        }
    }

    /// Decode one texel from this format's memory order back to `R, G, B, A`
    #[must_use]
    pub const fn decode_rgba(self, texel: [u8; 4]) -> [u8; 4] {
        match self {
            Self::Argb8888 => [texel[2], texel[1], texel[0], texel[3]],
            Self::Abgr8888 => texel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abgr_to_argb() {
        // R=0x11 G=0x22 B=0x33 A=0x44 packed red-low
        let ui = 0x4433_2211;
        assert_eq!(to_device_argb(ui, PackedColorOrder::Abgr), 0x4411_2233);
        assert_eq!(to_device_argb(ui, PackedColorOrder::Argb), ui);
    }

    #[test]
    fn test_pack_unpack() {
        let c = 0x80FF_4010;
        assert_eq!(unpack_argb(c), [0x80, 0xFF, 0x40, 0x10]);
        assert_eq!(pack_argb(unpack_argb(c)), c);
    }

    #[test]
    fn test_texel_encoding_matches_packed_layout() {
        let rgba = [0x11, 0x22, 0x33, 0x44];
        let argb = TexelFormat::Argb8888.encode_rgba(rgba);
        assert_eq!(u32::from_le_bytes(argb), 0x4411_2233);

        let abgr = TexelFormat::Abgr8888.encode_rgba(rgba);
        assert_eq!(u32::from_le_bytes(abgr), 0x4433_2211);

        assert_eq!(TexelFormat::Argb8888.decode_rgba(argb), rgba);
    }
}
