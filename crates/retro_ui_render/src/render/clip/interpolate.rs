//! Attribute interpolation along clipped edges

use crate::foundation::math::utils::{clamp, lerp};
use crate::render::api::DeviceVertex;
use crate::render::color::{pack_argb, unpack_argb};

/// Interpolate two packed `0xAARRGGBB` colors channel by channel
///
/// Each 8-bit channel is interpolated on its own and rounded to the nearest
/// integer. No premultiplication.
#[must_use]
pub fn lerp_color(p: u32, q: u32, t: f32) -> u32 {
    let t = clamp(t, 0.0, 1.0);
    let a = unpack_argb(p);
    let b = unpack_argb(q);
    let mut out = [0u8; 4];
    for (channel, (&from, &to)) in out.iter_mut().zip(a.iter().zip(b.iter())) {
        *channel = lerp(f32::from(from), f32::from(to), t).round() as u8;
    }
    pack_argb(out)
}

/// Point at parameter `t` along `p -> q` with every attribute interpolated
///
/// `t` is clamped to `[0, 1]`; `t = 0` yields `p` and `t = 1` yields `q`
/// exactly.
#[must_use]
pub fn interpolate(p: &DeviceVertex, q: &DeviceVertex, t: f32) -> DeviceVertex {
    let t = clamp(t, 0.0, 1.0);
    DeviceVertex {
        x: lerp(p.x, q.x, t),
        y: lerp(p.y, q.y, t),
        z: lerp(p.z, q.z, t),
        rhw: lerp(p.rhw, q.rhw, t),
        color: lerp_color(p.color, q.color, t),
        u: lerp(p.u, q.u, t),
        v: lerp(p.v, q.v, t),
    }
}
