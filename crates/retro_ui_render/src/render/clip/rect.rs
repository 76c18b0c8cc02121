//! Axis-aligned clip rectangles in framebuffer space

use crate::foundation::math::Vec2;

/// Clip rectangle in framebuffer pixels
///
/// Edges are inclusive. A rectangle with `max <= min` on either axis is empty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipRect {
    /// Left edge
    pub min_x: f32,
    /// Top edge
    pub min_y: f32,
    /// Right edge
    pub max_x: f32,
    /// Bottom edge
    pub max_y: f32,
}

impl ClipRect {
    /// Construct from edges
    #[must_use]
    pub const fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Map a UI-space `[min_x, min_y, max_x, max_y]` rectangle into framebuffer space
    ///
    /// Uses the same `(p - origin) * scale` mapping as vertices.
    #[must_use]
    pub fn from_ui(rect: [f32; 4], origin: Vec2, scale: Vec2) -> Self {
        Self {
            min_x: (rect[0] - origin.x) * scale.x,
            min_y: (rect[1] - origin.y) * scale.y,
            max_x: (rect[2] - origin.x) * scale.x,
            max_y: (rect[3] - origin.y) * scale.y,
        }
    }

    /// Map, reject and clamp a UI clip rectangle against the framebuffer
    ///
    /// Returns `None` when nothing under the rectangle can be visible.
    #[must_use]
    pub fn to_framebuffer(rect: [f32; 4], origin: Vec2, scale: Vec2, fb_width: f32, fb_height: f32) -> Option<Self> {
        let mapped = Self::from_ui(rect, origin, scale);
        if mapped.is_empty() || mapped.is_outside(fb_width, fb_height) {
            return None;
        }
        let clamped = mapped.clamp_to(fb_width, fb_height);
        (!clamped.is_empty()).then_some(clamped)
    }

    /// Whether the rectangle has no area
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.max_x <= self.min_x || self.max_y <= self.min_y
    }

    /// Whether the rectangle lies entirely outside a `width` x `height` framebuffer
    #[must_use]
    pub fn is_outside(&self, width: f32, height: f32) -> bool {
        self.max_x < 0.0 || self.max_y < 0.0 || self.min_x > width || self.min_y > height
    }

    /// Clamp to `[0, width] x [0, height]`
    #[must_use]
    pub fn clamp_to(&self, width: f32, height: f32) -> Self {
        Self {
            min_x: self.min_x.max(0.0),
            min_y: self.min_y.max(0.0),
            max_x: self.max_x.min(width),
            max_y: self.max_y.min(height),
        }
    }

    /// Whether `(x, y)` is inside or on the boundary
    #[must_use]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Area in square pixels
    #[must_use]
    pub fn area(&self) -> f32 {
        if self.is_empty() {
            0.0
        } else {
            (self.max_x - self.min_x) * (self.max_y - self.min_y)
        }
    }
}
