//! Math utilities and types
//!
//! Provides the small set of math types the backend needs: 2D vectors for
//! screen-space positions and 4x4 matrices for fixed-function transforms.

pub use nalgebra::{Matrix4, Vector2};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Math utility functions
pub mod utils {
    /// Clamp a value between min and max
    #[must_use]
    pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
        value.max(min).min(max)
    }

    /// Linear interpolation between two values
    ///
    /// Exact at both ends: `lerp(a, b, 0.0) == a` and `lerp(a, b, 1.0) == b`.
    #[must_use]
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        if t >= 1.0 {
            return b;
        }
        a + (b - a) * t
    }

    /// Twice the signed area of triangle `(a, b, c)`
    #[must_use]
    pub fn signed_area2(a: [f32; 2], b: [f32; 2], c: [f32; 2]) -> f32 {
        (b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1])
    }
}

#[cfg(test)]
mod tests {
    use super::utils::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_lerp_endpoints_exact() {
        let a = 0.1_f32;
        let b = 123.456_f32;
        assert_eq!(lerp(a, b, 0.0).to_bits(), a.to_bits());
        assert_eq!(lerp(a, b, 1.0).to_bits(), b.to_bits());
        assert_relative_eq!(lerp(0.0, 10.0, 0.25), 2.5);
    }

    #[test]
    fn test_signed_area() {
        assert_relative_eq!(signed_area2([0.0, 0.0], [10.0, 0.0], [0.0, 10.0]), 100.0);
        assert_relative_eq!(signed_area2([0.0, 0.0], [0.0, 10.0], [10.0, 0.0]), -100.0);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(-1.0, 0.0, 1.0), 0.0);
        assert_eq!(clamp(2.0, 0.0, 1.0), 1.0);
        assert_eq!(clamp(0.5, 0.0, 1.0), 0.5);
    }
}
