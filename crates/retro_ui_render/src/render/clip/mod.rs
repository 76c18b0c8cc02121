//! Software clipping of triangles against clip rectangles
//!
//! The target rasterizer can only clip against the whole viewport, so every
//! command's geometry is cut to its clip rectangle here before submission.

pub mod clipper;
pub mod interpolate;
pub mod rect;

pub use clipper::{clip_triangle, ClipEdge, ClipScratch, ClippedPolygon, MAX_POLYGON_VERTICES};
pub use interpolate::{interpolate, lerp_color};
pub use rect::ClipRect;
