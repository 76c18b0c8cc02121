//! Device implementations for the render module
//!
//! Hosts wire the backend to their own rasterizer by implementing
//! [`crate::render::api::RasterDevice`] and
//! [`crate::render::api::SurfaceFactory`]. The recording device here keeps
//! everything in memory and is what the tests and the demo host drive.

/// In-memory device that records state and draw calls
pub mod recording;
