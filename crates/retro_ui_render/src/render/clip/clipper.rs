//! Sutherland–Hodgman triangle clipping against a clip rectangle
//!
//! A triangle is clipped against the four half-planes of the rectangle one at
//! a time, always in the order left, top, right, bottom. Boundaries are
//! inclusive so two rectangles sharing an edge both keep geometry lying on it.
//! The resulting convex polygon is fan-triangulated from its first vertex.
//!
//! Clipping a triangle against four half-planes adds at most one vertex per
//! plane, so a polygon never exceeds [`MAX_POLYGON_VERTICES`] and lives on the
//! stack.

use super::interpolate::interpolate;
use super::rect::ClipRect;
use crate::foundation::math::utils::clamp;
use crate::render::api::{DeviceIndex, DeviceVertex};

/// Upper bound on vertices of a triangle clipped by a rectangle
pub const MAX_POLYGON_VERTICES: usize = 7;

/// Edge deltas below this are treated as parallel to the boundary
const PARALLEL_EPSILON: f32 = 1e-6;

/// One half-plane of a clip rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipEdge {
    /// `x >= min_x`
    Left,
    /// `y >= min_y`
    Top,
    /// `x <= max_x`
    Right,
    /// `y <= max_y`
    Bottom,
}

impl ClipEdge {
    /// Clipping order
    pub const ORDER: [Self; 4] = [Self::Left, Self::Top, Self::Right, Self::Bottom];

    /// Whether `v` is on the kept side of this edge (boundary included)
    #[must_use]
    pub fn contains(self, v: &DeviceVertex, rect: &ClipRect) -> bool {
        match self {
            Self::Left => v.x >= rect.min_x,
            Self::Top => v.y >= rect.min_y,
            Self::Right => v.x <= rect.max_x,
            Self::Bottom => v.y <= rect.max_y,
        }
    }

    /// Point where segment `p -> q` crosses this edge
    ///
    /// Exactly one of `p` and `q` is expected to be inside. The clipped axis
    /// lands exactly on the boundary; the other axis stays between the two
    /// endpoints.
    #[must_use]
    pub fn intersect(self, p: &DeviceVertex, q: &DeviceVertex, rect: &ClipRect) -> DeviceVertex {
        let inside = if self.contains(p, rect) { p } else { q };

        match self {
            Self::Left | Self::Right => {
                let boundary = if self == Self::Left { rect.min_x } else { rect.max_x };
                let dx = q.x - p.x;
                if dx.abs() < PARALLEL_EPSILON {
                    return *inside;
                }
                let mut out = interpolate(p, q, (boundary - p.x) / dx);
                out.x = boundary;
                out.y = between(out.y, p.y, q.y);
                out
            }
            Self::Top | Self::Bottom => {
                let boundary = if self == Self::Top { rect.min_y } else { rect.max_y };
                let dy = q.y - p.y;
                if dy.abs() < PARALLEL_EPSILON {
                    return *inside;
                }
                let mut out = interpolate(p, q, (boundary - p.y) / dy);
                out.y = boundary;
                out.x = between(out.x, p.x, q.x);
                out
            }
        }
    }
}

fn between(value: f32, a: f32, b: f32) -> f32 {
    clamp(value, a.min(b), a.max(b))
}

/// Convex polygon produced while clipping one triangle
#[derive(Debug, Clone, Copy)]
pub struct ClippedPolygon {
    vertices: [DeviceVertex; MAX_POLYGON_VERTICES],
    len: usize,
}

impl ClippedPolygon {
    /// Polygon holding a single triangle
    #[must_use]
    pub fn from_triangle(triangle: [DeviceVertex; 3]) -> Self {
        let mut polygon = Self::empty();
        for v in triangle {
            polygon.push(v);
        }
        polygon
    }

    const fn empty() -> Self {
        Self {
            vertices: [DeviceVertex { x: 0.0, y: 0.0, z: 0.0, rhw: 0.0, color: 0, u: 0.0, v: 0.0 }; MAX_POLYGON_VERTICES],
            len: 0,
        }
    }

    fn push(&mut self, v: DeviceVertex) {
        debug_assert!(self.len < MAX_POLYGON_VERTICES, "clipped polygon overflow");
        if self.len < MAX_POLYGON_VERTICES {
            self.vertices[self.len] = v;
            self.len += 1;
        }
    }

    /// Vertices in winding order
    #[must_use]
    pub fn vertices(&self) -> &[DeviceVertex] {
        &self.vertices[..self.len]
    }

    /// Number of vertices
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether fewer than three vertices survived
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len < 3
    }

    /// Clip against one half-plane
    #[must_use]
    pub fn clip_edge(&self, edge: ClipEdge, rect: &ClipRect) -> Self {
        let mut out = Self::empty();
        let vertices = self.vertices();
        for (i, p) in vertices.iter().enumerate() {
            let q = &vertices[(i + 1) % vertices.len()];
            match (edge.contains(p, rect), edge.contains(q, rect)) {
                (true, true) => out.push(*q),
                (true, false) => out.push(edge.intersect(p, q, rect)),
                (false, true) => {
                    out.push(edge.intersect(p, q, rect));
                    out.push(*q);
                }
                (false, false) => {}
            }
        }
        out
    }

    /// Fan triangulation from vertex 0, as index triplets into [`Self::vertices`]
    pub fn fan(&self) -> impl Iterator<Item = [usize; 3]> {
        (1..self.len.saturating_sub(1)).map(|i| [0, i, i + 1])
    }
}

/// Clip one triangle against `rect`
///
/// A triangle with all three vertices inside comes back unchanged and in its
/// input order.
#[must_use]
pub fn clip_triangle(triangle: [DeviceVertex; 3], rect: &ClipRect) -> ClippedPolygon {
    let mut polygon = ClippedPolygon::from_triangle(triangle);
    if triangle.iter().all(|v| rect.contains(v.x, v.y)) {
        return polygon;
    }
    for edge in ClipEdge::ORDER {
        if polygon.is_empty() {
            break;
        }
        polygon = polygon.clip_edge(edge, rect);
    }
    polygon
}

/// Per-command accumulation of clipped geometry
///
/// Cleared between commands; its allocations are kept for the next one.
#[derive(Debug, Default)]
pub struct ClipScratch {
    vertices: Vec<DeviceVertex>,
    indices: Vec<DeviceIndex>,
}

impl ClipScratch {
    /// Create empty scratch buffers
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve room for at least `triangles` more unclipped triangles
    pub fn reserve(&mut self, triangles: usize) {
        self.vertices.reserve(triangles * 3);
        self.indices.reserve(triangles * 3);
    }

    /// Drop accumulated geometry, keeping capacity
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    /// Whether no triangle has been accumulated
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Whether one more clipped polygon is guaranteed to be addressable by device indices
    #[must_use]
    pub fn has_room_for_polygon(&self) -> bool {
        self.vertices.len() + MAX_POLYGON_VERTICES <= usize::from(DeviceIndex::MAX) + 1
    }

    /// Accumulated vertices
    #[must_use]
    pub fn vertices(&self) -> &[DeviceVertex] {
        &self.vertices
    }

    /// Accumulated triangle-list indices
    #[must_use]
    pub fn indices(&self) -> &[DeviceIndex] {
        &self.indices
    }

    /// Clip a triangle and append the result, returning the number of triangles added
    pub fn emit_triangle(&mut self, triangle: [DeviceVertex; 3], rect: &ClipRect) -> usize {
        let polygon = clip_triangle(triangle, rect);
        if polygon.is_empty() || !self.has_room_for_polygon() {
            return 0;
        }

        let base = self.vertices.len();
        self.vertices.extend_from_slice(polygon.vertices());
        let mut emitted = 0;
        for tri in polygon.fan() {
            self.indices.extend(tri.iter().map(|&i| (base + i) as DeviceIndex));
            emitted += 1;
        }
        emitted
    }
}
