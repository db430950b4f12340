use std::f32::consts::TAU;
use bytemuck::{Pod, Zeroable};
use serde::Serialize;
use thiserror::Error;

/// Fewest angular segments a ring may be built with.
pub const MIN_RING_SEGMENTS: u32 = 8;

/// One vertex of the flat ring mesh. 5 floats = 20 bytes stride.
///
/// `uv.x` is the normalized radial distance (0 at the inner edge, 1 at the
/// outer edge) so a ring texture strip maps across the band. `uv.y` is the
/// angular fraction around the ring.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable, Serialize)]
pub struct RingVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl RingVertex {
    pub const FLOATS: usize = 5;
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4;
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("ring radii must be finite (inner {inner}, outer {outer})")]
    NonFinite { inner: f32, outer: f32 },
    #[error("ring inner radius {inner} must be positive and below outer radius {outer}")]
    InvalidRadii { inner: f32, outer: f32 },
    #[error("ring needs at least {min} segments, got {0}", min = MIN_RING_SEGMENTS)]
    TooFewSegments(u32),
}

/// Flat annulus in the local XY plane, triangulated as one band of quads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RingGeometry {
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub segments: u32,
    pub vertices: Vec<RingVertex>,
    pub indices: Vec<u32>,
}

impl RingGeometry {
    pub fn build(inner_radius: f32, outer_radius: f32, segments: u32) -> Result<Self, GeometryError> {
        if !inner_radius.is_finite() || !outer_radius.is_finite() {
            return Err(GeometryError::NonFinite { inner: inner_radius, outer: outer_radius });
        }
        if inner_radius <= 0.0 || outer_radius <= inner_radius {
            return Err(GeometryError::InvalidRadii { inner: inner_radius, outer: outer_radius });
        }
        if segments < MIN_RING_SEGMENTS {
            return Err(GeometryError::TooFewSegments(segments));
        }

        let mut vertices = Vec::with_capacity(2 * (segments as usize + 1));
        for i in 0..=segments {
            let v = i as f32 / segments as f32;
            let (sin, cos) = (v * TAU).sin_cos();
            vertices.push(RingVertex {
                position: [inner_radius * cos, inner_radius * sin, 0.0],
                uv: [0.0, v],
            });
            vertices.push(RingVertex {
                position: [outer_radius * cos, outer_radius * sin, 0.0],
                uv: [1.0, v],
            });
        }

        let mut indices = Vec::with_capacity(6 * segments as usize);
        for i in 0..segments {
            let a = 2 * i;
            let (b, c, d) = (a + 1, a + 2, a + 3);
            indices.extend_from_slice(&[a, b, d, a, d, c]);
        }

        Ok(Self { inner_radius, outer_radius, segments, vertices, indices })
    }

    /// Vertex data as raw floats, for upload.
    pub fn vertex_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_band() {
        let ring = RingGeometry::build(2.0, 4.0, 96).unwrap();
        assert_eq!(ring.vertices.len(), 2 * 97);
        assert_eq!(ring.triangle_count(), 2 * 96);
        assert_eq!(ring.vertex_floats().len(), ring.vertices.len() * RingVertex::FLOATS);
    }

    #[test]
    fn radial_uv_spans_band() {
        let ring = RingGeometry::build(1.5, 3.0, 8).unwrap();
        for v in &ring.vertices {
            let r = (v.position[0].powi(2) + v.position[1].powi(2)).sqrt();
            let expected = (r - 1.5) / 1.5;
            assert!((v.uv[0] - expected).abs() < 1e-4);
        }
    }

    #[test]
    fn indices_in_range() {
        let ring = RingGeometry::build(1.0, 2.0, 16).unwrap();
        let max = ring.vertices.len() as u32;
        assert!(ring.indices.iter().all(|&i| i < max));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(RingGeometry::build(3.0, 3.0, 64), Err(GeometryError::InvalidRadii { .. })));
        assert!(matches!(RingGeometry::build(0.0, 3.0, 64), Err(GeometryError::InvalidRadii { .. })));
        assert!(matches!(RingGeometry::build(f32::NAN, 3.0, 64), Err(GeometryError::NonFinite { .. })));
        assert_eq!(RingGeometry::build(1.0, 3.0, 4), Err(GeometryError::TooFewSegments(4)));
    }
}
