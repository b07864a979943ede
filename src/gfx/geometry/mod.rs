//! # Procedural Geometry Generation
//!
//! Procedural meshes for the built-in renderables: the textured box, the
//! inward-facing skybox cube, the subdivided icosahedron, the water plane and
//! the fire billboard.
//!
//! ## Usage
//!
//! ```no_run
//! use diorama::gfx::geometry::{generate_cube, generate_icosphere};
//!
//! let cube = generate_cube();
//! let sphere = generate_icosphere(2);
//! assert_eq!(cube.triangle_count(), 12);
//! ```

pub mod primitives;

pub use primitives::*;

use crate::gfx::backend::{GeometryId, RenderBackend};
use crate::gfx::scene::vertex::Vertex3D;

/// Represents generated geometry data ready for GPU upload
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Texture coordinates (u, v)
    pub tex_coords: Vec<[f32; 2]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (counter-clockwise winding); empty for non-indexed data
    pub indices: Vec<u32>,
}

impl GeometryData {
    /// Create a new empty geometry data structure
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of vertices in this geometry
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of triangles in this geometry
    pub fn triangle_count(&self) -> usize {
        if self.indices.is_empty() {
            self.vertices.len() / 3
        } else {
            self.indices.len() / 3
        }
    }

    /// Interleaves positions, normals and UVs into the renderer's vertex format
    pub fn to_vertices(&self) -> Vec<Vertex3D> {
        (0..self.vertices.len())
            .map(|i| {
                Vertex3D::new(
                    self.vertices[i],
                    self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                    self.tex_coords.get(i).copied().unwrap_or([0.0, 0.0]),
                )
            })
            .collect()
    }

    pub fn indices(&self) -> Option<&[u32]> {
        (!self.indices.is_empty()).then_some(self.indices.as_slice())
    }

    /// Multiplies every position by `factor`
    pub fn scaled(mut self, factor: f32) -> Self {
        for position in &mut self.vertices {
            position.iter_mut().for_each(|c| *c *= factor);
        }
        self
    }

    /// Reverses triangle winding and normals so the inside faces are front faces
    pub fn inverted(mut self) -> Self {
        for normal in &mut self.normals {
            normal.iter_mut().for_each(|c| *c = -*c);
        }
        if self.indices.is_empty() {
            for triangle in self.vertices.chunks_exact_mut(3) {
                triangle.swap(1, 2);
            }
            for triangle in self.tex_coords.chunks_exact_mut(3) {
                triangle.swap(1, 2);
            }
        } else {
            for triangle in self.indices.chunks_exact_mut(3) {
                triangle.swap(1, 2);
            }
        }
        self
    }

    pub fn upload(&self, backend: &mut dyn RenderBackend, label: &str) -> GeometryId {
        backend.upload_geometry(label, &self.to_vertices(), self.indices())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn winding_normal(data: &GeometryData, triangle: usize) -> [f32; 3] {
        let index = |k: usize| data.indices[triangle * 3 + k] as usize;
        let [a, b, c] = [index(0), index(1), index(2)].map(|i| data.vertices[i]);
        let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
        let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
        [u[1] * v[2] - u[2] * v[1], u[2] * v[0] - u[0] * v[2], u[0] * v[1] - u[1] * v[0]]
    }

    #[test]
    fn test_inverted_cube_winds_inward() {
        let cube = generate_cube();
        let sky = generate_cube().inverted();

        let outward = winding_normal(&cube, 0);
        let inward = winding_normal(&sky, 0);
        assert!(outward[2] > 0.0);
        assert!(inward[2] < 0.0);
        assert_eq!(sky.normals[0], [0.0, 0.0, -1.0]);
    }

    #[test]
    fn test_scaled_moves_positions_only() {
        let quad = generate_water_quad().scaled(3.0);
        assert_eq!(quad.vertices[0], [-3.0, 0.0, -3.0]);
        assert_eq!(quad.tex_coords[0], [0.0, 0.0]);
    }

    #[test]
    fn test_non_indexed_data_has_no_index_slice() {
        let sphere = generate_icosphere(0);
        assert!(sphere.indices().is_none());
        assert_eq!(sphere.triangle_count(), 20);
        assert_eq!(sphere.to_vertices().len(), 60);
    }
}
