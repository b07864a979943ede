//! # Primitive Shape Generation
//!
//! All shapes are generated with normals and texture coordinates and wind
//! counter-clockwise when seen from their front side.

use super::GeometryData;
use std::f32::consts::PI;

/// Generate a unit cube centered at the origin
///
/// Returns a cube with vertices from -0.5 to 0.5 on all axes.
/// Each face has proper normals pointing outward and UV coordinates from 0 to 1.
pub fn generate_cube() -> GeometryData {
    let mut data = GeometryData::new();

    #[rustfmt::skip]
    let positions = [
        // Front face
        [-0.5, -0.5,  0.5], [ 0.5, -0.5,  0.5], [ 0.5,  0.5,  0.5], [-0.5,  0.5,  0.5],
        // Back face
        [-0.5, -0.5, -0.5], [-0.5,  0.5, -0.5], [ 0.5,  0.5, -0.5], [ 0.5, -0.5, -0.5],
        // Left face
        [-0.5, -0.5, -0.5], [-0.5, -0.5,  0.5], [-0.5,  0.5,  0.5], [-0.5,  0.5, -0.5],
        // Right face
        [ 0.5, -0.5,  0.5], [ 0.5, -0.5, -0.5], [ 0.5,  0.5, -0.5], [ 0.5,  0.5,  0.5],
        // Top face
        [-0.5,  0.5,  0.5], [ 0.5,  0.5,  0.5], [ 0.5,  0.5, -0.5], [-0.5,  0.5, -0.5],
        // Bottom face
        [-0.5, -0.5, -0.5], [ 0.5, -0.5, -0.5], [ 0.5, -0.5,  0.5], [-0.5, -0.5,  0.5],
    ];

    // Image rows run top to bottom, so v grows downwards on each face
    #[rustfmt::skip]
    let tex_coords = [
        [0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0],
        [1.0, 1.0], [1.0, 0.0], [0.0, 0.0], [0.0, 1.0],
        [0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0],
        [0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0],
        [0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0],
        [0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0],
    ];

    let face_normals: [[f32; 3]; 6] = [
        [0.0, 0.0, 1.0],
        [0.0, 0.0, -1.0],
        [-1.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, -1.0, 0.0],
    ];

    data.vertices = positions.to_vec();
    data.tex_coords = tex_coords.to_vec();
    data.normals = face_normals.iter().flat_map(|n| [*n; 4]).collect();

    // Two triangles per face, counter-clockwise
    data.indices = (0..6u32)
        .flat_map(|face| {
            let base = face * 4;
            [base, base + 1, base + 2, base + 2, base + 3, base]
        })
        .collect();

    data
}

/// Generate the skybox cube: side length 2, wound so its inside is visible
pub fn generate_skybox() -> GeometryData {
    generate_cube().scaled(2.0).inverted()
}

/// Generate an icosahedron with each face split `subdivisions` times
///
/// Subdivided vertices stay on the flat faces of the icosahedron; the shader
/// pushes them onto the unit sphere when the morph is enabled. The result is
/// non-indexed with one flat normal per triangle.
pub fn generate_icosphere(subdivisions: u32) -> GeometryData {
    let t = (1.0 + 5.0f32.sqrt()) / 2.0;
    let corners: Vec<[f32; 3]> = [
        [-1.0, t, 0.0],
        [1.0, t, 0.0],
        [-1.0, -t, 0.0],
        [1.0, -t, 0.0],
        [0.0, -1.0, t],
        [0.0, 1.0, t],
        [0.0, -1.0, -t],
        [0.0, 1.0, -t],
        [t, 0.0, -1.0],
        [t, 0.0, 1.0],
        [-t, 0.0, -1.0],
        [-t, 0.0, 1.0],
    ]
    .iter()
    .map(|p| normalize(*p))
    .collect();

    #[rustfmt::skip]
    let faces: [[usize; 3]; 20] = [
        [0, 11, 5], [0, 5, 1], [0, 1, 7], [0, 7, 10], [0, 10, 11],
        [1, 5, 9], [5, 11, 4], [11, 10, 2], [10, 7, 6], [7, 1, 8],
        [3, 9, 4], [3, 4, 2], [3, 2, 6], [3, 6, 8], [3, 8, 9],
        [4, 9, 5], [2, 4, 11], [6, 2, 10], [8, 6, 7], [9, 8, 1],
    ];

    let mut triangles: Vec<[[f32; 3]; 3]> = faces
        .iter()
        .map(|f| [corners[f[0]], corners[f[1]], corners[f[2]]])
        .collect();

    for _ in 0..subdivisions {
        triangles = triangles
            .iter()
            .flat_map(|[a, b, c]| {
                let ab = midpoint(*a, *b);
                let bc = midpoint(*b, *c);
                let ca = midpoint(*c, *a);
                [[*a, ab, ca], [ab, *b, bc], [ca, bc, *c], [ab, bc, ca]]
            })
            .collect();
    }

    let mut data = GeometryData::new();
    for triangle in triangles {
        let normal = face_normal(&triangle);
        for p in triangle {
            data.vertices.push(p);
            data.normals.push(normal);
            data.tex_coords.push(spherical_uv(p));
        }
    }
    data
}

/// Generate the water plane: 2x2 in XZ, facing +Y
pub fn generate_water_quad() -> GeometryData {
    GeometryData {
        vertices: vec![[-1.0, 0.0, -1.0], [1.0, 0.0, -1.0], [1.0, 0.0, 1.0], [-1.0, 0.0, 1.0]],
        tex_coords: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        normals: vec![[0.0, 1.0, 0.0]; 4],
        indices: vec![0, 2, 1, 2, 0, 3],
    }
}

/// Generate the fire billboard: 1x1 in XY, visible from both sides
pub fn generate_fire_quad() -> GeometryData {
    GeometryData {
        vertices: vec![[-0.5, 0.0, 0.0], [0.5, 0.0, 0.0], [0.5, 1.0, 0.0], [-0.5, 1.0, 0.0]],
        tex_coords: vec![[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]],
        normals: vec![[0.0, 0.0, 1.0]; 4],
        indices: vec![0, 1, 2, 2, 3, 0, 0, 2, 1, 2, 0, 3],
    }
}

fn normalize(p: [f32; 3]) -> [f32; 3] {
    let length = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
    [p[0] / length, p[1] / length, p[2] / length]
}

fn midpoint(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [(a[0] + b[0]) * 0.5, (a[1] + b[1]) * 0.5, (a[2] + b[2]) * 0.5]
}

fn face_normal([a, b, c]: &[[f32; 3]; 3]) -> [f32; 3] {
    let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
    normalize([u[1] * v[2] - u[2] * v[1], u[2] * v[0] - u[0] * v[2], u[0] * v[1] - u[1] * v[0]])
}

fn spherical_uv(p: [f32; 3]) -> [f32; 2] {
    let n = normalize(p);
    let u = 0.5 + n[2].atan2(n[0]) / (2.0 * PI);
    let v = 0.5 - n[1].asin() / PI;
    [u, v]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_generation() {
        let cube = generate_cube();
        assert_eq!(cube.vertices.len(), 24); // 6 faces * 4 vertices
        assert_eq!(cube.indices.len(), 36); // 6 faces * 2 triangles * 3 indices
        assert_eq!(cube.normals.len(), 24);
        assert_eq!(cube.triangle_count(), 12);
    }

    #[test]
    fn test_skybox_spans_two_units() {
        let sky = generate_skybox();
        assert!(sky.vertices.iter().flatten().all(|c| c.abs() == 1.0));
    }

    #[test]
    fn test_icosphere_subdivision() {
        let sphere = generate_icosphere(2);
        assert_eq!(sphere.triangle_count(), 20 * 16);
        assert_eq!(sphere.vertices.len(), sphere.normals.len());
        assert_eq!(sphere.vertices.len(), sphere.tex_coords.len());

        // Icosahedron corners lie on the unit sphere, midpoints fall inside it
        let radii: Vec<f32> = sphere
            .vertices
            .iter()
            .map(|p| (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt())
            .collect();
        assert!(radii.iter().all(|r| *r <= 1.0 + 1e-5));
        assert!(radii.iter().any(|r| *r < 0.99));
    }

    #[test]
    fn test_icosphere_normals_point_outward() {
        let sphere = generate_icosphere(1);
        for (p, n) in sphere.vertices.iter().zip(&sphere.normals) {
            assert!(p[0] * n[0] + p[1] * n[1] + p[2] * n[2] > 0.0);
        }
    }

    #[test]
    fn test_fire_quad_is_double_sided() {
        let fire = generate_fire_quad();
        assert_eq!(fire.triangle_count(), 4);
        assert_eq!(&fire.indices[..3], &[0, 1, 2]);
        assert_eq!(&fire.indices[6..9], &[0, 2, 1]);
    }
}
