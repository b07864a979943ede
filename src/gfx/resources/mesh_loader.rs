//! glTF mesh and scene loading
//!
//! Produces [`MeshSource`], the normalized attribute arrays the renderer
//! uploads. Attribute problems are logged and the attribute is dropped; only
//! an unreadable scene file is reported to the caller as a hard error.

use std::path::Path;

use cgmath::{Matrix4, SquareMatrix, Vector3};
use log::{info, warn};

use crate::error::{ViewerError, ViewerResult};
use crate::gfx::geometry::GeometryData;
use crate::gfx::resources::material::Material;

/// Maximum number of texture coordinate sets kept per mesh
pub const MAX_UV_CHANNELS: usize = 4;

/// Vertex attributes of one triangle primitive
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshSource {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tangents: Vec<[f32; 3]>,
    pub uvs: Vec<Vec<[f32; 2]>>,
    pub indices: Vec<u32>,
}

impl MeshSource {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Expands indexed data so every triangle corner has its own vertex
    pub fn flatten(&self) -> MeshSource {
        if self.indices.is_empty() {
            return self.clone();
        }
        let pick3 = |values: &[[f32; 3]]| -> Vec<[f32; 3]> {
            if values.is_empty() {
                return Vec::new();
            }
            self.indices.iter().map(|&i| values[i as usize]).collect()
        };
        MeshSource {
            positions: pick3(&self.positions),
            normals: pick3(&self.normals),
            tangents: pick3(&self.tangents),
            uvs: self
                .uvs
                .iter()
                .map(|channel| self.indices.iter().map(|&i| channel[i as usize]).collect())
                .collect(),
            indices: Vec::new(),
        }
    }

    /// Positions, normals, first UV channel and indices for upload
    pub fn to_geometry(&self) -> GeometryData {
        GeometryData {
            vertices: self.positions.clone(),
            tex_coords: self.uvs.first().cloned().unwrap_or_default(),
            normals: self.normals.clone(),
            indices: self.indices.clone(),
        }
    }
}

/// One drawable primitive of a loaded scene
#[derive(Debug, Clone)]
pub struct SceneMesh {
    pub name: String,
    pub source: MeshSource,
    pub material: Material,
    /// World matrix of the owning node
    pub node_matrix: Matrix4<f32>,
}

fn import(path: &Path) -> Result<(gltf::Document, Vec<gltf::buffer::Data>), gltf::Error> {
    let (document, buffers, _images) = gltf::import(path)?;
    Ok((document, buffers))
}

/// Loads the first triangle primitive of the first mesh in `path`
///
/// With `use_indices` false the mesh is flattened to non-indexed vertices.
pub fn load_mesh(path: &Path, use_indices: bool) -> ViewerResult<MeshSource> {
    let (document, buffers) = import(path).map_err(|e| ViewerError::asset(path, e))?;
    let primitive = document
        .meshes()
        .flat_map(|mesh| mesh.primitives().collect::<Vec<_>>())
        .find(|p| p.mode() == gltf::mesh::Mode::Triangles)
        .ok_or_else(|| ViewerError::asset(path, "no triangle primitive"))?;

    let source = read_primitive(&primitive, &buffers)
        .ok_or_else(|| ViewerError::asset(path, "primitive has no positions"))?;
    info!("Loaded mesh '{}' ({} vertices)", path.display(), source.vertex_count());
    Ok(if use_indices { source } else { source.flatten() })
}

/// Loads every triangle primitive of the default scene
///
/// Node matrices are composed from the root down.
pub fn load_scene(path: &Path) -> ViewerResult<Vec<SceneMesh>> {
    let (document, buffers) = import(path).map_err(|e| ViewerError::SceneLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) else {
        return Err(ViewerError::SceneLoad {
            path: path.to_path_buf(),
            reason: "file contains no scene".to_string(),
        });
    };

    let mut meshes = Vec::new();
    for node in scene.nodes() {
        visit_node(&node, Matrix4::identity(), &buffers, &mut meshes);
    }
    info!("Loaded scene '{}' ({} meshes)", path.display(), meshes.len());
    Ok(meshes)
}

fn visit_node(node: &gltf::Node, parent: Matrix4<f32>, buffers: &[gltf::buffer::Data], out: &mut Vec<SceneMesh>) {
    let world = parent * Matrix4::from(node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        let name = node.name().or(mesh.name()).unwrap_or("mesh").to_string();
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                warn!("Skipping non-triangle primitive of '{}'", name);
                continue;
            }
            let Some(source) = read_primitive(&primitive, buffers) else {
                warn!("Skipping primitive of '{}' without positions", name);
                continue;
            };
            out.push(SceneMesh {
                name: name.clone(),
                source,
                material: convert_material(&primitive.material()),
                node_matrix: world,
            });
        }
    }

    for child in node.children() {
        visit_node(&child, world, buffers, out);
    }
}

fn read_primitive(primitive: &gltf::Primitive, buffers: &[gltf::buffer::Data]) -> Option<MeshSource> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));
    let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
    let count = positions.len();

    let normals = checked("NORMAL", count, reader.read_normals().map(|it| it.collect()));
    let tangents = checked(
        "TANGENT",
        count,
        reader
            .read_tangents()
            .map(|it| it.map(|[x, y, z, _]| [x, y, z]).collect()),
    );

    let mut uvs = Vec::new();
    for set in 0.. {
        let Some(coords) = reader.read_tex_coords(set) else {
            break;
        };
        if uvs.len() == MAX_UV_CHANNELS {
            warn!(
                "{}",
                ViewerError::InvalidShaderAttribute {
                    attribute: format!("TEXCOORD_{}", set),
                    reason: format!("at most {} uv channels are kept", MAX_UV_CHANNELS),
                }
            );
            break;
        }
        let channel = checked(&format!("TEXCOORD_{}", set), count, Some(coords.into_f32().collect()));
        if !channel.is_empty() {
            uvs.push(channel);
        }
    }

    let mut indices: Vec<u32> = reader
        .read_indices()
        .map(|it| it.into_u32().collect())
        .unwrap_or_default();
    if indices.iter().any(|&i| i as usize >= count) {
        warn!("{}", ViewerError::BufferOverflow { attribute: "indices".to_string() });
        indices.clear();
    }

    Some(MeshSource {
        positions,
        normals,
        tangents,
        uvs,
        indices,
    })
}

/// Drops an attribute whose length disagrees with the position count
fn checked<T>(attribute: &str, count: usize, values: Option<Vec<T>>) -> Vec<T> {
    match values {
        Some(values) if values.len() == count => values,
        Some(_) => {
            warn!("{}", ViewerError::BufferOverflow { attribute: attribute.to_string() });
            Vec::new()
        }
        None => Vec::new(),
    }
}

fn convert_material(material: &gltf::Material) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let [r, g, b, _] = pbr.base_color_factor();
    let specular = material
        .specular()
        .map(|s| Vector3::from(s.specular_color_factor()));
    Material::from_metallic_roughness(
        material.name().unwrap_or("gltf"),
        Vector3::new(r, g, b),
        pbr.metallic_factor(),
        pbr.roughness_factor(),
        specular,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::resources::material::{DIFFUSE, SHININESS};
    use crate::gfx::shader::UniformValue;
    use approx::assert_relative_eq;
    use std::path::PathBuf;

    // One triangle under a translated parent node
    const TRIANGLE_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [ { "nodes": [0] } ],
        "nodes": [
            { "name": "root", "translation": [0.0, 2.0, 0.0], "children": [1] },
            { "name": "tri", "translation": [1.0, 0.0, 0.0], "mesh": 0 }
        ],
        "meshes": [ { "primitives": [ { "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 } ] } ],
        "materials": [ { "pbrMetallicRoughness": { "baseColorFactor": [0.8, 0.4, 0.2, 1.0], "metallicFactor": 0.0, "roughnessFactor": 0.5 } } ],
        "buffers": [ { "byteLength": 44, "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAABAAIAAAA=" } ],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 6 }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
            { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
        ]
    }"#;

    fn write_triangle(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(name);
        std::fs::write(&path, TRIANGLE_GLTF).unwrap();
        path
    }

    #[test]
    fn test_flatten_expands_indices() {
        let source = MeshSource {
            positions: vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]],
            uvs: vec![vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]],
            indices: vec![0, 1, 2, 2, 1, 3],
            ..Default::default()
        };
        let flat = source.flatten();
        assert_eq!(flat.vertex_count(), 6);
        assert!(flat.indices.is_empty());
        assert!(flat.normals.is_empty());
        assert_eq!(flat.positions[5], [1.0, 1.0, 0.0]);
        assert_eq!(flat.uvs[0][3], [0.0, 1.0]);
    }

    #[test]
    fn test_missing_scene_is_hard_error() {
        let err = load_scene(Path::new("does/not/exist.glb")).unwrap_err();
        assert!(matches!(err, ViewerError::SceneLoad { .. }));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_missing_mesh_is_asset_error() {
        let err = load_mesh(Path::new("does/not/exist.glb"), true).unwrap_err();
        assert!(matches!(err, ViewerError::AssetLoad { .. }));
    }

    #[test]
    fn test_load_scene_composes_node_matrices() {
        let path = write_triangle("diorama_scene_triangle.gltf");
        let meshes = load_scene(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(meshes.len(), 1);
        let mesh = &meshes[0];
        assert_eq!(mesh.name, "tri");
        assert_eq!(mesh.source.indices, vec![0, 1, 2]);
        assert_relative_eq!(mesh.node_matrix, Matrix4::from_translation(Vector3::new(1.0, 2.0, 0.0)));
        assert_eq!(mesh.material.get(SHININESS), Some(&UniformValue::Float(128.0)));
        assert_eq!(
            mesh.material.get(DIFFUSE),
            Some(&UniformValue::Vec3(Vector3::new(0.8, 0.4, 0.2)))
        );
    }

    #[test]
    fn test_load_mesh_without_indices_flattens() {
        let path = write_triangle("diorama_mesh_triangle.gltf");
        let source = load_mesh(&path, false).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(source.vertex_count(), 3);
        assert!(source.indices.is_empty());
        assert_eq!(source.positions[1], [1.0, 0.0, 0.0]);
    }
}
