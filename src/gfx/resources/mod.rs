// src/gfx/resources/mod.rs
//! Scene resources
//!
//! Textures, materials, lights and the glTF mesh loader.

pub mod light;
pub mod material;
pub mod mesh_loader;
pub mod texture_resource;

// Re-export main types
pub use light::{Light, LightObject, LightType};
pub use material::Material;
pub use mesh_loader::{load_mesh, load_scene, MeshSource, SceneMesh};
pub use texture_resource::{TextureResource, TextureSource};
