//! Material system for Phong shading
//!
//! A material is a sparse set of named uniform values. Typed setters fill the
//! map and [`Material::apply`] uploads every entry to the bound program, so
//! materials with different sets of fields share one code path.

use std::collections::BTreeMap;

use cgmath::{Matrix3, Matrix4, Vector2, Vector3, Vector4};

use crate::gfx::backend::RenderBackend;
use crate::gfx::shader::{ShaderProgram, UniformValue};

pub const DIFFUSE: &str = "material.diffuse";
pub const SPECULAR: &str = "material.specular";
pub const SHININESS: &str = "material.shininess";

/// Bronze, used when nothing else is known
pub const DEFAULT_DIFFUSE: Vector3<f32> = Vector3::new(1.0, 0.5, 0.31);
pub const DEFAULT_SPECULAR: Vector3<f32> = Vector3::new(0.5, 0.5, 0.5);
pub const DEFAULT_SHININESS: f32 = 32.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    values: BTreeMap<String, UniformValue>,
}

impl Default for Material {
    fn default() -> Self {
        let mut material = Self::new("Bronze");
        material.set_defaults();
        material
    }
}

impl Material {
    /// Creates an empty material
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            values: BTreeMap::new(),
        }
    }

    /// Phong material from colours and shininess
    pub fn phong(name: &str, diffuse: Vector3<f32>, specular: Vector3<f32>, shininess: f32) -> Self {
        let mut material = Self::new(name);
        material.set_vec3(DIFFUSE, diffuse);
        material.set_vec3(SPECULAR, specular);
        material.set_float(SHININESS, shininess);
        material
    }

    /// Converts glTF metallic-roughness parameters to Phong terms
    ///
    /// diffuse = albedo * (1 - metallic), specular is the explicit specular
    /// colour when given or a metallic blend between white and albedo, and
    /// shininess = (1 - roughness) * 256.
    pub fn from_metallic_roughness(
        name: &str,
        albedo: Vector3<f32>,
        metallic: f32,
        roughness: f32,
        specular_color: Option<Vector3<f32>>,
    ) -> Self {
        let metallic = metallic.clamp(0.0, 1.0);
        let roughness = roughness.clamp(0.0, 1.0);
        let diffuse = albedo * (1.0 - metallic);
        let specular =
            specular_color.unwrap_or_else(|| Vector3::new(1.0, 1.0, 1.0) * (1.0 - metallic) + albedo * metallic);
        Self::phong(name, diffuse, specular, (1.0 - roughness) * 256.0)
    }

    /// Restores the bronze defaults
    pub fn set_defaults(&mut self) {
        self.set_vec3(DIFFUSE, DEFAULT_DIFFUSE);
        self.set_vec3(SPECULAR, DEFAULT_SPECULAR);
        self.set_float(SHININESS, DEFAULT_SHININESS);
    }

    pub fn set(&mut self, name: &str, value: UniformValue) {
        self.values.insert(name.to_string(), value);
    }

    pub fn set_int(&mut self, name: &str, value: i32) {
        self.set(name, UniformValue::Int(value));
    }

    pub fn set_float(&mut self, name: &str, value: f32) {
        self.set(name, UniformValue::Float(value));
    }

    pub fn set_vec2(&mut self, name: &str, value: Vector2<f32>) {
        self.set(name, UniformValue::Vec2(value));
    }

    pub fn set_vec3(&mut self, name: &str, value: Vector3<f32>) {
        self.set(name, UniformValue::Vec3(value));
    }

    pub fn set_vec4(&mut self, name: &str, value: Vector4<f32>) {
        self.set(name, UniformValue::Vec4(value));
    }

    pub fn set_mat3(&mut self, name: &str, value: Matrix3<f32>) {
        self.set(name, UniformValue::Mat3(value));
    }

    pub fn set_mat4(&mut self, name: &str, value: Matrix4<f32>) {
        self.set(name, UniformValue::Mat4(value));
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.values.get(name)
    }

    /// Uploads every value to the bound program; unknown names are skipped
    pub fn apply(&self, backend: &mut dyn RenderBackend, program: &ShaderProgram) {
        for (name, value) in &self.values {
            backend.set_uniform(program.location(name), *value);
        }
    }
}
