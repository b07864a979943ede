//! Scene lights
//!
//! [`Light`] is the fixed set of values a light contributes to the shader.
//! [`LightObject`] anchors a light to a transform and writes it into the
//! `lights[i]` uniform array.

use cgmath::{Rad, Vector3};

use crate::gfx::backend::RenderBackend;
use crate::gfx::scene::transform::{TransformArena, TransformId};
use crate::gfx::shader::{ShaderProgram, UniformValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightType {
    Ambient = 0,
    Direct = 1,
    Point = 2,
    Spot = 3,
}

impl LightType {
    pub fn has_attenuation(self) -> bool {
        matches!(self, LightType::Point | LightType::Spot)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Default for Attenuation {
    fn default() -> Self {
        Self {
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
        }
    }
}

/// Inner and outer cone of a spot light, stored as cosines
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cone {
    pub cut_off: f32,
    pub outer_cut_off: f32,
}

impl Default for Cone {
    fn default() -> Self {
        Self {
            cut_off: Rad::from(cgmath::Deg(12.5f32)).0.cos(),
            outer_cut_off: Rad::from(cgmath::Deg(17.5f32)).0.cos(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub light_type: LightType,
    pub color: Vector3<f32>,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    /// Point and spot lights only
    pub attenuation: Option<Attenuation>,
    pub cone: Option<Cone>,
}

impl Light {
    pub fn new(light_type: LightType) -> Self {
        let attenuation = light_type.has_attenuation().then(Attenuation::default);
        Self {
            light_type,
            color: Vector3::new(1.0, 1.0, 1.0),
            ambient: Vector3::new(0.1, 0.1, 0.1),
            diffuse: Vector3::new(1.0, 1.0, 1.0),
            specular: Vector3::new(1.0, 1.0, 1.0),
            attenuation,
            cone: attenuation.map(|_| Cone::default()),
        }
    }

    /// Every value the light writes, keyed by member name
    pub fn members(&self) -> Vec<(&'static str, UniformValue)> {
        let mut members = vec![
            ("type", UniformValue::Int(self.light_type as i32)),
            ("color", UniformValue::Vec3(self.color)),
            ("ambient", UniformValue::Vec3(self.ambient)),
            ("diffuse", UniformValue::Vec3(self.diffuse)),
            ("specular", UniformValue::Vec3(self.specular)),
        ];
        if let Some(a) = self.attenuation {
            members.push(("constant", UniformValue::Float(a.constant)));
            members.push(("linear", UniformValue::Float(a.linear)));
            members.push(("quadratic", UniformValue::Float(a.quadratic)));
        }
        if let Some(cone) = self.cone {
            members.push(("cutOff", UniformValue::Float(cone.cut_off)));
            members.push(("outerCutOff", UniformValue::Float(cone.outer_cut_off)));
        }
        members
    }
}

/// A light placed by a transform, either its own or a shared one
#[derive(Debug, Clone)]
pub struct LightObject {
    pub light: Light,
    pub anchor: TransformId,
    index: usize,
    names: Vec<(String, UniformValue)>,
    position_name: String,
    direction_name: String,
}

impl LightObject {
    pub fn new(light: Light, anchor: TransformId, index: usize) -> Self {
        let mut object = Self {
            light,
            anchor,
            index,
            names: Vec::new(),
            position_name: String::new(),
            direction_name: String::new(),
        };
        object.set_data(index);
        object
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Binds the array slot and regenerates every uniform name
    pub fn set_data(&mut self, index: usize) {
        self.index = index;
        let prefix = format!("lights[{}]", index);
        self.names = self
            .light
            .members()
            .into_iter()
            .map(|(member, value)| (format!("{}.{}", prefix, member), value))
            .collect();
        self.position_name = format!("{}.position", prefix);
        self.direction_name = format!("{}.direction", prefix);
    }

    /// Writes the light into the bound program, with the anchor's world pose
    pub fn apply_data(&self, backend: &mut dyn RenderBackend, program: &ShaderProgram, transforms: &TransformArena) {
        for (name, value) in &self.names {
            backend.set_uniform(program.location(name), *value);
        }
        backend.set_vec3(program.location(&self.position_name), transforms.world_position(self.anchor));
        backend.set_vec3(program.location(&self.direction_name), transforms.world_forward(self.anchor));
    }
}
