//! # Render backend seam
//!
//! The scene code talks to the GPU through [`RenderBackend`], a small
//! immediate-mode interface shaped after the classic bind / set-uniform /
//! draw model: a program is bound, uniforms are written into that program's
//! state, textures are bound to numbered slots and every `draw` captures the
//! current state. Flags set for one draw stay set for the next one until
//! something resets them, which is why the renderables restore the flags
//! they touch.
//!
//! [`WgpuBackend`](crate::gfx::rendering::render_engine::WgpuBackend) is the
//! production implementation. Tests use the recording backend in
//! [`recording`].

use cgmath::{Matrix3, Matrix4, Vector2, Vector3, Vector4};

use crate::error::ViewerResult;
use crate::gfx::resources::texture_resource::TextureSource;
use crate::gfx::scene::vertex::Vertex3D;
use crate::gfx::shader::{ShaderKind, UniformLocation, UniformValue};

#[cfg(test)]
pub mod recording;

/// Number of texture slots a program can sample from
pub const TEXTURE_SLOTS: usize = 4;

/// Handle to a compiled program; the zero handle is the invalid program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(u32);

impl ProgramId {
    pub const INVALID: ProgramId = ProgramId(0);

    pub fn from_index(index: usize) -> Self {
        Self(index as u32 + 1)
    }

    pub fn index(self) -> Option<usize> {
        self.0.checked_sub(1).map(|i| i as usize)
    }

    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
}

/// Handle to uploaded vertex (and optional index) data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryId(pub u32);

/// Handle to an uploaded texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Sampling dimension of a texture or of a program's texture binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Flat,
    Cube,
}

pub trait RenderBackend {
    /// Compiles a program of the given kind from preprocessed source
    fn create_program(&mut self, kind: ShaderKind, source: &str) -> ViewerResult<ProgramId>;

    fn delete_program(&mut self, program: ProgramId);

    /// Looks a uniform up by name; unknown names yield [`UniformLocation::INVALID`]
    fn uniform_location(&self, program: ProgramId, name: &str) -> UniformLocation;

    fn use_program(&mut self, program: ProgramId);

    /// Writes a value into the bound program; invalid locations are ignored
    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue);

    fn upload_geometry(&mut self, label: &str, vertices: &[Vertex3D], indices: Option<&[u32]>) -> GeometryId;

    fn upload_texture(&mut self, label: &str, source: &TextureSource) -> TextureId;

    fn upload_cube_texture(&mut self, label: &str, faces: &[TextureSource; 6]) -> TextureId;

    /// Binds a texture to a slot; `None` leaves the slot on the default texture
    fn bind_texture(&mut self, slot: usize, texture: Option<TextureId>);

    fn set_depth_write(&mut self, enabled: bool);

    fn set_stencil_write(&mut self, enabled: bool);

    /// Reference value written into the stencil buffer by picking draws
    fn set_stencil_reference(&mut self, reference: u32);

    /// Draws geometry with the current program, uniforms and textures
    fn draw(&mut self, geometry: GeometryId);

    /// Starts the picking pass: depth and stencil are cleared, colour writes
    /// are off and every draw replaces the stencil value with the reference
    fn begin_picking_pass(&mut self);

    /// Ends the picking pass and returns the stencil value at `(x, y)`
    ///
    /// Coordinates use a bottom-left origin.
    fn read_stencil_pixel(&mut self, x: u32, y: u32) -> u8;

    /// Submits the main pass, presents it and waits for the GPU to finish
    fn present(&mut self);

    fn set_int(&mut self, location: UniformLocation, value: i32) {
        self.set_uniform(location, UniformValue::Int(value));
    }

    fn set_bool(&mut self, location: UniformLocation, value: bool) {
        self.set_uniform(location, value.into());
    }

    fn set_float(&mut self, location: UniformLocation, value: f32) {
        self.set_uniform(location, UniformValue::Float(value));
    }

    fn set_vec2(&mut self, location: UniformLocation, value: Vector2<f32>) {
        self.set_uniform(location, UniformValue::Vec2(value));
    }

    fn set_vec3(&mut self, location: UniformLocation, value: Vector3<f32>) {
        self.set_uniform(location, UniformValue::Vec3(value));
    }

    fn set_vec4(&mut self, location: UniformLocation, value: Vector4<f32>) {
        self.set_uniform(location, UniformValue::Vec4(value));
    }

    fn set_mat3(&mut self, location: UniformLocation, value: Matrix3<f32>) {
        self.set_uniform(location, UniformValue::Mat3(value));
    }

    fn set_mat4(&mut self, location: UniformLocation, value: Matrix4<f32>) {
        self.set_uniform(location, UniformValue::Mat4(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_handles_reserve_zero_for_invalid() {
        assert!(!ProgramId::INVALID.is_valid());
        assert_eq!(ProgramId::INVALID.index(), None);

        let program = ProgramId::from_index(0);
        assert!(program.is_valid());
        assert_eq!(program.index(), Some(0));
    }
}
