use cgmath::{perspective, ortho, Deg, EuclideanSpace, Matrix3, Matrix4, Point3, SquareMatrix};

use crate::gfx::scene::transform::{TransformArena, TransformId};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

pub const DEFAULT_NEAR: f32 = 0.1;
pub const DEFAULT_FAR: f32 = 100.0;
pub const DEFAULT_FOV: f32 = 35.0;
pub const DEFAULT_SPEED_H: f32 = 0.05;
pub const DEFAULT_SPEED_V: f32 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Perspective,
    Orthographic,
}

/// View and projection source linked to one transform
#[derive(Debug, Clone)]
pub struct Camera {
    pub projection_kind: Projection,
    pub near: f32,
    pub far: f32,
    pub speed_horizontal: f32,
    pub speed_vertical: f32,
    transform: Option<TransformId>,
    projection: Matrix4<f32>,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Projection::Perspective, DEFAULT_NEAR, DEFAULT_FAR)
    }
}

impl Camera {
    pub fn new(projection_kind: Projection, near: f32, far: f32) -> Self {
        Self {
            projection_kind,
            near,
            far,
            speed_horizontal: DEFAULT_SPEED_H,
            speed_vertical: DEFAULT_SPEED_V,
            transform: None,
            projection: Matrix4::identity(),
        }
    }

    pub fn link(&mut self, transform: TransformId) {
        self.transform = Some(transform);
    }

    pub fn linked(&self) -> Option<TransformId> {
        self.transform
    }

    /// Rebuilds the projection; `fov_or_scale` is the vertical FOV in degrees
    /// or the orthographic half height
    pub fn set_projection(&mut self, aspect: f32, fov_or_scale: f32) {
        let projection = match self.projection_kind {
            Projection::Perspective => perspective(Deg(fov_or_scale), aspect, self.near, self.far),
            Projection::Orthographic => {
                let top = fov_or_scale;
                let right = fov_or_scale * aspect;
                ortho(-right, right, -top, top, self.near, self.far)
            }
        };
        self.projection = OPENGL_TO_WGPU_MATRIX * projection;
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection
    }

    /// Look-at matrix from the linked transform's world position, forward and up
    pub fn view_matrix(&self, transforms: &TransformArena) -> Matrix4<f32> {
        let Some(id) = self.transform else {
            return Matrix4::identity();
        };
        let position = transforms.world_position(id);
        let forward = transforms.world_forward(id);
        let up = transforms.world_up(id);
        Matrix4::look_at_rh(Point3::from_vec(position), Point3::from_vec(position + forward), up)
    }
}

/// View matrix with its translation removed, used for the skybox
pub fn strip_translation(view: Matrix4<f32>) -> Matrix4<f32> {
    let rotation = Matrix3::from_cols(view.x.truncate(), view.y.truncate(), view.z.truncate());
    Matrix4::from(rotation)
}
