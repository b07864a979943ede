//! # Transform hierarchy
//!
//! Transforms live in a [`TransformArena`] and refer to their parent by
//! [`TransformId`]. World matrices are composed on every query by walking the
//! parent chain, so re-parenting or moving an ancestor is visible on the very
//! next call. Parent chains must be acyclic; the arena does not check.
//!
//! Orientation is stored only as a quaternion. Yaw and pitch are derived from
//! the forward vector and written back through [`Transform::set_yaw_pitch`].

use cgmath::{
    Deg, InnerSpace, Matrix3, Matrix4, One, Quaternion, Rad, Rotation3, SquareMatrix, Vector3, Vector4,
    Zero,
};

pub const WORLD_UP: Vector3<f32> = Vector3::new(0.0, 1.0, 0.0);

/// Stable handle into a [`TransformArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransformId(usize);

impl TransformId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Rotation whose forward (-Z) axis points along `direction`
///
/// The result is NaN when `direction` is parallel to `up`.
pub fn look_rotation(direction: Vector3<f32>, up: Vector3<f32>) -> Quaternion<f32> {
    let forward = direction.normalize();
    let right = forward.cross(up).normalize();
    let up = right.cross(forward);
    Quaternion::from(Matrix3::from_cols(right, up, -forward))
}

/// Local position, rotation and uniform scale of a node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: f32,
    /// Baseline the circular animation moves around
    pub start_position: Vector3<f32>,
    pub last_circle_angle: f32,
    parent: Option<TransformId>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Vector3::zero())
    }
}

impl Transform {
    pub fn new(position: Vector3<f32>) -> Self {
        Self {
            position,
            rotation: Quaternion::one(),
            scale: 1.0,
            start_position: position,
            last_circle_angle: 0.0,
            parent: None,
        }
    }

    pub fn with_scale(position: Vector3<f32>, scale: f32) -> Self {
        Self {
            scale,
            ..Self::new(position)
        }
    }

    /// Transform at `position` looking along `direction`
    pub fn looking(position: Vector3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            rotation: look_rotation(direction, WORLD_UP),
            ..Self::new(position)
        }
    }

    /// Decomposes a translate * rotate * scale matrix
    ///
    /// Scale is the mean of the three axis lengths, so non-uniform scale is
    /// lost. A matrix with a collapsed axis yields the identity transform.
    pub fn from_matrix(m: &Matrix4<f32>) -> Self {
        let axes = [m.x.truncate(), m.y.truncate(), m.z.truncate()];
        let lengths = axes.map(|axis| axis.magnitude());
        if lengths.iter().any(|length| *length <= f32::EPSILON) {
            return Self::default();
        }

        let rotation = Matrix3::from_cols(axes[0] / lengths[0], axes[1] / lengths[1], axes[2] / lengths[2]);
        let position = m.w.truncate();
        Self {
            rotation: Quaternion::from(rotation).normalize(),
            scale: lengths.iter().sum::<f32>() / 3.0,
            ..Self::new(position)
        }
    }

    pub fn parent(&self) -> Option<TransformId> {
        self.parent
    }

    /// `translate(position) * rotate(rotation) * scale(scale)`
    pub fn local_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position) * Matrix4::from(self.rotation) * Matrix4::from_scale(self.scale)
    }

    pub fn forward(&self) -> Vector3<f32> {
        (self.rotation * -Vector3::unit_z()).normalize()
    }

    pub fn up(&self) -> Vector3<f32> {
        (self.rotation * Vector3::unit_y()).normalize()
    }

    pub fn right(&self) -> Vector3<f32> {
        (self.rotation * Vector3::unit_x()).normalize()
    }

    /// Points the forward axis along `direction`, keeping world up
    pub fn set_forward(&mut self, direction: Vector3<f32>) {
        self.rotation = look_rotation(direction, WORLD_UP).normalize();
    }

    /// Rotates about an axis expressed in the node's own frame
    pub fn rotate_local(&mut self, axis: Vector3<f32>, angle: Rad<f32>) {
        let local = Quaternion::from_axis_angle(axis.normalize(), angle);
        self.rotation = (self.rotation * local).normalize();
    }

    /// Yaw in degrees, measured in the XZ plane from +X towards +Z
    pub fn yaw(&self) -> f32 {
        let f = self.forward();
        Deg::from(Rad(f.z.atan2(f.x))).0
    }

    /// Pitch in degrees above the horizon
    pub fn pitch(&self) -> f32 {
        Deg::from(Rad(self.forward().y.clamp(-1.0, 1.0).asin())).0
    }

    /// Sets the orientation from yaw and pitch in degrees
    pub fn set_yaw_pitch(&mut self, yaw: f32, pitch: f32) {
        let (yaw, pitch) = (Rad::from(Deg(yaw)).0, Rad::from(Deg(pitch)).0);
        let direction = Vector3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos());
        self.rotation = look_rotation(direction, WORLD_UP);
    }

    /// Advances one step along an ellipse around the start position, facing the direction of travel
    pub fn update_circle_position(&mut self, radius_x: f32, radius_z: f32) {
        self.last_circle_angle -= 0.01;
        let angle = self.last_circle_angle;

        let offset = Vector3::new(radius_x * angle.cos(), 0.0, radius_z * angle.sin());
        let direction = Vector3::new(-radius_x * angle.sin(), 0.0, radius_z * angle.cos());

        self.position = self.start_position + offset;
        self.rotation = look_rotation(direction, WORLD_UP);
    }
}

/// Owns every transform of a scene
#[derive(Debug, Clone, Default)]
pub struct TransformArena {
    nodes: Vec<Transform>,
}

impl TransformArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, transform: Transform) -> TransformId {
        self.nodes.push(transform);
        TransformId(self.nodes.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: TransformId) -> &Transform {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: TransformId) -> &mut Transform {
        &mut self.nodes[id.0]
    }

    pub fn set_parent(&mut self, id: TransformId, parent: Option<TransformId>) {
        self.nodes[id.0].parent = parent;
    }

    /// Overwrites `dst` with a value copy of `src`, parent link included
    pub fn copy(&mut self, src: TransformId, dst: TransformId) {
        self.nodes[dst.0] = self.nodes[src.0];
    }

    /// Parent world matrix times local matrix, composed up to the root
    pub fn world_matrix(&self, id: TransformId) -> Matrix4<f32> {
        let node = &self.nodes[id.0];
        match node.parent {
            Some(parent) => self.world_matrix(parent) * node.local_matrix(),
            None => node.local_matrix(),
        }
    }

    pub fn inverse_world_matrix(&self, id: TransformId) -> Matrix4<f32> {
        self.world_matrix(id).invert().unwrap_or_else(Matrix4::identity)
    }

    pub fn world_position(&self, id: TransformId) -> Vector3<f32> {
        (self.world_matrix(id) * Vector4::new(0.0, 0.0, 0.0, 1.0)).truncate()
    }

    pub fn world_forward(&self, id: TransformId) -> Vector3<f32> {
        (self.world_matrix(id) * Vector4::new(0.0, 0.0, -1.0, 0.0))
            .truncate()
            .normalize()
    }

    pub fn world_up(&self, id: TransformId) -> Vector3<f32> {
        (self.world_matrix(id) * Vector4::new(0.0, 1.0, 0.0, 0.0))
            .truncate()
            .normalize()
    }

    /// Position relative to the parent frame of a world-space point
    pub fn to_parent_space(&self, id: TransformId, world: Vector3<f32>) -> Vector3<f32> {
        match self.nodes[id.0].parent {
            Some(parent) => (self.inverse_world_matrix(parent) * world.extend(1.0)).truncate(),
            None => world,
        }
    }

    /// Moves a node so that its world position becomes `world`
    pub fn set_world_position(&mut self, id: TransformId, world: Vector3<f32>) {
        let local = self.to_parent_space(id, world);
        self.nodes[id.0].position = local;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn chain(arena: &mut TransformArena) -> Vec<TransformId> {
        let mut root = Transform::with_scale(Vector3::new(-7.0, 3.2, 1.5), 1.0);
        root.rotate_local(Vector3::unit_y(), Deg(30.0).into());
        let mut mid = Transform::with_scale(Vector3::new(0.0, 0.8, 0.0), 0.6);
        mid.rotate_local(Vector3::unit_x(), Deg(-12.0).into());
        let leaf = Transform::with_scale(Vector3::new(0.64, 0.0, 0.0), 0.3);

        let root = arena.insert(root);
        let mid = arena.insert(mid);
        let leaf = arena.insert(leaf);
        arena.set_parent(mid, Some(root));
        arena.set_parent(leaf, Some(mid));
        vec![root, mid, leaf]
    }

    #[test]
    fn test_world_matrix_is_left_fold_of_locals() {
        let mut arena = TransformArena::new();
        let ids = chain(&mut arena);

        let expected = ids
            .iter()
            .fold(Matrix4::identity(), |acc, id| acc * arena.get(*id).local_matrix());

        assert_relative_eq!(arena.world_matrix(ids[2]), expected, epsilon = 1e-5);
    }

    #[test]
    fn test_reparenting_is_visible_immediately() {
        let mut arena = TransformArena::new();
        let a = arena.insert(Transform::new(Vector3::new(1.0, 0.0, 0.0)));
        let b = arena.insert(Transform::new(Vector3::new(0.0, 5.0, 0.0)));
        let child = arena.insert(Transform::new(Vector3::new(0.0, 0.0, 2.0)));

        arena.set_parent(child, Some(a));
        assert_relative_eq!(arena.world_position(child), Vector3::new(1.0, 0.0, 2.0));

        arena.set_parent(child, Some(b));
        assert_relative_eq!(arena.world_position(child), Vector3::new(0.0, 5.0, 2.0));

        arena.get_mut(b).position.y = -1.0;
        assert_relative_eq!(arena.world_position(child), Vector3::new(0.0, -1.0, 2.0));
    }

    #[test]
    fn test_from_matrix_round_trips_uniform_scale() {
        let rotation = Quaternion::from_axis_angle(Vector3::new(1.0, 2.0, 0.5).normalize(), Deg(40.0));
        let m = Matrix4::from_translation(Vector3::new(3.0, -2.0, 0.5))
            * Matrix4::from(rotation)
            * Matrix4::from_scale(2.5);

        let t = Transform::from_matrix(&m);

        assert_relative_eq!(t.scale, 2.5, epsilon = 1e-5);
        assert_relative_eq!(t.local_matrix(), m, epsilon = 1e-4);
    }

    #[test]
    fn test_from_matrix_with_collapsed_axis_is_identity() {
        let t = Transform::from_matrix(&Matrix4::from_nonuniform_scale(1.0, 0.0, 1.0));
        assert_eq!(t, Transform::default());
    }

    #[test]
    fn test_forward_parallel_to_up_is_nan() {
        let t = Transform::looking(Vector3::zero(), Vector3::unit_y());
        assert!(t.rotation.s.is_nan() || t.rotation.v.x.is_nan());
    }

    #[test]
    fn test_looking_points_forward_along_direction() {
        let direction = Vector3::new(1.0, -0.5, 1.0);
        let t = Transform::looking(Vector3::zero(), direction);
        assert_relative_eq!(t.forward(), direction.normalize(), epsilon = 1e-5);
        assert_relative_eq!(t.right().y, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_yaw_pitch_are_derived_from_rotation() {
        let mut t = Transform::looking(Vector3::zero(), Vector3::new(0.0, 0.0, -1.0));
        assert_relative_eq!(t.yaw(), -90.0, epsilon = 1e-3);
        assert_relative_eq!(t.pitch(), 0.0, epsilon = 1e-3);

        t.set_yaw_pitch(-60.0, 25.0);
        assert_relative_eq!(t.yaw(), -60.0, epsilon = 1e-3);
        assert_relative_eq!(t.pitch(), 25.0, epsilon = 1e-3);
    }

    #[test]
    fn test_circle_motion_orbits_start_position() {
        let start = Vector3::new(1.1, 4.2, 0.6);
        let mut t = Transform::with_scale(start, 0.01);

        t.update_circle_position(0.5, 1.0);

        let angle = -0.01f32;
        assert_relative_eq!(t.last_circle_angle, angle);
        assert_relative_eq!(
            t.position,
            start + Vector3::new(0.5 * angle.cos(), 0.0, angle.sin()),
            epsilon = 1e-6
        );
        let travel = Vector3::new(-0.5 * angle.sin(), 0.0, angle.cos()).normalize();
        assert_relative_eq!(t.forward(), travel, epsilon = 1e-5);
    }

    #[test]
    fn test_copy_keeps_value_semantics() {
        let mut arena = TransformArena::new();
        let parent = arena.insert(Transform::new(Vector3::new(0.0, 2.0, 0.0)));
        let preset = arena.insert(Transform::new(Vector3::new(0.0, 7.0, -3.0)));
        let active = arena.insert(Transform::default());
        arena.set_parent(preset, Some(parent));

        arena.copy(preset, active);
        arena.get_mut(active).position.x = 4.0;

        assert_eq!(arena.get(active).parent(), Some(parent));
        assert_relative_eq!(arena.get(preset).position.x, 0.0);
        assert_relative_eq!(arena.world_position(active), Vector3::new(4.0, 9.0, -3.0));
    }

    #[test]
    fn test_set_world_position_respects_parent() {
        let mut arena = TransformArena::new();
        let parent = arena.insert(Transform::with_scale(Vector3::new(1.0, 1.0, 1.0), 2.0));
        let child = arena.insert(Transform::default());
        arena.set_parent(child, Some(parent));

        arena.set_world_position(child, Vector3::new(3.0, 1.0, 1.0));

        assert_relative_eq!(arena.get(child).position, Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(arena.world_position(child), Vector3::new(3.0, 1.0, 1.0), epsilon = 1e-5);
    }
}
