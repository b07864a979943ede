use cgmath::{InnerSpace, Vector3};
use log::info;

use crate::gfx::scene::transform::{Transform, TransformArena, TransformId};

use super::camera_utils::{Camera, DEFAULT_SPEED_H};

pub const MOUSE_SENSITIVITY: f32 = 0.01;
pub const PITCH_LIMIT: f32 = 89.0;

/// Index of the free-flying camera preset
pub const DYNAMIC_CAMERA: usize = 0;
pub const CAMERA_PRESETS: usize = 4;

/// Preset positions and view directions, dynamic camera first
pub const PRESET_POSES: [(Vector3<f32>, Vector3<f32>); CAMERA_PRESETS] = [
    (Vector3::new(-3.5, 5.5, 8.0), Vector3::new(0.0, 0.0, -1.0)),
    (Vector3::new(-12.0, 10.0, -10.0), Vector3::new(1.0, -0.5, 1.0)),
    (Vector3::new(-12.0, 10.0, 10.0), Vector3::new(1.0, -0.5, -1.0)),
    (Vector3::new(0.0, 7.0, -3.0), Vector3::new(0.0, 0.0, 1.0)),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Front,
    Left,
    Back,
    Right,
    Up,
    Down,
}

/// The viewer camera plus its preset poses
///
/// The camera stays linked to the `active` transform. Switching presets
/// copies the preset into `active` by value, so the link never dangles and
/// anything anchored to `active` (the flashlight) follows automatically.
#[derive(Debug, Clone)]
pub struct CameraRig {
    pub camera: Camera,
    active: TransformId,
    presets: [TransformId; CAMERA_PRESETS],
    cycle_index: usize,
    dynamic_mode: bool,
    mouse_looking: bool,
}

impl CameraRig {
    pub fn new(transforms: &mut TransformArena, mut camera: Camera) -> Self {
        let presets = PRESET_POSES.map(|(position, direction)| transforms.insert(Transform::looking(position, direction)));
        let active = transforms.insert(*transforms.get(presets[DYNAMIC_CAMERA]));
        camera.link(active);
        Self {
            camera,
            active,
            presets,
            cycle_index: DYNAMIC_CAMERA,
            dynamic_mode: true,
            mouse_looking: false,
        }
    }

    pub fn active(&self) -> TransformId {
        self.active
    }

    pub fn preset(&self, index: usize) -> Option<TransformId> {
        self.presets.get(index).copied()
    }

    /// Parents a preset to another transform, e.g. the cat camera to the cat
    pub fn attach_preset(&self, transforms: &mut TransformArena, index: usize, parent: TransformId) {
        if let Some(preset) = self.preset(index) {
            transforms.set_parent(preset, Some(parent));
        }
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic_mode
    }

    pub fn is_mouse_looking(&self) -> bool {
        self.mouse_looking
    }

    pub fn set_mouse_looking(&mut self, looking: bool) {
        self.mouse_looking = looking && self.dynamic_mode;
    }

    /// Switches to a preset
    ///
    /// The dynamic camera is rebuilt from the current world pose, so leaving
    /// a parented preset keeps the view where it was, and mouse look is
    /// enabled. Static presets disable dynamic mode.
    pub fn select(&mut self, transforms: &mut TransformArena, index: usize) {
        if index >= CAMERA_PRESETS {
            return;
        }

        if index == DYNAMIC_CAMERA {
            let position = transforms.world_position(self.active);
            let forward = transforms.world_forward(self.active);
            *transforms.get_mut(self.presets[DYNAMIC_CAMERA]) = Transform::looking(position, forward);
            self.dynamic_mode = true;
            self.mouse_looking = true;
        } else {
            self.dynamic_mode = false;
            self.mouse_looking = false;
        }

        transforms.copy(self.presets[index], self.active);
        info!("Camera {} selected", index);
    }

    /// Steps backwards through the static presets, wrapping to the last one
    pub fn cycle_previous(&mut self, transforms: &mut TransformArena) {
        self.cycle_index = match self.cycle_index {
            0 | 1 => CAMERA_PRESETS - 1,
            i => i - 1,
        };
        self.select(transforms, self.cycle_index);
    }

    /// Steps forwards through the static presets, wrapping to the first one
    pub fn cycle_next(&mut self, transforms: &mut TransformArena) {
        self.cycle_index += 1;
        if self.cycle_index >= CAMERA_PRESETS {
            self.cycle_index = 1;
        }
        self.select(transforms, self.cycle_index);
    }

    pub fn set_fast(&mut self, fast: bool) {
        self.camera.speed_horizontal = if fast { DEFAULT_SPEED_H * 2.0 } else { DEFAULT_SPEED_H };
    }

    /// Moves the active transform one step; only the dynamic camera moves
    pub fn move_camera(&mut self, transforms: &mut TransformArena, direction: MoveDirection) {
        if !self.dynamic_mode {
            return;
        }
        let horizontal = self.camera.speed_horizontal;
        let vertical = self.camera.speed_vertical;
        let transform = transforms.get_mut(self.active);
        let step = match direction {
            MoveDirection::Front => transform.forward() * horizontal,
            MoveDirection::Back => -transform.forward() * horizontal,
            MoveDirection::Left => -transform.right() * horizontal,
            MoveDirection::Right => transform.right() * horizontal,
            MoveDirection::Up => Vector3::unit_y() * vertical,
            MoveDirection::Down => -Vector3::unit_y() * vertical,
        };
        transform.position += step;
    }

    /// Applies mouse motion to yaw and pitch while mouse look is on
    pub fn look(&mut self, transforms: &mut TransformArena, dx: f32, dy: f32) {
        if !self.mouse_looking {
            return;
        }
        let transform = transforms.get_mut(self.active);
        let yaw = transform.yaw() + dx * MOUSE_SENSITIVITY;
        let pitch = (transform.pitch() - dy * MOUSE_SENSITIVITY).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        transform.set_yaw_pitch(yaw, pitch);
    }

    /// Keeps the camera inside `bounds` and outside a sphere around `obstacle`
    pub fn constrain(
        &self,
        transforms: &mut TransformArena,
        bounds: (Vector3<f32>, Vector3<f32>),
        obstacle: Vector3<f32>,
        radius: f32,
    ) {
        let transform = transforms.get_mut(self.active);
        let (min, max) = bounds;
        let p = transform.position;
        transform.position = Vector3::new(p.x.clamp(min.x, max.x), p.y.clamp(min.y, max.y), p.z.clamp(min.z, max.z));

        let offset = transform.position - obstacle;
        let distance = offset.magnitude();
        if distance < radius && distance > f32::EPSILON {
            transform.position = obstacle + offset / distance * radius;
        }
    }
}
