//! Fixed placement and tuning of the diorama's objects

use cgmath::{Vector2, Vector3};

// Cat
pub const CAT_POSITION: Vector3<f32> = Vector3::new(1.1, 4.2, 0.6);
pub const CAT_SCALE: f32 = 0.01;
pub const CAT_CIRCLE_RADII: (f32, f32) = (0.5, 1.0);
/// Camera preset riding on the cat
pub const CAT_CAMERA_PRESET: usize = 3;

// Sphere
pub const SPHERE_POSITION: Vector3<f32> = Vector3::new(-5.0, 3.5, -1.0);
pub const SPHERE_SCALE: f32 = 1.0;
pub const SPHERE_SUBDIVISIONS: u32 = 3;
pub const SPHERE_MORPH_STEP: f32 = 0.01;
pub const COLLISION_DISTANCE: f32 = 1.5;

// Fire
pub const FIRE_POSITION: Vector3<f32> = Vector3::new(-3.0, 4.5, -1.0);
pub const FIRE_COLUMNS: u32 = 14;
pub const FIRE_ROWS: u32 = 1;
pub const FIRE_FRAME_DURATION: f32 = 0.2;

// Cube map and water
pub const CUBE_MAP_SCALE: f32 = 100.0;
pub const WATER_SCALE: f32 = 1000.0;
pub const WATER_ALPHA: f32 = 0.6;
pub const WATER_SCROLL: Vector2<f32> = Vector2::new(0.01, 0.005);

// Boxes
pub const BOX_SCALE_BIG: f32 = 1.0;
pub const BOX_SCALE_MID: f32 = 0.6;
pub const BOX_SCALE_SMALL: f32 = 0.3;
pub const BOX_ALPHA_BIG: f32 = 0.2;
pub const BOX_ALPHA_MID: f32 = 0.5;
pub const BOX_ALPHA_SMALL: f32 = 0.8;

pub const BOX_BIG_T_POSITION: Vector3<f32> = Vector3::new(-7.0, 3.2, 1.5);
pub const BOX_MID_T_POSITION: Vector3<f32> = Vector3::new(0.0, 0.8, 0.0);
pub const BOX_SMALL_T_POSITION: Vector3<f32> = Vector3::new(0.64, 0.0, 0.0);
pub const BOX_BIG_A_POSITION: Vector3<f32> = Vector3::new(-5.0, 3.0, 3.0);
pub const BOX_BIG_A_DIRECTION: Vector3<f32> = Vector3::new(0.0, -0.5, 1.0);

pub const BOX_CIRCLE_RADII: (f32, f32) = (0.5, 0.5);
/// Degrees per frame
pub const BOX_MID_SPIN: f32 = -2.0;
pub const BOX_SMALL_SPIN: f32 = -1.5;

// Lights
pub const POINT_LIGHT_FIRE: Vector3<f32> = Vector3::new(-3.0, 4.5, -1.0);
pub const POINT_LIGHT_CENTER: Vector3<f32> = Vector3::new(0.0, 3.0, 0.0);
pub const DIRECT_LIGHT_DIRECTION: Vector3<f32> = Vector3::new(1.0, -1.0, 0.0);
/// Slot of the point light the fire toggles
pub const FIRE_LIGHT_INDEX: usize = 1;

// Camera limits
pub const BOUNDS_MIN: Vector3<f32> = Vector3::new(-15.0, 0.1, -15.0);
pub const BOUNDS_MAX: Vector3<f32> = Vector3::new(15.0, 15.0, 15.0);
/// Sink per frame while fly mode is off
pub const GRAVITY_STEP: f32 = 0.1;

// Fog
pub const FOG_COLOR: f32 = 0.5;
pub const FOG_STEP: f32 = 0.001;
pub const FOG_MIN: f32 = 0.2;
pub const FOG_MAX: f32 = 0.6;
pub const FOG_START: f32 = 3.0;
pub const FOG_END: f32 = 10.0;
