//! # Scene controller
//!
//! Owns the diorama and runs one frame at a time:
//!
//! 1. held keys move the camera
//! 2. lights are written into the main program, then the camera sinks (once
//!    fly mode is switched off), is clamped into the scene bounds and pushed out of the
//!    sphere
//! 3. camera matrices, fog and light switches are broadcast to the main and
//!    water programs
//! 4. every object is drawn in order; boxes get their animation or alpha
//!    first, the cube map gets a translation-free view, water uses the water
//!    program
//! 5. a pending pick redraws everything into the stencil buffer and reads
//!    one pixel back
//! 6. the highlighted object is drawn again with the white program

use std::path::PathBuf;
use std::rc::Rc;

use cgmath::{Matrix4, Rad, Vector3, Zero};
use log::{debug, info, warn};

use crate::gfx::backend::RenderBackend;
use crate::gfx::camera::camera_utils::strip_translation;
use crate::gfx::camera::CameraRig;
use crate::gfx::picking::{resolve_stencil, stencil_reference, PickingState, SelectionState, MAX_PICKABLE};
use crate::gfx::resources::light::LightObject;
use crate::gfx::shader::{ShaderProgram, ShaderSet};
use crate::input::{HeldKeys, Key, MouseButton};

use super::fog::FogOscillator;
use super::layout::*;
use super::objects::{BoxPayload, BoxType, CatShared, FireShared, SphereShared};
use super::render_object::{RenderContext, RenderObject, Renderable};
use super::transform::{TransformArena, TransformId};

/// Per-kind state shared between instances and the controller
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    pub sphere: Rc<SphereShared>,
    pub fire: Rc<FireShared>,
    pub cat: Rc<CatShared>,
}

pub struct SceneController {
    pub transforms: TransformArena,
    pub objects: Vec<RenderObject>,
    pub lights: Vec<LightObject>,
    pub rig: CameraRig,
    pub shaders: ShaderSet,
    pub shared: SharedState,
    pub fog: FogOscillator,
    pub flash_light: bool,
    pub fly_mode: bool,
    /// Transform the camera collides with
    pub obstacle: Option<TransformId>,
    shader_dir: PathBuf,
    fov: f32,
    viewport: (u32, u32),
    held: HeldKeys,
    picking: PickingState,
}

impl SceneController {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        transforms: TransformArena,
        objects: Vec<RenderObject>,
        lights: Vec<LightObject>,
        rig: CameraRig,
        shaders: ShaderSet,
        shared: SharedState,
        shader_dir: PathBuf,
        fov: f32,
    ) -> Self {
        if objects.len() > MAX_PICKABLE {
            warn!(
                "{} objects in the scene; only the first {} can be picked",
                objects.len(),
                MAX_PICKABLE
            );
        }
        Self {
            transforms,
            objects,
            lights,
            rig,
            shaders,
            shared,
            fog: FogOscillator::default(),
            flash_light: false,
            fly_mode: true,
            obstacle: None,
            shader_dir,
            fov,
            viewport: (1, 1),
            held: HeldKeys::default(),
            picking: PickingState::new(),
        }
    }

    pub fn selection(&self) -> SelectionState {
        self.picking.state()
    }

    pub fn is_mouse_looking(&self) -> bool {
        self.rig.is_mouse_looking()
    }

    /// Updates the projection for a new surface size
    pub fn on_resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.viewport = (width, height);
        self.rig.camera.set_projection(width as f32 / height as f32, self.fov);
    }

    pub fn on_key(&mut self, backend: &mut dyn RenderBackend, key: Key, pressed: bool) {
        let fresh = self.held.update(key, pressed);
        if key == Key::Shift {
            self.rig.set_fast(pressed);
        }
        if !fresh {
            return;
        }

        match key {
            Key::R => self.reload_shaders(backend),
            Key::G if self.held.is_held(Key::Control) => {
                self.fog.toggle();
                info!("Fog switched");
            }
            Key::V => {
                self.fly_mode = !self.fly_mode;
                info!("Fly mode switched");
            }
            Key::F => {
                self.flash_light = !self.flash_light;
                info!("Flashlight switched");
            }
            Key::Left => self.rig.cycle_previous(&mut self.transforms),
            Key::Right => self.rig.cycle_next(&mut self.transforms),
            _ => {
                if let Some(preset) = key.camera_preset() {
                    self.rig.select(&mut self.transforms, preset);
                }
            }
        }
    }

    /// Left toggles mouse look, right queues a pick under the cursor
    ///
    /// `cursor` has a top-left origin in physical pixels.
    pub fn on_mouse_button(&mut self, button: MouseButton, pressed: bool, cursor: (f64, f64)) {
        if !pressed {
            return;
        }
        match button {
            MouseButton::Left => {
                let looking = self.rig.is_dynamic() && !self.rig.is_mouse_looking();
                self.rig.set_mouse_looking(looking);
            }
            MouseButton::Right => {
                if self.rig.is_mouse_looking() {
                    return;
                }
                let (width, height) = self.viewport;
                let x = cursor.0.max(0.0) as u32;
                let y = cursor.1.max(0.0) as u32;
                if x >= width || y >= height {
                    return;
                }
                self.picking.request(x, height - 1 - y);
            }
        }
    }

    /// Raw mouse motion, applied only while mouse look is on
    pub fn on_mouse_motion(&mut self, dx: f64, dy: f64) {
        self.rig.look(&mut self.transforms, dx as f32, dy as f32);
    }

    /// Forgets held keys, e.g. when the window loses focus
    pub fn release_keys(&mut self) {
        self.held.clear();
        self.rig.set_fast(false);
    }

    pub fn reload_shaders(&mut self, backend: &mut dyn RenderBackend) {
        self.shaders.reload(backend, &self.shader_dir);
        info!("Shaders reloaded");
    }

    /// Runs one frame and presents it
    pub fn frame(&mut self, backend: &mut dyn RenderBackend, elapsed: f32) {
        self.update_movement();
        self.apply_light_and_camera(backend);
        self.apply_shader_data(backend);
        self.render_scene_objects(backend, elapsed);

        if let Some((x, y)) = self.picking.take_request() {
            self.do_picking(backend, elapsed, x, y);
        }
        self.render_highlight(backend, elapsed);

        backend.present();
    }

    fn update_movement(&mut self) {
        let movements: Vec<_> = self.held.movements().collect();
        for direction in movements {
            self.rig.move_camera(&mut self.transforms, direction);
        }
    }

    fn view_matrix(&self) -> Matrix4<f32> {
        self.rig.camera.view_matrix(&self.transforms)
    }

    fn apply_light_and_camera(&mut self, backend: &mut dyn RenderBackend) {
        let main = &self.shaders.main;
        main.bind(backend);
        for light in &self.lights {
            light.apply_data(backend, main, &self.transforms);
        }

        if !self.fly_mode {
            self.transforms.get_mut(self.rig.active()).position.y -= GRAVITY_STEP;
        }

        let (obstacle, radius) = match self.obstacle {
            Some(id) => (self.transforms.get(id).position, COLLISION_DISTANCE),
            None => (Vector3::zero(), 0.0),
        };
        self.rig
            .constrain(&mut self.transforms, (BOUNDS_MIN, BOUNDS_MAX), obstacle, radius);
    }

    fn apply_shader_data(&mut self, backend: &mut dyn RenderBackend) {
        let view = self.view_matrix();
        let projection = self.rig.camera.projection_matrix();
        self.fog.advance();
        let fog_color = self.fog.color();

        let main = &self.shaders.main;
        let u = &main.uniforms;
        main.bind(backend);
        backend.set_mat4(u.view, view);
        backend.set_mat4(u.projection, projection);
        backend.set_vec3(u.view_position, self.transforms.world_position(self.rig.active()));
        backend.set_int(u.light_count, self.lights.len() as i32);
        backend.set_bool(u.use_flash_light, self.flash_light);
        backend.set_bool(u.use_fire_light, self.shared.fire.point_light.get());
        backend.set_int(u.fire_light_index, FIRE_LIGHT_INDEX as i32);
        backend.set_bool(u.use_cube_map, false);
        backend.set_bool(u.use_fog, self.fog.enabled);
        backend.set_vec3(u.fog_color, fog_color);
        backend.set_float(u.fog_start, self.fog.start);
        backend.set_float(u.fog_end, self.fog.end);

        let water = &self.shaders.water;
        let u = &water.uniforms;
        water.bind(backend);
        backend.set_vec2(u.scroll_speed, WATER_SCROLL);
        backend.set_float(u.alpha, WATER_ALPHA);
        backend.set_mat4(u.view, view);
        backend.set_mat4(u.projection, projection);
        backend.set_bool(u.use_fog, self.fog.enabled);
        backend.set_vec3(u.fog_color, fog_color);
        backend.set_float(u.fog_start, self.fog.start);
        backend.set_float(u.fog_end, self.fog.end);
    }

    fn render_scene_objects(&mut self, backend: &mut dyn RenderBackend, elapsed: f32) {
        let view = self.view_matrix();
        let main = &self.shaders.main;
        let water = &self.shaders.water;
        let mut ctx = RenderContext {
            backend,
            transforms: &mut self.transforms,
            elapsed,
        };

        for object in &self.objects {
            match &object.renderable {
                Renderable::Box(payload) => {
                    main.bind(ctx.backend);
                    ctx.backend.set_mat4(main.uniforms.view, view);
                    apply_box_settings(&mut ctx, main, object.transform, payload);
                    object.render(&mut ctx, main);
                }
                Renderable::CubeMap(_) => {
                    main.bind(ctx.backend);
                    ctx.backend.set_mat4(main.uniforms.view, strip_translation(view));
                    object.render(&mut ctx, main);
                    ctx.backend.set_mat4(main.uniforms.view, view);
                }
                Renderable::Water(_) => object.render(&mut ctx, water),
                _ => object.render(&mut ctx, main),
            }
        }
    }

    /// Draws every object into the stencil buffer and resolves the pixel under `(x, y)`
    fn do_picking(&mut self, backend: &mut dyn RenderBackend, elapsed: f32, x: u32, y: u32) {
        backend.begin_picking_pass();
        backend.set_depth_write(true);
        backend.set_stencil_write(true);
        {
            let main = &self.shaders.main;
            let mut ctx = RenderContext {
                backend: &mut *backend,
                transforms: &mut self.transforms,
                elapsed,
            };
            for (index, object) in self.objects.iter().enumerate() {
                ctx.backend.set_stencil_reference(stencil_reference(index));
                object.render(&mut ctx, main);
            }
        }
        let value = backend.read_stencil_pixel(x, y);
        backend.set_stencil_reference(0);
        debug!("stencilIdx: {:?}", resolve_stencil(value));

        let picked = match resolve_stencil(value) {
            Some(index) => match self.objects.get_mut(index) {
                Some(object) => {
                    if object.toggle_interaction() {
                        None
                    } else {
                        Some(index)
                    }
                }
                None => None,
            },
            None => None,
        };
        self.picking.set_picked(picked);
    }

    fn render_highlight(&mut self, backend: &mut dyn RenderBackend, elapsed: f32) {
        let Some(index) = self.picking.highlight_target() else {
            return;
        };
        let view = self.view_matrix();
        let white = &self.shaders.white;
        white.bind(backend);
        backend.set_mat4(white.uniforms.view, view);
        backend.set_mat4(white.uniforms.projection, self.rig.camera.projection_matrix());

        if let Some(object) = self.objects.get(index) {
            let mut ctx = RenderContext {
                backend: &mut *backend,
                transforms: &mut self.transforms,
                elapsed,
            };
            object.render(&mut ctx, white);
        }
        self.shaders.main.bind(backend);
    }
}

/// Per-frame animation of the spinning boxes and alpha of the translucent ones
fn apply_box_settings(ctx: &mut RenderContext, main: &ShaderProgram, transform: TransformId, payload: &BoxPayload) {
    match payload.box_type {
        BoxType::BigT => {
            if payload.animated {
                let (radius_x, radius_z) = BOX_CIRCLE_RADII;
                ctx.transforms
                    .get_mut(transform)
                    .update_circle_position(radius_x, radius_z);
            }
        }
        BoxType::MidT | BoxType::SmlT => {
            if let Some((axis, angle)) = payload.box_type.spin().filter(|_| payload.animated) {
                ctx.transforms.get_mut(transform).rotate_local(axis, Rad::from(angle));
            }
        }
        BoxType::BigA | BoxType::MidA | BoxType::SmlA => {
            if let Some(alpha) = payload.box_type.alpha() {
                ctx.backend.set_bool(main.uniforms.use_alpha, true);
                ctx.backend.set_float(main.uniforms.alpha, alpha);
            }
        }
    }
}
