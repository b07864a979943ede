//! # Render objects
//!
//! A [`RenderObject`] pairs a transform with exactly one [`Renderable`]
//! payload. [`RenderObject::render`] dispatches on the payload kind; every
//! routine binds the program it is given, writes its model matrix and kind
//! flags, draws, and then puts back every shared flag it changed so the
//! next draw with the same program starts from the defaults.

use log::info;

use crate::gfx::backend::RenderBackend;
use crate::gfx::shader::{ShaderKind, ShaderProgram, SLOT_CUBE, SLOT_DIFFUSE, SLOT_FIRE, SLOT_SPECULAR};

use super::layout::CAT_CIRCLE_RADII;
use super::objects::*;
use super::transform::{TransformArena, TransformId};

/// Everything a render routine touches besides its own payload
pub struct RenderContext<'a> {
    pub backend: &'a mut dyn RenderBackend,
    pub transforms: &'a mut TransformArena,
    /// Seconds since the viewer started
    pub elapsed: f32,
}

/// Discriminant of [`Renderable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderKind {
    Mesh,
    Box,
    Sphere,
    CubeMap,
    Water,
    Fire,
    Cat,
}

#[derive(Debug, Clone)]
pub enum Renderable {
    Mesh(MeshRenderer),
    Box(BoxPayload),
    Sphere(SpherePayload),
    CubeMap(CubeMapPayload),
    Water(WaterPayload),
    Fire(FirePayload),
    Cat(CatPayload),
}

impl Renderable {
    pub fn kind(&self) -> RenderKind {
        match self {
            Renderable::Mesh(_) => RenderKind::Mesh,
            Renderable::Box(_) => RenderKind::Box,
            Renderable::Sphere(_) => RenderKind::Sphere,
            Renderable::CubeMap(_) => RenderKind::CubeMap,
            Renderable::Water(_) => RenderKind::Water,
            Renderable::Fire(_) => RenderKind::Fire,
            Renderable::Cat(_) => RenderKind::Cat,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderObject {
    pub transform: TransformId,
    pub renderable: Renderable,
}

impl RenderObject {
    pub fn new(transform: TransformId, renderable: Renderable) -> Self {
        Self { transform, renderable }
    }

    pub fn kind(&self) -> RenderKind {
        self.renderable.kind()
    }

    /// Draws the object with `program`
    pub fn render(&self, ctx: &mut RenderContext, program: &ShaderProgram) {
        match &self.renderable {
            Renderable::Mesh(mesh) => self.render_mesh(ctx, program, mesh),
            Renderable::Box(payload) => self.render_box(ctx, program, payload),
            Renderable::Sphere(sphere) => self.render_sphere(ctx, program, sphere),
            Renderable::CubeMap(cube_map) => self.render_cube_map(ctx, program, cube_map),
            Renderable::Water(water) => self.render_water(ctx, program, water),
            Renderable::Fire(fire) => self.render_fire(ctx, program, fire),
            Renderable::Cat(cat) => self.render_cat(ctx, program, cat),
        }
    }

    /// Flips the interaction flag of a picked object
    ///
    /// Returns false for kinds without one (meshes, the cube map, water);
    /// those stay highlighted instead.
    pub fn toggle_interaction(&mut self) -> bool {
        match &mut self.renderable {
            Renderable::Cat(cat) => {
                info!("Cat selected.");
                cat.shared.moving.set(!cat.shared.moving.get());
            }
            Renderable::Box(payload) => {
                info!("Box selected.");
                payload.animated = !payload.animated;
            }
            Renderable::Fire(fire) => {
                info!("Fire selected.");
                fire.shared.point_light.set(!fire.shared.point_light.get());
            }
            Renderable::Sphere(sphere) => {
                info!("Sphere selected.");
                sphere.shared.morphing.set(!sphere.shared.morphing.get());
            }
            Renderable::Mesh(_) | Renderable::CubeMap(_) | Renderable::Water(_) => return false,
        }
        true
    }

    fn set_model(&self, ctx: &mut RenderContext, program: &ShaderProgram) {
        let model = ctx.transforms.world_matrix(self.transform);
        ctx.backend.set_mat4(program.uniforms.model, model);
    }

    fn render_mesh(&self, ctx: &mut RenderContext, program: &ShaderProgram, mesh: &MeshRenderer) {
        program.bind(ctx.backend);
        if program.kind() == ShaderKind::Main {
            mesh.material.apply(ctx.backend, program);
        }
        self.set_model(ctx, program);
        ctx.backend.draw(mesh.geometry);
    }

    fn render_box(&self, ctx: &mut RenderContext, program: &ShaderProgram, payload: &BoxPayload) {
        let u = &program.uniforms;
        program.bind(ctx.backend);
        ctx.backend.bind_texture(SLOT_DIFFUSE, payload.shared.diffuse);
        ctx.backend.bind_texture(SLOT_SPECULAR, payload.shared.specular);
        ctx.backend.set_bool(u.use_texture, true);
        self.set_model(ctx, program);

        ctx.backend.draw(payload.shared.geometry);

        ctx.backend.set_bool(u.use_alpha, false);
        ctx.backend.set_float(u.alpha, 1.0);
        ctx.backend.set_bool(u.use_texture, false);
    }

    fn render_sphere(&self, ctx: &mut RenderContext, program: &ShaderProgram, sphere: &SpherePayload) {
        let u = &program.uniforms;
        program.bind(ctx.backend);
        self.set_model(ctx, program);
        ctx.backend.set_bool(u.use_texture, true);
        ctx.backend.set_bool(u.use_to_sphere, true);
        ctx.backend.set_float(u.alpha_to_sphere, sphere.shared.morph_amount());
        ctx.backend.bind_texture(SLOT_DIFFUSE, sphere.diffuse);
        ctx.backend.bind_texture(SLOT_SPECULAR, sphere.specular);

        ctx.backend.draw(sphere.geometry);

        ctx.backend.set_bool(u.use_texture, false);
        ctx.backend.set_bool(u.use_to_sphere, false);
    }

    fn render_cube_map(&self, ctx: &mut RenderContext, program: &ShaderProgram, cube_map: &CubeMapPayload) {
        let u = &program.uniforms;
        program.bind(ctx.backend);
        ctx.backend.set_bool(u.use_cube_map, true);
        ctx.backend.set_bool(u.use_texture, true);
        self.set_model(ctx, program);
        ctx.backend.set_depth_write(false);
        ctx.backend.set_stencil_write(false);
        ctx.backend.bind_texture(SLOT_CUBE, cube_map.texture);

        ctx.backend.draw(cube_map.geometry);

        ctx.backend.set_bool(u.use_cube_map, false);
        ctx.backend.set_bool(u.use_texture, false);
        ctx.backend.set_depth_write(true);
        ctx.backend.set_stencil_write(true);
    }

    fn render_water(&self, ctx: &mut RenderContext, program: &ShaderProgram, water: &WaterPayload) {
        program.bind(ctx.backend);
        ctx.backend.set_float(program.uniforms.time, ctx.elapsed);
        self.set_model(ctx, program);
        ctx.backend.set_depth_write(false);
        ctx.backend.set_stencil_write(false);
        ctx.backend.bind_texture(SLOT_CUBE, water.texture);

        ctx.backend.draw(water.geometry);

        ctx.backend.set_depth_write(true);
        ctx.backend.set_stencil_write(true);
    }

    fn render_fire(&self, ctx: &mut RenderContext, program: &ShaderProgram, fire: &FirePayload) {
        let u = &program.uniforms;
        program.bind(ctx.backend);
        self.set_model(ctx, program);
        ctx.backend.set_bool(u.use_fire, true);
        ctx.backend.set_int(u.frame, fire.frame(ctx.elapsed) as i32);
        ctx.backend.set_int(u.fire_cols, fire.columns as i32);
        ctx.backend.set_int(u.fire_rows, fire.rows as i32);
        ctx.backend.bind_texture(SLOT_FIRE, fire.texture);

        ctx.backend.draw(fire.geometry);

        ctx.backend.set_bool(u.use_fire, false);
    }

    fn render_cat(&self, ctx: &mut RenderContext, program: &ShaderProgram, cat: &CatPayload) {
        program.bind(ctx.backend);
        if cat.shared.moving.get() {
            let (radius_x, radius_z) = CAT_CIRCLE_RADII;
            ctx.transforms
                .get_mut(self.transform)
                .update_circle_position(radius_x, radius_z);
        }
        self.set_model(ctx, program);
        ctx.backend.set_bool(program.uniforms.use_texture, false);
        if program.kind() == ShaderKind::Main {
            cat.material.apply(ctx.backend, program);
        }

        ctx.backend.draw(cat.geometry);
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use cgmath::{Matrix4, Vector3};

    use super::*;
    use crate::gfx::backend::recording::RecordingBackend;
    use crate::gfx::backend::{GeometryId, TextureId};
    use crate::gfx::resources::material::Material;
    use crate::gfx::scene::transform::Transform;
    use crate::gfx::shader::UniformValue;

    struct Fixture {
        backend: RecordingBackend,
        transforms: TransformArena,
        main: ShaderProgram,
        water: ShaderProgram,
    }

    impl Fixture {
        fn new() -> Self {
            let mut backend = RecordingBackend::new();
            let main = ShaderProgram::load(&mut backend, ShaderKind::Main, Ok(String::new()));
            let water = ShaderProgram::load(&mut backend, ShaderKind::Water, Ok(String::new()));
            Self {
                backend,
                transforms: TransformArena::new(),
                main,
                water,
            }
        }

        fn object(&mut self, renderable: Renderable) -> RenderObject {
            let transform = self.transforms.insert(Transform::new(Vector3::new(1.0, 2.0, 3.0)));
            RenderObject::new(transform, renderable)
        }

        fn render(&mut self, object: &RenderObject, elapsed: f32) {
            let mut ctx = RenderContext {
                backend: &mut self.backend,
                transforms: &mut self.transforms,
                elapsed,
            };
            object.render(&mut ctx, &self.main);
        }
    }

    fn boxed(box_type: BoxType) -> Renderable {
        Renderable::Box(BoxPayload::new(
            box_type,
            Rc::new(BoxShared {
                geometry: GeometryId(0),
                diffuse: Some(TextureId(0)),
                specular: Some(TextureId(1)),
            }),
        ))
    }

    fn cube_map() -> Renderable {
        Renderable::CubeMap(CubeMapPayload {
            geometry: GeometryId(1),
            texture: Some(TextureId(2)),
        })
    }

    #[test]
    fn test_box_resets_alpha_for_the_next_draw() {
        let mut f = Fixture::new();
        let first = f.object(boxed(BoxType::BigA));
        let second = f.object(boxed(BoxType::BigT));

        f.main.bind(&mut f.backend);
        f.backend.set_bool(f.main.uniforms.use_alpha, true);
        f.backend.set_float(f.main.uniforms.alpha, 0.2);
        f.render(&first, 0.0);
        f.render(&second, 0.0);

        let draws: Vec<_> = f.backend.main_draws().collect();
        assert_eq!(draws[0].int("useAlpha"), Some(1));
        assert_eq!(draws[0].float("alpha"), Some(0.2));
        assert_eq!(draws[0].int("useTexture"), Some(1));
        assert_eq!(draws[0].textures[SLOT_DIFFUSE], Some(TextureId(0)));
        assert_eq!(draws[1].int("useAlpha"), Some(0));
        assert_eq!(draws[1].float("alpha"), Some(1.0));
    }

    #[test]
    fn test_cube_map_flag_and_depth_do_not_leak() {
        let mut f = Fixture::new();
        let sky = f.object(cube_map());
        let next = f.object(boxed(BoxType::MidT));

        f.render(&sky, 0.0);
        f.render(&next, 0.0);

        let draws: Vec<_> = f.backend.main_draws().collect();
        assert_eq!(draws[0].int("useCubeMap"), Some(1));
        assert!(!draws[0].depth_write);
        assert!(!draws[0].stencil_write);
        assert_eq!(draws[0].textures[SLOT_CUBE], Some(TextureId(2)));
        assert_eq!(draws[1].int("useCubeMap"), Some(0));
        assert!(draws[1].depth_write);
        assert!(draws[1].stencil_write);
    }

    #[test]
    fn test_fire_sets_frame_and_clears_flag() {
        let mut f = Fixture::new();
        let fire = f.object(Renderable::Fire(FirePayload {
            geometry: GeometryId(2),
            texture: Some(TextureId(3)),
            columns: 14,
            rows: 1,
            frame_duration: 0.2,
            shared: Rc::new(FireShared::default()),
        }));

        f.render(&fire, 1.0);

        let draw = f.backend.main_draws().next().unwrap();
        assert_eq!(draw.int("useFire"), Some(1));
        assert_eq!(draw.int("frame"), Some(5));
        assert_eq!(draw.int("fireCols"), Some(14));
        assert_eq!(draw.textures[SLOT_FIRE], Some(TextureId(3)));
        assert_eq!(f.backend.uniform(f.main.id(), "useFire"), Some(UniformValue::Int(0)));
    }

    #[test]
    fn test_morphing_sphere_resets_flags_for_the_next_draw() {
        let mut f = Fixture::new();
        let shared = Rc::new(SphereShared::default());
        let sphere = f.object(Renderable::Sphere(SpherePayload {
            geometry: GeometryId(5),
            diffuse: Some(TextureId(5)),
            specular: Some(TextureId(6)),
            shared: shared.clone(),
        }));
        let next = f.object(boxed(BoxType::BigT));

        // Still spheres keep the clock where it is
        f.render(&sphere, 0.0);
        assert_eq!(shared.morph_clock.get(), 0.0);

        shared.morphing.set(true);
        f.render(&sphere, 0.0);
        f.render(&next, 0.0);

        let draws: Vec<_> = f.backend.main_draws().collect();
        assert_eq!(draws[0].float("alphaToSphere"), Some(0.0));
        assert_eq!(draws[1].int("useToSphere"), Some(1));
        assert_eq!(draws[1].int("useTexture"), Some(1));
        assert_eq!(draws[1].float("alphaToSphere"), Some(0.01f32.sin()));
        assert_eq!(draws[1].textures[SLOT_DIFFUSE], Some(TextureId(5)));
        assert_eq!(draws[1].textures[SLOT_SPECULAR], Some(TextureId(6)));
        assert_eq!(draws[2].int("useToSphere"), Some(0));
        assert_eq!(
            f.backend.uniform(f.main.id(), "useTexture"),
            Some(UniformValue::Int(0))
        );
    }

    #[test]
    fn test_model_matrix_follows_parent() {
        let mut f = Fixture::new();
        let parent = f.transforms.insert(Transform::new(Vector3::new(10.0, 0.0, 0.0)));
        let object = f.object(boxed(BoxType::MidT));
        f.transforms.set_parent(object.transform, Some(parent));

        f.render(&object, 0.0);

        let draw = f.backend.main_draws().next().unwrap();
        assert_eq!(
            draw.value("model"),
            Some(UniformValue::Mat4(Matrix4::from_translation(Vector3::new(11.0, 2.0, 3.0))))
        );
    }

    #[test]
    fn test_moving_cat_walks_each_draw() {
        let mut f = Fixture::new();
        let shared = Rc::new(CatShared::default());
        let mut cat = f.object(Renderable::Cat(CatPayload {
            geometry: GeometryId(3),
            material: Rc::new(Material::default()),
            shared: shared.clone(),
        }));
        let start = f.transforms.get(cat.transform).position;

        f.render(&cat, 0.0);
        assert_eq!(f.transforms.get(cat.transform).position, start);

        assert!(cat.toggle_interaction());
        assert!(shared.moving.get());
        f.render(&cat, 0.0);
        assert_ne!(f.transforms.get(cat.transform).position, start);
        assert_eq!(
            f.backend.uniform(f.main.id(), "material.shininess"),
            Some(UniformValue::Float(32.0))
        );
    }

    #[test]
    fn test_water_draws_with_its_own_program() {
        let mut f = Fixture::new();
        let water = f.object(Renderable::Water(WaterPayload {
            geometry: GeometryId(4),
            texture: Some(TextureId(4)),
        }));

        let mut ctx = RenderContext {
            backend: &mut f.backend,
            transforms: &mut f.transforms,
            elapsed: 2.5,
        };
        water.render(&mut ctx, &f.water);

        let draw = f.backend.main_draws().next().unwrap();
        assert_eq!(draw.kind, ShaderKind::Water);
        assert_eq!(draw.float("time"), Some(2.5));
        assert!(!draw.depth_write);
        assert!(f.backend.main_draws().all(|d| d.program == f.water.id()));
    }

    #[test]
    fn test_only_interactive_kinds_toggle() {
        let mut f = Fixture::new();
        let mut sky = f.object(cube_map());
        let mut cube = f.object(boxed(BoxType::SmlT));

        assert!(!sky.toggle_interaction());
        assert!(cube.toggle_interaction());
        let Renderable::Box(payload) = &cube.renderable else {
            panic!("not a box");
        };
        assert!(payload.animated);
    }
}
