//! Assembles the diorama from its assets
//!
//! Loading is split from assembly: [`SceneAssets::load`] touches the file
//! system, [`build_scene`] only talks to the render backend, so the scene
//! can be assembled in tests from in-memory assets.

use std::path::Path;
use std::rc::Rc;

use cgmath::{Vector3, Zero};
use log::{error, info};

use crate::config::{AssetConfig, WindowConfig};
use crate::error::ViewerResult;
use crate::gfx::backend::RenderBackend;
use crate::gfx::camera::{Camera, CameraRig, Projection};
use crate::gfx::geometry::{generate_cube, generate_fire_quad, generate_icosphere, generate_skybox, generate_water_quad};
use crate::gfx::resources::light::{Light, LightObject, LightType};
use crate::gfx::resources::material::Material;
use crate::gfx::resources::mesh_loader::{load_mesh, load_scene, MeshSource, SceneMesh};
use crate::gfx::resources::texture_resource::{load_cube_faces, TextureSource};
use crate::gfx::shader::ShaderSet;

use super::controller::{SceneController, SharedState};
use super::layout::*;
use super::objects::*;
use super::render_object::{RenderObject, Renderable};
use super::transform::{Transform, TransformArena};

/// Decoded, GPU-agnostic inputs of the scene
#[derive(Debug, Clone)]
pub struct SceneAssets {
    pub scene_meshes: Vec<SceneMesh>,
    pub cat: MeshSource,
    pub box_diffuse: TextureSource,
    pub box_specular: TextureSource,
    pub sphere_diffuse: TextureSource,
    pub sphere_specular: TextureSource,
    pub water: TextureSource,
    pub fire: TextureSource,
    pub skybox: [TextureSource; 6],
}

impl SceneAssets {
    /// Reads every asset named by `config`
    ///
    /// Only an unreadable scene file is an error. A missing cat, texture or
    /// cube face is logged and replaced by an empty mesh or a white image.
    pub fn load(config: &AssetConfig) -> ViewerResult<Self> {
        let scene_meshes = load_scene(&config.resolve(&config.scene))?;
        let cat = load_mesh(&config.resolve(&config.cat), false).unwrap_or_else(|e| {
            error!("{}", e);
            MeshSource::default()
        });
        let texture = |path: &Path| TextureSource::load_or_white(&config.resolve(path));

        Ok(Self {
            scene_meshes,
            cat,
            box_diffuse: texture(&config.box_diffuse),
            box_specular: texture(&config.box_specular),
            sphere_diffuse: texture(&config.sphere_diffuse),
            sphere_specular: texture(&config.sphere_specular),
            water: texture(&config.water),
            fire: texture(&config.fire),
            skybox: load_cube_faces(&config.resolve(&config.skybox)),
        })
    }

    /// No scene meshes, an empty cat and white textures
    pub fn placeholder() -> Self {
        Self {
            scene_meshes: Vec::new(),
            cat: MeshSource::default(),
            box_diffuse: TextureSource::white(),
            box_specular: TextureSource::white(),
            sphere_diffuse: TextureSource::white(),
            sphere_specular: TextureSource::white(),
            water: TextureSource::white(),
            fire: TextureSource::white(),
            skybox: std::array::from_fn(|_| TextureSource::white()),
        }
    }
}

/// Uploads the assets and builds the scene in its fixed draw order
///
/// Order: scene meshes, cat, sphere, fire, cube map, water, then the boxes
/// BigT, MidT, SmlT, SmlA, MidA, BigA.
pub fn build_scene(
    backend: &mut dyn RenderBackend,
    assets: &SceneAssets,
    shader_dir: &Path,
    window: &WindowConfig,
) -> SceneController {
    let shaders = ShaderSet::load(backend, shader_dir);
    let mut transforms = TransformArena::new();
    let rig = CameraRig::new(&mut transforms, Camera::new(Projection::Perspective, window.near, window.far));
    let shared = SharedState::default();
    let mut objects = Vec::new();

    for mesh in &assets.scene_meshes {
        let geometry = mesh.source.to_geometry().upload(backend, &mesh.name);
        let transform = transforms.insert(Transform::from_matrix(&mesh.node_matrix));
        objects.push(RenderObject::new(
            transform,
            Renderable::Mesh(MeshRenderer {
                geometry,
                material: Rc::new(mesh.material.clone()),
            }),
        ));
    }

    let cat = transforms.insert(Transform::with_scale(CAT_POSITION, CAT_SCALE));
    rig.attach_preset(&mut transforms, CAT_CAMERA_PRESET, cat);
    objects.push(RenderObject::new(
        cat,
        Renderable::Cat(CatPayload {
            geometry: assets.cat.to_geometry().upload(backend, "Cat"),
            material: Rc::new(Material::default()),
            shared: shared.cat.clone(),
        }),
    ));

    let sphere = transforms.insert(Transform::with_scale(SPHERE_POSITION, SPHERE_SCALE));
    objects.push(RenderObject::new(
        sphere,
        Renderable::Sphere(SpherePayload {
            geometry: generate_icosphere(SPHERE_SUBDIVISIONS).upload(backend, "Sphere"),
            diffuse: Some(backend.upload_texture("Sphere Diffuse", &assets.sphere_diffuse)),
            specular: Some(backend.upload_texture("Sphere Specular", &assets.sphere_specular)),
            shared: shared.sphere.clone(),
        }),
    ));

    objects.push(RenderObject::new(
        transforms.insert(Transform::new(FIRE_POSITION)),
        Renderable::Fire(FirePayload {
            geometry: generate_fire_quad().upload(backend, "Fire"),
            texture: Some(backend.upload_texture("Fire Atlas", &assets.fire)),
            columns: FIRE_COLUMNS,
            rows: FIRE_ROWS,
            frame_duration: FIRE_FRAME_DURATION,
            shared: shared.fire.clone(),
        }),
    ));

    objects.push(RenderObject::new(
        transforms.insert(Transform::with_scale(Vector3::zero(), CUBE_MAP_SCALE)),
        Renderable::CubeMap(CubeMapPayload {
            geometry: generate_skybox().upload(backend, "Cube Map"),
            texture: Some(backend.upload_cube_texture("Cube Map", &assets.skybox)),
        }),
    ));

    objects.push(RenderObject::new(
        transforms.insert(Transform::with_scale(Vector3::zero(), WATER_SCALE)),
        Renderable::Water(WaterPayload {
            geometry: generate_water_quad().upload(backend, "Water"),
            texture: Some(backend.upload_texture("Water", &assets.water)),
        }),
    ));

    let box_shared = Rc::new(BoxShared {
        geometry: generate_cube().upload(backend, "Box"),
        diffuse: Some(backend.upload_texture("Box Diffuse", &assets.box_diffuse)),
        specular: Some(backend.upload_texture("Box Specular", &assets.box_specular)),
    });
    let mut add_box = |transforms: &mut TransformArena, box_type: BoxType, position: Vector3<f32>, parent| {
        let id = transforms.insert(Transform::with_scale(position, box_type.scale()));
        transforms.set_parent(id, parent);
        objects.push(RenderObject::new(
            id,
            Renderable::Box(BoxPayload::new(box_type, box_shared.clone())),
        ));
        id
    };
    let big_t = add_box(&mut transforms, BoxType::BigT, BOX_BIG_T_POSITION, None);
    let mid_t = add_box(&mut transforms, BoxType::MidT, BOX_MID_T_POSITION, Some(big_t));
    add_box(&mut transforms, BoxType::SmlT, BOX_SMALL_T_POSITION, Some(mid_t));

    // The translucent chain hangs from BigA but is drawn smallest first
    let big_a = transforms.insert(Transform::with_scale(BOX_BIG_A_POSITION, BoxType::BigA.scale()));
    transforms.get_mut(big_a).set_forward(BOX_BIG_A_DIRECTION);
    let mid_a = transforms.insert(Transform::with_scale(Vector3::zero(), BoxType::MidA.scale()));
    transforms.set_parent(mid_a, Some(big_a));
    let sml_a = transforms.insert(Transform::with_scale(Vector3::zero(), BoxType::SmlA.scale()));
    transforms.set_parent(sml_a, Some(mid_a));
    for (id, box_type) in [(sml_a, BoxType::SmlA), (mid_a, BoxType::MidA), (big_a, BoxType::BigA)] {
        objects.push(RenderObject::new(
            id,
            Renderable::Box(BoxPayload::new(box_type, box_shared.clone())),
        ));
    }

    let lights = build_lights(&mut transforms, &rig);
    info!("Scene built: {} objects, {} lights", objects.len(), lights.len());

    let mut controller = SceneController::new(
        transforms,
        objects,
        lights,
        rig,
        shaders,
        shared,
        shader_dir.to_path_buf(),
        window.fov,
    );
    controller.obstacle = Some(sphere);
    controller.on_resize(window.width, window.height);
    controller
}

/// Flashlight on the camera, the fire's point light, ambient, sun, and a central point light
fn build_lights(transforms: &mut TransformArena, rig: &CameraRig) -> Vec<LightObject> {
    let anchors = [
        (LightType::Spot, rig.active()),
        (LightType::Point, transforms.insert(Transform::new(POINT_LIGHT_FIRE))),
        (LightType::Ambient, transforms.insert(Transform::default())),
        (
            LightType::Direct,
            transforms.insert(Transform::looking(Vector3::zero(), DIRECT_LIGHT_DIRECTION)),
        ),
        (LightType::Point, transforms.insert(Transform::new(POINT_LIGHT_CENTER))),
    ];

    anchors
        .into_iter()
        .enumerate()
        .map(|(index, (light_type, anchor))| LightObject::new(Light::new(light_type), anchor, index))
        .collect()
}

#[cfg(test)]
mod tests {
    use cgmath::Matrix4;

    use super::*;
    use crate::gfx::backend::recording::RecordingBackend;
    use crate::gfx::resources::mesh_loader::MeshSource;
    use crate::gfx::scene::render_object::RenderKind;
    use approx::assert_relative_eq;

    fn scene_mesh(name: &str, translation: Vector3<f32>) -> SceneMesh {
        SceneMesh {
            name: name.to_string(),
            source: MeshSource {
                positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                ..Default::default()
            },
            material: Material::default(),
            node_matrix: Matrix4::from_translation(translation),
        }
    }

    fn build(assets: &SceneAssets) -> (RecordingBackend, SceneController) {
        let mut backend = RecordingBackend::new();
        let scene = build_scene(&mut backend, assets, Path::new("shaders"), &WindowConfig::default());
        (backend, scene)
    }

    #[test]
    fn test_objects_are_built_in_draw_order() {
        let mut assets = SceneAssets::placeholder();
        assets.scene_meshes = vec![scene_mesh("Island", Vector3::new(0.0, -1.0, 0.0))];
        let (_, scene) = build(&assets);

        let kinds: Vec<RenderKind> = scene.objects.iter().map(|o| o.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                RenderKind::Mesh,
                RenderKind::Cat,
                RenderKind::Sphere,
                RenderKind::Fire,
                RenderKind::CubeMap,
                RenderKind::Water,
                RenderKind::Box,
                RenderKind::Box,
                RenderKind::Box,
                RenderKind::Box,
                RenderKind::Box,
                RenderKind::Box,
            ]
        );
        let box_types: Vec<BoxType> = scene
            .objects
            .iter()
            .filter_map(|o| match &o.renderable {
                Renderable::Box(payload) => Some(payload.box_type),
                _ => None,
            })
            .collect();
        assert_eq!(
            box_types,
            vec![BoxType::BigT, BoxType::MidT, BoxType::SmlT, BoxType::SmlA, BoxType::MidA, BoxType::BigA]
        );
        assert_relative_eq!(
            scene.transforms.world_position(scene.objects[0].transform),
            Vector3::new(0.0, -1.0, 0.0)
        );
    }

    #[test]
    fn test_box_chain_composes_parent_matrices() {
        let (_, scene) = build(&SceneAssets::placeholder());
        let sml_t = scene.objects[7].transform;

        // BigT + MidT + 0.6 * SmlT
        assert_relative_eq!(
            scene.transforms.world_position(sml_t),
            Vector3::new(-7.0 + 0.6 * 0.64, 3.2 + 0.8, 1.5),
            epsilon = 1e-5
        );
        assert_relative_eq!(scene.transforms.get(sml_t).scale, 0.3);
    }

    #[test]
    fn test_boxes_share_one_geometry() {
        let (backend, scene) = build(&SceneAssets::placeholder());
        let geometries: Vec<_> = scene
            .objects
            .iter()
            .filter_map(|o| match &o.renderable {
                Renderable::Box(payload) => Some(payload.shared.geometry),
                _ => None,
            })
            .collect();
        assert!(geometries.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(backend.geometry_label(geometries[0]), Some("Box"));
        assert_eq!(backend.vertex_count(geometries[0]), Some(36));
    }

    #[test]
    fn test_lights_are_indexed_in_order() {
        let (_, scene) = build(&SceneAssets::placeholder());
        let types: Vec<LightType> = scene.lights.iter().map(|l| l.light.light_type).collect();
        assert_eq!(
            types,
            vec![LightType::Spot, LightType::Point, LightType::Ambient, LightType::Direct, LightType::Point]
        );
        assert!(scene.lights.iter().enumerate().all(|(i, l)| l.index() == i));
        assert_eq!(scene.lights[0].anchor, scene.rig.active());
        assert_eq!(scene.lights[FIRE_LIGHT_INDEX].light.light_type, LightType::Point);
    }

    #[test]
    fn test_cat_camera_rides_on_the_cat() {
        let (_, scene) = build(&SceneAssets::placeholder());
        let cat = scene.objects[0].transform;
        let preset = scene.rig.preset(CAT_CAMERA_PRESET).unwrap();
        assert_eq!(scene.transforms.get(preset).parent(), Some(cat));
        assert_eq!(scene.obstacle, Some(scene.objects[1].transform));
    }

    #[test]
    fn test_cube_map_uses_cube_texture() {
        let (backend, scene) = build(&SceneAssets::placeholder());
        let Renderable::CubeMap(cube_map) = &scene.objects[3].renderable else {
            panic!("expected the cube map");
        };
        assert_eq!(
            backend.texture_kind(cube_map.texture.unwrap()),
            Some(crate::gfx::backend::TextureKind::Cube)
        );
    }
}
