//! # Shader programs
//!
//! The viewer runs three programs: the lit main program, the scrolling water
//! program and the flat white program used to highlight a picked object.
//! Each [`ShaderKind`] owns a fixed [`UniformLayout`] that mirrors the
//! `Uniforms` struct of its WGSL source, so uniform lookups are plain name
//! searches in that layout.

pub mod loader;
pub mod uniform;

use std::collections::HashMap;
use std::path::Path;

use log::{error, info, warn};

use crate::error::{ViewerError, ViewerResult};
use crate::gfx::backend::{ProgramId, RenderBackend, TextureKind};

pub use uniform::{UniformKind, UniformLayout, UniformLocation, UniformValue};

/// Size of the light array declared by the main program
pub const MAX_LIGHTS: usize = 8;

/// Texture slot sampled as the cube map (main) or the water texture (water)
pub const SLOT_CUBE: usize = 0;
pub const SLOT_DIFFUSE: usize = 1;
pub const SLOT_SPECULAR: usize = 2;
pub const SLOT_FIRE: usize = 3;

pub const LIGHT_MEMBERS: [(&str, UniformKind); 12] = [
    ("type", UniformKind::Int),
    ("constant", UniformKind::Float),
    ("linear", UniformKind::Float),
    ("quadratic", UniformKind::Float),
    ("position", UniformKind::Vec3),
    ("cutOff", UniformKind::Float),
    ("direction", UniformKind::Vec3),
    ("outerCutOff", UniformKind::Float),
    ("color", UniformKind::Vec3),
    ("ambient", UniformKind::Vec3),
    ("diffuse", UniformKind::Vec3),
    ("specular", UniformKind::Vec3),
];

pub const MATERIAL_MEMBERS: [(&str, UniformKind); 3] = [
    ("diffuse", UniformKind::Vec3),
    ("specular", UniformKind::Vec3),
    ("shininess", UniformKind::Float),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    Main,
    Water,
    White,
}

impl ShaderKind {
    pub const ALL: [ShaderKind; 3] = [ShaderKind::Main, ShaderKind::Water, ShaderKind::White];

    pub fn label(self) -> &'static str {
        match self {
            ShaderKind::Main => "Main Shader",
            ShaderKind::Water => "Water Shader",
            ShaderKind::White => "White Shader",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            ShaderKind::Main => "main.wgsl",
            ShaderKind::Water => "water.wgsl",
            ShaderKind::White => "white.wgsl",
        }
    }

    /// Texture bindings of group 1, indexed by slot
    pub fn texture_slots(self) -> &'static [TextureKind] {
        match self {
            ShaderKind::Main => &[
                TextureKind::Cube,
                TextureKind::Flat,
                TextureKind::Flat,
                TextureKind::Flat,
            ],
            ShaderKind::Water => &[TextureKind::Flat],
            ShaderKind::White => &[],
        }
    }

    /// Layout of the program's uniform block, in WGSL declaration order
    pub fn uniform_layout(self) -> UniformLayout {
        let matrices = UniformLayout::builder()
            .field("model", UniformKind::Mat4)
            .field("view", UniformKind::Mat4)
            .field("projection", UniformKind::Mat4);

        match self {
            ShaderKind::Main => matrices
                .field("viewPosition", UniformKind::Vec3)
                .field("lightCount", UniformKind::Int)
                .field("useTexture", UniformKind::Int)
                .field("useAlpha", UniformKind::Int)
                .field("alpha", UniformKind::Float)
                .field("useCubeMap", UniformKind::Int)
                .field("useToSphere", UniformKind::Int)
                .field("alphaToSphere", UniformKind::Float)
                .field("useFire", UniformKind::Int)
                .field("frame", UniformKind::Int)
                .field("fireCols", UniformKind::Int)
                .field("fireRows", UniformKind::Int)
                .field("useFog", UniformKind::Int)
                .field("fogStart", UniformKind::Float)
                .field("fogColor", UniformKind::Vec3)
                .field("fogEnd", UniformKind::Float)
                .field("useFlashLight", UniformKind::Int)
                .field("useFireLight", UniformKind::Int)
                .field("fireLightIndex", UniformKind::Int)
                .struct_field("material", &MATERIAL_MEMBERS)
                .struct_array("lights", MAX_LIGHTS, &LIGHT_MEMBERS)
                .build(),
            ShaderKind::Water => matrices
                .field("scrollSpeed", UniformKind::Vec2)
                .field("time", UniformKind::Float)
                .field("alpha", UniformKind::Float)
                .field("fogColor", UniformKind::Vec3)
                .field("useFog", UniformKind::Int)
                .field("fogStart", UniformKind::Float)
                .field("fogEnd", UniformKind::Float)
                .build(),
            ShaderKind::White => matrices.build(),
        }
    }

    /// Uniform names the host writes for this kind; a missing one is warned about at load
    fn expected_uniforms(self) -> Vec<String> {
        match self {
            ShaderKind::Main => self
                .uniform_layout()
                .fields()
                .iter()
                .map(|field| field.name.clone())
                .collect(),
            ShaderKind::Water => [
                "model",
                "view",
                "projection",
                "scrollSpeed",
                "time",
                "alpha",
                "fogColor",
                "useFog",
                "fogStart",
                "fogEnd",
            ]
            .iter()
            .map(|name| name.to_string())
            .collect(),
            ShaderKind::White => ["model", "view", "projection"]
                .iter()
                .map(|name| name.to_string())
                .collect(),
        }
    }
}

/// Locations of the uniforms the frame loop and renderables write every frame
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformTable {
    pub model: UniformLocation,
    pub view: UniformLocation,
    pub projection: UniformLocation,
    pub view_position: UniformLocation,
    pub light_count: UniformLocation,
    pub use_texture: UniformLocation,
    pub use_alpha: UniformLocation,
    pub alpha: UniformLocation,
    pub use_cube_map: UniformLocation,
    pub use_to_sphere: UniformLocation,
    pub alpha_to_sphere: UniformLocation,
    pub use_fire: UniformLocation,
    pub frame: UniformLocation,
    pub fire_cols: UniformLocation,
    pub fire_rows: UniformLocation,
    pub use_fog: UniformLocation,
    pub fog_color: UniformLocation,
    pub fog_start: UniformLocation,
    pub fog_end: UniformLocation,
    pub use_flash_light: UniformLocation,
    pub use_fire_light: UniformLocation,
    pub fire_light_index: UniformLocation,
    pub time: UniformLocation,
    pub scroll_speed: UniformLocation,
}

impl UniformTable {
    fn resolve(mut lookup: impl FnMut(&str) -> UniformLocation) -> Self {
        Self {
            model: lookup("model"),
            view: lookup("view"),
            projection: lookup("projection"),
            view_position: lookup("viewPosition"),
            light_count: lookup("lightCount"),
            use_texture: lookup("useTexture"),
            use_alpha: lookup("useAlpha"),
            alpha: lookup("alpha"),
            use_cube_map: lookup("useCubeMap"),
            use_to_sphere: lookup("useToSphere"),
            alpha_to_sphere: lookup("alphaToSphere"),
            use_fire: lookup("useFire"),
            frame: lookup("frame"),
            fire_cols: lookup("fireCols"),
            fire_rows: lookup("fireRows"),
            use_fog: lookup("useFog"),
            fog_color: lookup("fogColor"),
            fog_start: lookup("fogStart"),
            fog_end: lookup("fogEnd"),
            use_flash_light: lookup("useFlashLight"),
            use_fire_light: lookup("useFireLight"),
            fire_light_index: lookup("fireLightIndex"),
            time: lookup("time"),
            scroll_speed: lookup("scrollSpeed"),
        }
    }
}

/// A compiled program plus its resolved uniform locations
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    kind: ShaderKind,
    id: ProgramId,
    pub uniforms: UniformTable,
    named: HashMap<String, UniformLocation>,
}

impl ShaderProgram {
    /// Compiles `source` and resolves every expected uniform once
    ///
    /// A load or compile failure is logged and yields an invalid program whose
    /// draws are no-ops.
    pub fn load(backend: &mut dyn RenderBackend, kind: ShaderKind, source: ViewerResult<String>) -> Self {
        let id = match source.and_then(|code| backend.create_program(kind, &code)) {
            Ok(id) => id,
            Err(e) => {
                error!("{} is unusable: {}", kind.label(), e);
                return Self::invalid(kind);
            }
        };

        let mut named = HashMap::new();
        for name in kind.expected_uniforms() {
            let location = backend.uniform_location(id, &name);
            if !location.is_valid() {
                warn!("{}", ViewerError::UniformNotFound(name.clone()));
            }
            named.insert(name, location);
        }

        let uniforms = UniformTable::resolve(|name| named.get(name).copied().unwrap_or_default());
        info!("{} loaded", kind.label());
        Self {
            kind,
            id,
            uniforms,
            named,
        }
    }

    pub fn invalid(kind: ShaderKind) -> Self {
        Self {
            kind,
            id: ProgramId::INVALID,
            uniforms: UniformTable::default(),
            named: HashMap::new(),
        }
    }

    pub fn kind(&self) -> ShaderKind {
        self.kind
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn is_valid(&self) -> bool {
        self.id.is_valid()
    }

    /// Location of a uniform resolved at load; anything else is invalid
    pub fn location(&self, name: &str) -> UniformLocation {
        self.named.get(name).copied().unwrap_or_default()
    }

    pub fn bind(&self, backend: &mut dyn RenderBackend) {
        backend.use_program(self.id);
    }
}

/// The three programs of the viewer
#[derive(Debug, Clone)]
pub struct ShaderSet {
    pub main: ShaderProgram,
    pub water: ShaderProgram,
    pub white: ShaderProgram,
}

impl ShaderSet {
    pub fn load(backend: &mut dyn RenderBackend, shader_dir: &Path) -> Self {
        let mut load = |kind: ShaderKind| {
            let source = loader::load_shader_source(shader_dir, kind.file_name(), shader_dir);
            ShaderProgram::load(backend, kind, source)
        };
        Self {
            main: load(ShaderKind::Main),
            water: load(ShaderKind::Water),
            white: load(ShaderKind::White),
        }
    }

    /// Rebuilds all programs from disk, releasing the previous ones
    pub fn reload(&mut self, backend: &mut dyn RenderBackend, shader_dir: &Path) {
        info!("Reloading shaders from '{}'", shader_dir.display());
        let fresh = Self::load(backend, shader_dir);
        for old in [&self.main, &self.water, &self.white] {
            if old.is_valid() {
                backend.delete_program(old.id());
            }
        }
        *self = fresh;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::backend::recording::RecordingBackend;

    #[test]
    fn test_main_layout_matches_shader_struct() {
        let layout = ShaderKind::Main.uniform_layout();
        let offset = |name: &str| layout.field(layout.location(name)).unwrap().offset;

        assert_eq!(offset("viewPosition"), 192);
        assert_eq!(offset("lightCount"), 204);
        assert_eq!(offset("fogColor"), 256);
        assert_eq!(offset("fogEnd"), 268);
        assert_eq!(offset("fireLightIndex"), 280);
        assert_eq!(offset("material.diffuse"), 288);
        assert_eq!(offset("material.shininess"), 316);
        assert_eq!(offset("lights[0].type"), 320);
        assert_eq!(offset("lights[1].type"), 432);
        assert_eq!(offset("lights[0].specular"), 416);
        assert_eq!(layout.size(), 320 + 112 * MAX_LIGHTS as u32);
    }

    #[test]
    fn test_water_layout_packs_scroll_and_time() {
        let layout = ShaderKind::Water.uniform_layout();
        let offset = |name: &str| layout.field(layout.location(name)).unwrap().offset;
        assert_eq!(offset("scrollSpeed"), 192);
        assert_eq!(offset("time"), 200);
        assert_eq!(offset("alpha"), 204);
        assert_eq!(offset("fogColor"), 208);
        assert_eq!(offset("fogEnd"), 228);
        assert_eq!(layout.size(), 240);
    }

    #[test]
    fn test_white_program_only_resolves_matrices() {
        let mut backend = RecordingBackend::new();
        let program = ShaderProgram::load(&mut backend, ShaderKind::White, Ok(String::new()));

        assert!(program.is_valid());
        assert!(program.uniforms.model.is_valid());
        assert!(program.uniforms.projection.is_valid());
        assert!(!program.uniforms.use_texture.is_valid());
        assert!(!program.location("lights[0].type").is_valid());
    }

    #[test]
    fn test_main_program_resolves_light_names() {
        let mut backend = RecordingBackend::new();
        let program = ShaderProgram::load(&mut backend, ShaderKind::Main, Ok(String::new()));

        assert!(program.location("lights[7].outerCutOff").is_valid());
        assert!(program.location("material.shininess").is_valid());
        assert!(!program.location("lights[8].type").is_valid());
        assert!(!program.uniforms.time.is_valid());
    }

    #[test]
    fn test_failed_source_yields_invalid_program() {
        let mut backend = RecordingBackend::new();
        let program = ShaderProgram::load(
            &mut backend,
            ShaderKind::Main,
            Err(ViewerError::asset("shaders/main.wgsl", "missing")),
        );
        assert!(!program.is_valid());
        assert!(!program.uniforms.model.is_valid());
        assert_eq!(backend.program_count(), 0);
    }

    #[test]
    fn test_compile_failure_yields_invalid_program() {
        let mut backend = RecordingBackend::new();
        backend.fail_compile(ShaderKind::Water);
        let program = ShaderProgram::load(&mut backend, ShaderKind::Water, Ok(String::new()));
        assert!(!program.is_valid());
    }
}
