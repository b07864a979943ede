//! In-memory backend for GPU-free tests
//!
//! Every program keeps its uniform values by name, every draw snapshots the
//! bound state, and the picking pass writes the stencil reference into the
//! pixels a geometry was told to cover with [`RecordingBackend::set_coverage`].
//! Depth is not simulated during picking: the last draw covering a pixel wins.

use std::collections::{HashMap, HashSet};

use crate::error::{ViewerError, ViewerResult};
use crate::gfx::resources::texture_resource::TextureSource;
use crate::gfx::scene::vertex::Vertex3D;
use crate::gfx::shader::{ShaderKind, UniformLayout, UniformLocation, UniformValue};

use super::{GeometryId, ProgramId, RenderBackend, TextureId, TextureKind, TEXTURE_SLOTS};

#[derive(Debug, Clone)]
struct RecordedProgram {
    kind: ShaderKind,
    layout: UniformLayout,
    values: HashMap<String, UniformValue>,
    deleted: bool,
}

/// State captured by one draw call
#[derive(Debug, Clone)]
pub struct DrawRecord {
    pub program: ProgramId,
    pub kind: ShaderKind,
    pub geometry: GeometryId,
    pub uniforms: HashMap<String, UniformValue>,
    pub textures: [Option<TextureId>; TEXTURE_SLOTS],
    pub depth_write: bool,
    pub stencil_write: bool,
    pub stencil_reference: u32,
    pub picking: bool,
}

impl DrawRecord {
    pub fn int(&self, name: &str) -> Option<i32> {
        match self.uniforms.get(name) {
            Some(UniformValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        match self.uniforms.get(name) {
            Some(UniformValue::Float(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn value(&self, name: &str) -> Option<UniformValue> {
        self.uniforms.get(name).copied()
    }
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    programs: Vec<RecordedProgram>,
    failing: HashSet<ShaderKind>,
    current: Option<usize>,
    geometries: Vec<(String, usize)>,
    textures: Vec<(String, TextureKind)>,
    bound: [Option<TextureId>; TEXTURE_SLOTS],
    depth_write: bool,
    stencil_write: bool,
    stencil_reference: u32,
    picking: bool,
    coverage: HashMap<GeometryId, Vec<(u32, u32)>>,
    stencil: HashMap<(u32, u32), u8>,
    pub draws: Vec<DrawRecord>,
    pub stencil_reads: Vec<(u32, u32)>,
    pub presents: usize,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            depth_write: true,
            stencil_write: true,
            ..Default::default()
        }
    }

    /// Makes every later `create_program` of `kind` fail
    pub fn fail_compile(&mut self, kind: ShaderKind) {
        self.failing.insert(kind);
    }

    /// Pixels (bottom-left origin) a geometry covers during the picking pass
    pub fn set_coverage(&mut self, geometry: GeometryId, pixels: &[(u32, u32)]) {
        self.coverage.insert(geometry, pixels.to_vec());
    }

    pub fn program_count(&self) -> usize {
        self.programs.iter().filter(|p| !p.deleted).count()
    }

    pub fn geometry_label(&self, geometry: GeometryId) -> Option<&str> {
        self.geometries
            .get(geometry.0 as usize)
            .map(|(label, _)| label.as_str())
    }

    pub fn vertex_count(&self, geometry: GeometryId) -> Option<usize> {
        self.geometries.get(geometry.0 as usize).map(|(_, count)| *count)
    }

    pub fn texture_kind(&self, texture: TextureId) -> Option<TextureKind> {
        self.textures.get(texture.0 as usize).map(|(_, kind)| *kind)
    }

    /// Current value of a uniform in a program
    pub fn uniform(&self, program: ProgramId, name: &str) -> Option<UniformValue> {
        program
            .index()
            .and_then(|index| self.programs.get(index))
            .and_then(|p| p.values.get(name).copied())
    }

    /// Draws of the main (non-picking) pass
    pub fn main_draws(&self) -> impl Iterator<Item = &DrawRecord> {
        self.draws.iter().filter(|d| !d.picking)
    }

    pub fn picking_draws(&self) -> impl Iterator<Item = &DrawRecord> {
        self.draws.iter().filter(|d| d.picking)
    }

    pub fn clear_draws(&mut self) {
        self.draws.clear();
    }
}

impl RenderBackend for RecordingBackend {
    fn create_program(&mut self, kind: ShaderKind, _source: &str) -> ViewerResult<ProgramId> {
        if self.failing.contains(&kind) {
            return Err(ViewerError::ShaderCompile {
                label: kind.label().to_string(),
                message: "rejected by test backend".to_string(),
            });
        }
        self.programs.push(RecordedProgram {
            kind,
            layout: kind.uniform_layout(),
            values: HashMap::new(),
            deleted: false,
        });
        Ok(ProgramId::from_index(self.programs.len() - 1))
    }

    fn delete_program(&mut self, program: ProgramId) {
        if let Some(p) = program.index().and_then(|i| self.programs.get_mut(i)) {
            p.deleted = true;
        }
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> UniformLocation {
        program
            .index()
            .and_then(|index| self.programs.get(index))
            .filter(|p| !p.deleted)
            .map(|p| p.layout.location(name))
            .unwrap_or_default()
    }

    fn use_program(&mut self, program: ProgramId) {
        self.current = program
            .index()
            .filter(|index| self.programs.get(*index).is_some_and(|p| !p.deleted));
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        let Some(program) = self.current.and_then(|index| self.programs.get_mut(index)) else {
            return;
        };
        let Some(field) = program.layout.field(location) else {
            return;
        };
        if field.kind == value.kind() {
            program.values.insert(field.name.clone(), value);
        }
    }

    fn upload_geometry(&mut self, label: &str, vertices: &[Vertex3D], indices: Option<&[u32]>) -> GeometryId {
        let count = indices.map_or(vertices.len(), |i| i.len());
        self.geometries.push((label.to_string(), count));
        GeometryId(self.geometries.len() as u32 - 1)
    }

    fn upload_texture(&mut self, label: &str, _source: &TextureSource) -> TextureId {
        self.textures.push((label.to_string(), TextureKind::Flat));
        TextureId(self.textures.len() as u32 - 1)
    }

    fn upload_cube_texture(&mut self, label: &str, _faces: &[TextureSource; 6]) -> TextureId {
        self.textures.push((label.to_string(), TextureKind::Cube));
        TextureId(self.textures.len() as u32 - 1)
    }

    fn bind_texture(&mut self, slot: usize, texture: Option<TextureId>) {
        if slot < TEXTURE_SLOTS {
            self.bound[slot] = texture;
        }
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.depth_write = enabled;
    }

    fn set_stencil_write(&mut self, enabled: bool) {
        self.stencil_write = enabled;
    }

    fn set_stencil_reference(&mut self, reference: u32) {
        self.stencil_reference = reference;
    }

    fn draw(&mut self, geometry: GeometryId) {
        let Some(index) = self.current else {
            return;
        };
        let program = &self.programs[index];

        if self.picking && self.stencil_write {
            if let Some(pixels) = self.coverage.get(&geometry) {
                for pixel in pixels {
                    self.stencil.insert(*pixel, self.stencil_reference as u8);
                }
            }
        }

        self.draws.push(DrawRecord {
            program: ProgramId::from_index(index),
            kind: program.kind,
            geometry,
            uniforms: program.values.clone(),
            textures: self.bound,
            depth_write: self.depth_write,
            stencil_write: self.stencil_write,
            stencil_reference: self.stencil_reference,
            picking: self.picking,
        });
    }

    fn begin_picking_pass(&mut self) {
        self.picking = true;
        self.stencil.clear();
    }

    fn read_stencil_pixel(&mut self, x: u32, y: u32) -> u8 {
        self.picking = false;
        self.stencil_reads.push((x, y));
        self.stencil.get(&(x, y)).copied().unwrap_or(0)
    }

    fn present(&mut self) {
        self.presents += 1;
    }
}
