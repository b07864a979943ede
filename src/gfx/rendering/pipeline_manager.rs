//! Render pipeline management for the viewer's programs
//!
//! A program is one compiled WGSL module with its bind group layout. The
//! fixed-function state a draw needs (depth write, stencil write, main or
//! picking pass) selects a pipeline variant, created lazily the first time a
//! draw asks for it and cached by [`PipelineKey`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::{error, info};
use wgpu::*;

use crate::gfx::backend::ProgramId;
use crate::gfx::resources::texture_resource::TextureResource;
use crate::gfx::scene::vertex::Vertex3D;

/// Which render pass a draw belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    Main,
    /// Depth and stencil only; colour writes are off
    Picking,
}

/// Fixed-function state that distinguishes pipeline variants of one program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub program: ProgramId,
    pub depth_write: bool,
    pub stencil_write: bool,
    pub pass: PassKind,
}

/// Configuration for creating a render pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub label: String,
    pub cull_mode: Option<Face>,
    pub depth_write: bool,
    pub depth_compare: CompareFunction,
    pub stencil_write: bool,
    pub color_targets: Vec<Option<ColorTargetState>>,
    /// No fragment stage, used by the picking pass
    pub vertex_only: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            label: "Default Pipeline".to_string(),
            cull_mode: Some(Face::Back),
            depth_write: true,
            // Equal depth lets the skybox, drawn at the far plane, pass
            depth_compare: CompareFunction::LessEqual,
            stencil_write: false,
            color_targets: vec![Some(ColorTargetState {
                format: TextureFormat::Bgra8Unorm,
                blend: Some(BlendState::ALPHA_BLENDING),
                write_mask: ColorWrites::ALL,
            })],
            vertex_only: false,
        }
    }
}

impl PipelineConfig {
    /// Configuration of the variant `key` names, drawing into `color_format`
    pub fn for_key(key: &PipelineKey, label: &str, color_format: TextureFormat) -> Self {
        let config = Self::default()
            .with_label(&format!(
                "{} [{:?} depth:{} stencil:{}]",
                label, key.pass, key.depth_write, key.stencil_write
            ))
            .with_depth_write(key.depth_write)
            .with_stencil_write(key.stencil_write);

        match key.pass {
            PassKind::Main => config.with_color_targets(vec![Some(ColorTargetState {
                format: color_format,
                blend: Some(BlendState::ALPHA_BLENDING),
                write_mask: ColorWrites::ALL,
            })]),
            PassKind::Picking => config.with_color_targets(vec![]).with_vertex_only(),
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_owned();
        self
    }

    pub fn with_cull_mode(mut self, face: Option<Face>) -> Self {
        self.cull_mode = face;
        self
    }

    pub fn with_depth_write(mut self, enabled: bool) -> Self {
        self.depth_write = enabled;
        self
    }

    pub fn with_stencil_write(mut self, enabled: bool) -> Self {
        self.stencil_write = enabled;
        self
    }

    pub fn with_color_targets(mut self, targets: Vec<Option<ColorTargetState>>) -> Self {
        self.color_targets = targets;
        self
    }

    pub fn with_vertex_only(mut self) -> Self {
        self.vertex_only = true;
        self
    }

    /// Depth test always on; the stencil replaces with the reference when written
    pub fn depth_stencil_state(&self) -> DepthStencilState {
        let face = StencilFaceState {
            compare: CompareFunction::Always,
            fail_op: StencilOperation::Keep,
            depth_fail_op: StencilOperation::Keep,
            pass_op: StencilOperation::Replace,
        };
        DepthStencilState {
            format: TextureResource::DEPTH_FORMAT,
            depth_write_enabled: self.depth_write,
            depth_compare: self.depth_compare,
            stencil: StencilState {
                front: face,
                back: face,
                read_mask: 0xff,
                write_mask: if self.stencil_write { 0xff } else { 0x00 },
            },
            bias: DepthBiasState::default(),
        }
    }
}

struct ProgramModule {
    label: String,
    module: ShaderModule,
    layout: PipelineLayout,
}

/// Caches pipeline variants per program
pub struct PipelineManager {
    device: Arc<Device>,
    color_format: TextureFormat,
    programs: HashMap<ProgramId, ProgramModule>,
    pipelines: HashMap<PipelineKey, RenderPipeline>,
    failed: HashSet<PipelineKey>,
}

impl PipelineManager {
    pub fn new(device: Arc<Device>, color_format: TextureFormat) -> Self {
        Self {
            device,
            color_format,
            programs: HashMap::new(),
            pipelines: HashMap::new(),
            failed: HashSet::new(),
        }
    }

    /// Registers a compiled module; its pipelines are built on demand
    pub fn register_program(
        &mut self,
        program: ProgramId,
        label: &str,
        module: ShaderModule,
        bind_group_layout: &BindGroupLayout,
    ) {
        let layout = self.device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some(&format!("{} Layout", label)),
            bind_group_layouts: &[bind_group_layout],
            push_constant_ranges: &[],
        });
        self.programs.insert(
            program,
            ProgramModule {
                label: label.to_string(),
                module,
                layout,
            },
        );
    }

    /// Drops a program and every pipeline built from it
    pub fn remove_program(&mut self, program: ProgramId) {
        self.programs.remove(&program);
        self.pipelines.retain(|key, _| key.program != program);
        self.failed.retain(|key| key.program != program);
    }

    /// Gets or creates the pipeline variant `key` names
    ///
    /// Returns None for unknown programs and for variants that failed
    /// validation; the failure is logged once.
    pub fn get_pipeline(&mut self, key: PipelineKey) -> Option<&RenderPipeline> {
        if !self.pipelines.contains_key(&key) {
            if self.failed.contains(&key) {
                return None;
            }
            let program = self.programs.get(&key.program)?;
            let config = PipelineConfig::for_key(&key, &program.label, self.color_format);
            match self.create_pipeline_from_config(program, &config) {
                Ok(pipeline) => {
                    info!("Created pipeline '{}'", config.label);
                    self.pipelines.insert(key, pipeline);
                }
                Err(e) => {
                    error!("Failed to create pipeline '{}': {}", config.label, e);
                    self.failed.insert(key);
                    return None;
                }
            }
        }
        self.pipelines.get(&key)
    }

    fn create_pipeline_from_config(&self, program: &ProgramModule, config: &PipelineConfig) -> Result<RenderPipeline, String> {
        let fragment_state = if config.vertex_only {
            None
        } else {
            Some(FragmentState {
                module: &program.module,
                entry_point: Some("fs_main"),
                targets: &config.color_targets,
                compilation_options: PipelineCompilationOptions::default(),
            })
        };

        self.device.push_error_scope(ErrorFilter::Validation);
        let pipeline = self.device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(&config.label),
            layout: Some(&program.layout),
            vertex: VertexState {
                module: &program.module,
                entry_point: Some("vs_main"),
                buffers: &[Vertex3D::desc()],
                compilation_options: PipelineCompilationOptions::default(),
            },
            fragment: fragment_state,
            primitive: PrimitiveState {
                topology: PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: FrontFace::Ccw,
                cull_mode: config.cull_mode,
                polygon_mode: PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(config.depth_stencil_state()),
            multisample: MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        match pollster::block_on(self.device.pop_error_scope()) {
            Some(e) => Err(e.to_string()),
            None => Ok(pipeline),
        }
    }

    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(pass: PassKind, depth_write: bool, stencil_write: bool) -> PipelineKey {
        PipelineKey {
            program: ProgramId::from_index(0),
            depth_write,
            stencil_write,
            pass,
        }
    }

    #[test]
    fn test_picking_variant_has_no_colour_output() {
        let config = PipelineConfig::for_key(&key(PassKind::Picking, true, true), "Main Shader", TextureFormat::Bgra8Unorm);
        assert!(config.vertex_only);
        assert!(config.color_targets.is_empty());

        let state = config.depth_stencil_state();
        assert_eq!(state.stencil.write_mask, 0xff);
        assert_eq!(state.stencil.front.pass_op, StencilOperation::Replace);
        assert_eq!(state.format, TextureFormat::Depth24PlusStencil8);
    }

    #[test]
    fn test_main_variant_follows_write_flags() {
        let config = PipelineConfig::for_key(&key(PassKind::Main, false, false), "Water Shader", TextureFormat::Rgba8Unorm);
        assert!(!config.vertex_only);
        assert_eq!(config.color_targets.len(), 1);
        assert_eq!(config.color_targets[0].as_ref().map(|t| t.format), Some(TextureFormat::Rgba8Unorm));

        let state = config.depth_stencil_state();
        assert!(!state.depth_write_enabled);
        assert_eq!(state.stencil.write_mask, 0);
        assert_eq!(state.depth_compare, CompareFunction::LessEqual);
    }
}
