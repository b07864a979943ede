// src/gfx/rendering/mod.rs
//! Core rendering functionality
//!
//! Pipeline variants and the wgpu implementation of the render backend.

pub mod pipeline_manager;
pub mod render_engine;

// Re-export main types
pub use pipeline_manager::{PassKind, PipelineConfig, PipelineKey, PipelineManager};
pub use render_engine::WgpuBackend;
