//! # Graphics Module
//!
//! Everything between the scene description and the GPU.
//!
//! - **Backend** ([`backend`]) - the draw-call interface the scene renders through
//! - **Rendering** ([`rendering`]) - the wgpu implementation of that interface
//! - **Camera** ([`camera`]) - perspective camera and the preset rig
//! - **Scene** ([`scene`]) - transforms, render objects and the frame controller
//! - **Picking** ([`picking`]) - stencil-buffer object selection
//! - **Resources** ([`resources`]) - meshes, textures, materials and lights
//! - **Shader** ([`shader`]) - program loading and uniform layouts

pub mod backend;
pub mod camera;
pub mod geometry;
pub mod picking;
pub mod rendering;
pub mod resources;
pub mod scene;
pub mod shader;

// Re-export commonly used types
pub use backend::RenderBackend;
pub use rendering::WgpuBackend;
