// src/lib.rs
//! Diorama
//!
//! An interactive 3D scene viewer built on wgpu and winit.

pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod input;
pub mod prelude;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::DioramaApp;
pub use config::ViewerConfig;
pub use error::{ViewerError, ViewerResult};
