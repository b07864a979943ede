//! # Diorama Prelude
//!
//! Commonly used types in one import:
//!
//! ```no_run
//! use diorama::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ViewerConfig::load(None)?;
//!     DioramaApp::new(config)?.run()
//! }
//! ```

// Application and configuration
pub use crate::app::DioramaApp;
pub use crate::config::{AssetConfig, ViewerConfig, WindowConfig};
pub use crate::error::{ViewerError, ViewerResult};

// Rendering
pub use crate::gfx::backend::RenderBackend;
pub use crate::gfx::camera::{Camera, CameraRig, MoveDirection, Projection};
pub use crate::gfx::geometry::GeometryData;
pub use crate::gfx::rendering::WgpuBackend;

// Scene
pub use crate::gfx::scene::{build_scene, RenderObject, SceneAssets, SceneController, Transform, TransformArena};

// Common external dependencies
pub use cgmath::{InnerSpace, Vector3, Zero};
