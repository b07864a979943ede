//! Viewer configuration
//!
//! Read from a TOML file; every field is optional and falls back to the
//! defaults below.
//!
//! ```toml
//! [window]
//! width = 1280
//! height = 720
//!
//! [assets]
//! root = "res"
//! scene = "Models/Scene/scene.glb"
//! ```

use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{ViewerError, ViewerResult};
use crate::gfx::camera::camera_utils::{DEFAULT_FAR, DEFAULT_FOV, DEFAULT_NEAR};

/// File looked for in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "diorama.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub assets: AssetConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            title: "Diorama".to_string(),
            fov: DEFAULT_FOV,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
        }
    }
}

/// Asset locations; everything but `shaders` is relative to `root`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub root: PathBuf,
    pub shaders: PathBuf,
    pub scene: PathBuf,
    pub cat: PathBuf,
    pub box_diffuse: PathBuf,
    pub box_specular: PathBuf,
    pub sphere_diffuse: PathBuf,
    pub sphere_specular: PathBuf,
    pub water: PathBuf,
    pub fire: PathBuf,
    /// Directory holding the six cube map faces
    pub skybox: PathBuf,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: "res".into(),
            shaders: "shaders".into(),
            scene: "Models/Scene/scene.glb".into(),
            cat: "Models/Cat/cat.glb".into(),
            box_diffuse: "Models/Box/Diffuse.png".into(),
            box_specular: "Models/Box/Specular.png".into(),
            sphere_diffuse: "Models/Icosphere/Diffuse.png".into(),
            sphere_specular: "Models/Icosphere/Specular.png".into(),
            water: "Models/Water/water.png".into(),
            fire: "Models/Fire/fire.png".into(),
            skybox: "Models/Cubemap".into(),
        }
    }
}

impl AssetConfig {
    /// Path of an asset below the root
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }
}

impl ViewerConfig {
    pub fn from_toml(contents: &str) -> ViewerResult<Self> {
        toml::from_str(contents).map_err(|e| ViewerError::Config(e.to_string()))
    }

    pub fn load_from_file(path: &Path) -> ViewerResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&contents)?;
        info!("Loaded configuration from '{}'", path.display());
        Ok(config)
    }

    /// Loads `path`, else [`DEFAULT_CONFIG_FILE`] when present, else defaults
    pub fn load(path: Option<&Path>) -> ViewerResult<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::load_from_file(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}
