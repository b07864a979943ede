//! Error taxonomy for the viewer
//!
//! Most variants describe failures that degrade a single resource: they are
//! logged where they happen and the resource falls back to an empty or
//! default value. Only [`ViewerError::SceneLoad`] and [`ViewerError::Config`]
//! are allowed to stop startup.

use std::path::PathBuf;

/// Errors raised while loading assets, compiling shaders or configuring the viewer
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    /// A mesh, texture or shader file is missing or malformed
    #[error("failed to load asset '{path}': {reason}")]
    AssetLoad { path: PathBuf, reason: String },

    /// A shader program failed validation
    #[error("failed to compile shader '{label}': {message}")]
    ShaderCompile { label: String, message: String },

    /// A uniform name is not part of the program's layout
    #[error("uniform '{0}' was not assigned in shader")]
    UniformNotFound(String),

    /// An accessor pointed outside its buffer while extracting vertex data
    #[error("attribute '{attribute}' overflows its buffer")]
    BufferOverflow { attribute: String },

    /// An attribute had an unsupported component type or count
    #[error("invalid shader attribute '{attribute}': {reason}")]
    InvalidShaderAttribute { attribute: String, reason: String },

    /// The scene file could not be read at all
    #[error("failed to load scene '{path}': {reason}")]
    SceneLoad { path: PathBuf, reason: String },

    /// The configuration file could not be parsed
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ViewerError {
    pub fn asset(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::AssetLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the frame loop may continue after this error
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::SceneLoad { .. } | Self::Config(_))
    }
}

pub type ViewerResult<T> = Result<T, ViewerError>;
