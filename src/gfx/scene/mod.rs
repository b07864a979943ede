//! # Scene
//!
//! The diorama itself: a flat, ordered list of [`RenderObject`]s whose
//! transforms live in a [`TransformArena`], the lights, the camera rig and
//! the [`SceneController`] that turns input and elapsed time into frames.
//!
//! The object order is fixed at build time and doubles as the picking id:
//! object `i` writes stencil value `i + 1`, up to the 8-bit stencil limit.

pub mod builder;
pub mod controller;
pub mod fog;
pub mod layout;
pub mod objects;
pub mod render_object;
pub mod transform;
pub mod vertex;

pub use builder::{build_scene, SceneAssets};
pub use controller::{SceneController, SharedState};
pub use fog::FogOscillator;
pub use render_object::{RenderContext, RenderKind, RenderObject, Renderable};
pub use transform::{Transform, TransformArena, TransformId};
pub use vertex::Vertex3D;
