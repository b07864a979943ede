//! Payloads of the render object kinds
//!
//! Kinds that share state across instances (the boxes' geometry, the sphere
//! morph clock, the fire light switch, the cat's walk) hold it behind an
//! `Rc`, so every instance of a kind sees the same value and the scene
//! controller can keep a handle of its own.

use std::cell::Cell;
use std::rc::Rc;

use cgmath::{Deg, Vector3};

use crate::gfx::backend::{GeometryId, TextureId};
use crate::gfx::resources::material::Material;

use super::layout::*;

/// The six boxes: three sizes, each either animated or translucent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoxType {
    BigT,
    MidT,
    SmlT,
    BigA,
    MidA,
    SmlA,
}

impl BoxType {
    pub fn scale(self) -> f32 {
        match self {
            BoxType::BigT | BoxType::BigA => BOX_SCALE_BIG,
            BoxType::MidT | BoxType::MidA => BOX_SCALE_MID,
            BoxType::SmlT | BoxType::SmlA => BOX_SCALE_SMALL,
        }
    }

    /// Blend factor of the translucent boxes
    pub fn alpha(self) -> Option<f32> {
        match self {
            BoxType::BigA => Some(BOX_ALPHA_BIG),
            BoxType::MidA => Some(BOX_ALPHA_MID),
            BoxType::SmlA => Some(BOX_ALPHA_SMALL),
            _ => None,
        }
    }

    /// Local axis and per-frame angle of the spinning boxes
    pub fn spin(self) -> Option<(Vector3<f32>, Deg<f32>)> {
        match self {
            BoxType::MidT => Some((Vector3::unit_y(), Deg(BOX_MID_SPIN))),
            BoxType::SmlT => Some((Vector3::unit_x(), Deg(BOX_SMALL_SPIN))),
            _ => None,
        }
    }
}

/// Geometry and textures every box draws with
#[derive(Debug, Clone, Copy)]
pub struct BoxShared {
    pub geometry: GeometryId,
    pub diffuse: Option<TextureId>,
    pub specular: Option<TextureId>,
}

#[derive(Debug, Clone)]
pub struct BoxPayload {
    pub box_type: BoxType,
    /// Toggled by picking the box
    pub animated: bool,
    pub shared: Rc<BoxShared>,
}

impl BoxPayload {
    pub fn new(box_type: BoxType, shared: Rc<BoxShared>) -> Self {
        Self {
            box_type,
            animated: false,
            shared,
        }
    }
}

/// Morph state shared by every sphere
#[derive(Debug, Default)]
pub struct SphereShared {
    pub morphing: Cell<bool>,
    pub morph_clock: Cell<f32>,
}

impl SphereShared {
    /// Advances the clock while morphing and returns the blend toward the unit sphere
    pub fn morph_amount(&self) -> f32 {
        if self.morphing.get() {
            self.morph_clock.set(self.morph_clock.get() + SPHERE_MORPH_STEP);
        }
        self.morph_clock.get().sin()
    }
}

#[derive(Debug, Clone)]
pub struct SpherePayload {
    pub geometry: GeometryId,
    pub diffuse: Option<TextureId>,
    pub specular: Option<TextureId>,
    pub shared: Rc<SphereShared>,
}

#[derive(Debug, Clone, Copy)]
pub struct CubeMapPayload {
    pub geometry: GeometryId,
    pub texture: Option<TextureId>,
}

#[derive(Debug, Clone, Copy)]
pub struct WaterPayload {
    pub geometry: GeometryId,
    pub texture: Option<TextureId>,
}

/// Whether the fire lights its surroundings
#[derive(Debug, Default)]
pub struct FireShared {
    pub point_light: Cell<bool>,
}

#[derive(Debug, Clone)]
pub struct FirePayload {
    pub geometry: GeometryId,
    pub texture: Option<TextureId>,
    pub columns: u32,
    pub rows: u32,
    pub frame_duration: f32,
    pub shared: Rc<FireShared>,
}

impl FirePayload {
    pub fn frame(&self, elapsed: f32) -> u32 {
        fire_frame(elapsed, self.frame_duration, self.columns, self.rows)
    }
}

/// Atlas cell shown after `elapsed` seconds: `floor(elapsed / duration) mod (columns * rows)`
pub fn fire_frame(elapsed: f32, duration: f32, columns: u32, rows: u32) -> u32 {
    let cells = columns * rows;
    if cells == 0 || duration <= 0.0 {
        return 0;
    }
    // Round first so that exact multiples of the duration are not lost to float error
    let ticks = ((elapsed as f64 / duration as f64) * 1e4).round() / 1e4;
    (ticks.floor().max(0.0) as u64 % cells as u64) as u32
}

/// Whether the cat walks its circle
#[derive(Debug, Default)]
pub struct CatShared {
    pub moving: Cell<bool>,
}

#[derive(Debug, Clone)]
pub struct CatPayload {
    pub geometry: GeometryId,
    pub material: Rc<Material>,
    pub shared: Rc<CatShared>,
}

/// A mesh from the scene file and the material it was exported with
#[derive(Debug, Clone)]
pub struct MeshRenderer {
    pub geometry: GeometryId,
    pub material: Rc<Material>,
}
