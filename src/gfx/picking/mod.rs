//! # Stencil picking
//!
//! A right click only records the pixel. During the next frame the scene is
//! drawn once more into the depth-stencil buffer with colour writes off,
//! object `i` writing the stencil reference `i + 1`, and the stencil value
//! under the cursor is read back. Zero means nothing was hit. Objects past
//! [`MAX_PICKABLE`] write zero: they still hide what is behind them but
//! cannot be picked.
//!
//! [`PickingState`] tracks the two indices that survive between frames: the
//! freshly picked object and the highlighted one. Picking the highlighted
//! object again clears the highlight.

use log::debug;

/// Largest object count the 8-bit stencil can tell apart
pub const MAX_PICKABLE: usize = u8::MAX as usize;

/// Where the selection state machine currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Idle,
    /// A pick was requested and waits for the next frame
    PendingPick { x: u32, y: u32 },
    Highlighted(usize),
}

/// Stencil reference written by the object at `index`, zero past [`MAX_PICKABLE`]
pub fn stencil_reference(index: usize) -> u32 {
    if index < MAX_PICKABLE {
        (index + 1) as u32
    } else {
        0
    }
}

/// Object index tagged by a stencil value, `None` for the cleared value
pub fn resolve_stencil(value: u8) -> Option<usize> {
    match value {
        0 => None,
        v => Some(v as usize - 1),
    }
}

#[derive(Debug, Clone, Default)]
pub struct PickingState {
    pending: Option<(u32, u32)>,
    picked: Option<usize>,
    highlighted: Option<usize>,
}

impl PickingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SelectionState {
        match (self.pending, self.highlighted) {
            (Some((x, y)), _) => SelectionState::PendingPick { x, y },
            (None, Some(index)) => SelectionState::Highlighted(index),
            (None, None) => SelectionState::Idle,
        }
    }

    /// Queues a pick at a pixel with a bottom-left origin
    pub fn request(&mut self, x: u32, y: u32) {
        self.pending = Some((x, y));
    }

    pub fn take_request(&mut self) -> Option<(u32, u32)> {
        self.pending.take()
    }

    /// Records the outcome of a picking pass
    ///
    /// `None` covers both a miss and an object that consumed the pick by
    /// toggling one of its flags.
    pub fn set_picked(&mut self, picked: Option<usize>) {
        debug!("Picked object: {:?}", picked);
        self.picked = picked;
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    /// Object to draw highlighted this frame
    ///
    /// A fresh pick of the highlighted object clears the highlight; a fresh
    /// pick of anything else moves it there; without a fresh pick the
    /// previous highlight persists.
    pub fn highlight_target(&mut self) -> Option<usize> {
        match (self.picked.take(), self.highlighted) {
            (Some(picked), Some(current)) if picked == current => {
                self.highlighted = None;
                None
            }
            (Some(picked), _) => {
                self.highlighted = Some(picked);
                Some(picked)
            }
            (None, current) => current,
        }
    }
}
