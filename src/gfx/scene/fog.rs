use cgmath::Vector3;

use super::layout::{FOG_COLOR, FOG_END, FOG_MAX, FOG_MIN, FOG_START, FOG_STEP};

/// Grey fog whose brightness drifts back and forth between two bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FogOscillator {
    pub enabled: bool,
    pub value: f32,
    pub step: f32,
    pub min: f32,
    pub max: f32,
    pub start: f32,
    pub end: f32,
}

impl Default for FogOscillator {
    fn default() -> Self {
        Self {
            enabled: false,
            value: FOG_COLOR,
            step: FOG_STEP,
            min: FOG_MIN,
            max: FOG_MAX,
            start: FOG_START,
            end: FOG_END,
        }
    }
}

impl FogOscillator {
    /// Advances one frame, reflecting the step at the bounds
    ///
    /// A step that would leave `[min, max]` is reversed and taken the other
    /// way instead, so the value never escapes the range.
    pub fn advance(&mut self) -> f32 {
        let next = self.value + self.step;
        if next < self.min || next > self.max {
            self.step = -self.step;
        }
        self.value = (self.value + self.step).clamp(self.min, self.max);
        self.value
    }

    pub fn color(&self) -> Vector3<f32> {
        Vector3::new(self.value, self.value, self.value)
    }

    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.enabled
    }
}
