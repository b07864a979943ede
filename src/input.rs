//! Keyboard and mouse vocabulary of the viewer
//!
//! winit key codes are translated into the small [`Key`] set the scene
//! reacts to; everything else is ignored before it reaches the scene.

use std::collections::HashSet;

use winit::event::MouseButton as WinitMouseButton;
use winit::keyboard::KeyCode;

use crate::gfx::camera::MoveDirection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    Space,
    C,
    R,
    G,
    V,
    F,
    Escape,
    Left,
    Right,
    Down,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Shift,
    Control,
}

impl Key {
    pub fn from_key_code(code: KeyCode) -> Option<Self> {
        let key = match code {
            KeyCode::KeyW => Key::W,
            KeyCode::KeyA => Key::A,
            KeyCode::KeyS => Key::S,
            KeyCode::KeyD => Key::D,
            KeyCode::Space => Key::Space,
            KeyCode::KeyC => Key::C,
            KeyCode::KeyR => Key::R,
            KeyCode::KeyG => Key::G,
            KeyCode::KeyV => Key::V,
            KeyCode::KeyF => Key::F,
            KeyCode::Escape => Key::Escape,
            KeyCode::ArrowLeft => Key::Left,
            KeyCode::ArrowRight => Key::Right,
            KeyCode::ArrowDown => Key::Down,
            KeyCode::Digit1 => Key::Digit1,
            KeyCode::Digit2 => Key::Digit2,
            KeyCode::Digit3 => Key::Digit3,
            KeyCode::Digit4 => Key::Digit4,
            KeyCode::ShiftLeft | KeyCode::ShiftRight => Key::Shift,
            KeyCode::ControlLeft | KeyCode::ControlRight => Key::Control,
            _ => return None,
        };
        Some(key)
    }

    /// Camera movement bound to a held key
    pub fn movement(self) -> Option<MoveDirection> {
        match self {
            Key::W => Some(MoveDirection::Front),
            Key::A => Some(MoveDirection::Left),
            Key::S => Some(MoveDirection::Back),
            Key::D => Some(MoveDirection::Right),
            Key::Space => Some(MoveDirection::Up),
            Key::C => Some(MoveDirection::Down),
            _ => None,
        }
    }

    /// Camera preset selected by a key
    pub fn camera_preset(self) -> Option<usize> {
        match self {
            Key::Down | Key::Digit1 => Some(0),
            Key::Digit2 => Some(1),
            Key::Digit3 => Some(2),
            Key::Digit4 => Some(3),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
}

impl MouseButton {
    pub fn from_winit(button: WinitMouseButton) -> Option<Self> {
        match button {
            WinitMouseButton::Left => Some(MouseButton::Left),
            WinitMouseButton::Right => Some(MouseButton::Right),
            _ => None,
        }
    }
}

/// Keys currently held down
#[derive(Debug, Clone, Default)]
pub struct HeldKeys {
    keys: HashSet<Key>,
}

impl HeldKeys {
    /// Records a transition; returns true when a released key became pressed
    pub fn update(&mut self, key: Key, pressed: bool) -> bool {
        if pressed {
            self.keys.insert(key)
        } else {
            self.keys.remove(&key);
            false
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.keys.contains(&key)
    }

    /// Movements of every held movement key
    pub fn movements(&self) -> impl Iterator<Item = MoveDirection> + '_ {
        self.keys.iter().filter_map(|key| key.movement())
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }
}
