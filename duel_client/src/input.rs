//! Input handling.
//!
//! The windowing layer delivers raw edge events (key down/up, mouse
//! button/motion); this module keeps the held-state map and hands the
//! simulation a point-in-time intent snapshot once per frame.
//!
//! Attack is edge-triggered (fires once per physical press), block is
//! level-triggered (active while held). Mouse-look deltas accumulate
//! between frames and are zeroed on read so an unconsumed frame never
//! drifts the camera.

use std::collections::HashMap;

/// Logical input codes the simulation cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputCode {
    Forward,
    Back,
    Left,
    Right,
    Attack,
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

/// Intent snapshot for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputFrame {
    /// Raw movement axes before normalization: +x is right, +z is back.
    pub move_x: f32,
    pub move_z: f32,
    /// True exactly once per physical attack press.
    pub attack: bool,
    /// True while the block key is held.
    pub block: bool,
    /// Mouse-look delta accumulated since the previous frame.
    pub look: (f32, f32),
    /// True while the free-look button is held.
    pub free_look: bool,
}

/// Held-state map plus edge/accumulator bookkeeping.
#[derive(Debug, Default)]
pub struct InputMap {
    held: HashMap<InputCode, bool>,
    attack_edge: bool,
    look_dx: f32,
    look_dy: f32,
    free_look: bool,
}

impl InputMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, code: InputCode) {
        if code == InputCode::Attack && !self.is_held(code) {
            self.attack_edge = true;
        }
        self.held.insert(code, true);
    }

    pub fn release(&mut self, code: InputCode) {
        self.held.insert(code, false);
    }

    pub fn mouse_button(&mut self, button: MouseButton, pressed: bool) {
        if button == MouseButton::Right {
            self.free_look = pressed;
        }
    }

    pub fn mouse_moved(&mut self, dx: f32, dy: f32) {
        self.look_dx += dx;
        self.look_dy += dy;
    }

    pub fn is_held(&self, code: InputCode) -> bool {
        self.held.get(&code).copied().unwrap_or(false)
    }

    /// Reads the current intent and consumes the attack edge and the
    /// accumulated look delta.
    pub fn sample(&mut self) -> InputFrame {
        let mut frame = InputFrame {
            block: self.is_held(InputCode::Block),
            attack: self.attack_edge,
            look: (self.look_dx, self.look_dy),
            free_look: self.free_look,
            ..Default::default()
        };
        if self.is_held(InputCode::Forward) {
            frame.move_z -= 1.0;
        }
        if self.is_held(InputCode::Back) {
            frame.move_z += 1.0;
        }
        if self.is_held(InputCode::Left) {
            frame.move_x -= 1.0;
        }
        if self.is_held(InputCode::Right) {
            frame.move_x += 1.0;
        }

        self.attack_edge = false;
        self.look_dx = 0.0;
        self.look_dy = 0.0;
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attack_fires_once_per_press() {
        let mut input = InputMap::new();
        input.press(InputCode::Attack);
        assert!(input.sample().attack);
        // Still held: no new edge until release + press.
        input.press(InputCode::Attack);
        assert!(!input.sample().attack);

        input.release(InputCode::Attack);
        input.press(InputCode::Attack);
        assert!(input.sample().attack);
    }

    #[test]
    fn block_is_level_held() {
        let mut input = InputMap::new();
        input.press(InputCode::Block);
        assert!(input.sample().block);
        assert!(input.sample().block);
        input.release(InputCode::Block);
        assert!(!input.sample().block);
    }

    #[test]
    fn opposed_keys_cancel_out() {
        let mut input = InputMap::new();
        input.press(InputCode::Forward);
        input.press(InputCode::Back);
        input.press(InputCode::Left);
        let frame = input.sample();
        assert_eq!(frame.move_z, 0.0);
        assert_eq!(frame.move_x, -1.0);
    }

    #[test]
    fn look_delta_resets_after_read() {
        let mut input = InputMap::new();
        input.mouse_button(MouseButton::Right, true);
        input.mouse_moved(0.2, -0.1);
        input.mouse_moved(0.3, 0.0);

        let frame = input.sample();
        assert!(frame.free_look);
        assert!((frame.look.0 - 0.5).abs() < 1e-6);
        assert!((frame.look.1 + 0.1).abs() < 1e-6);

        assert_eq!(input.sample().look, (0.0, 0.0));
    }
}
