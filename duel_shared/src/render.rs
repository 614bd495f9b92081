//! Rendering abstraction.
//!
//! This crate intentionally does not depend on a graphics backend.
//! The simulation produces normalized pose parameters per actor per frame;
//! a renderer implementation consumes them and gives nothing back.

use crate::math::Vec3;

/// Weapon transform relative to the actor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponPose {
    pub offset: Vec3,
    pub roll: f32,
}

impl WeaponPose {
    /// Canonical rest transform: lowered at the right hip.
    pub fn rest() -> Self {
        Self {
            offset: Vec3::new(1.5, 2.5, 0.0),
            roll: -std::f32::consts::FRAC_PI_4,
        }
    }
}

/// Shield transform relative to the actor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShieldPose {
    pub offset: Vec3,
    pub yaw: f32,
    pub roll: f32,
}

impl ShieldPose {
    /// Canonical rest transform: slung at the left side.
    pub fn rest() -> Self {
        Self {
            offset: Vec3::new(-1.5, 2.5, 0.0),
            yaw: 0.0,
            roll: std::f32::consts::FRAC_PI_4,
        }
    }
}

/// Normalized pose parameters for one actor in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorPose {
    /// Limb swing angles in radians.
    pub left_leg: f32,
    pub right_leg: f32,
    pub left_arm: f32,
    pub right_arm: f32,
    pub weapon: WeaponPose,
    pub shield: ShieldPose,
}

impl Default for ActorPose {
    fn default() -> Self {
        Self {
            left_leg: 0.0,
            right_leg: 0.0,
            left_arm: 0.0,
            right_arm: 0.0,
            weapon: WeaponPose::rest(),
            shield: ShieldPose::rest(),
        }
    }
}

/// A minimal rendering API.
pub trait SceneRenderer: Send + Sync {
    fn begin_frame(&mut self);
    fn draw_actor(&mut self, position: Vec3, rotation_y: f32, pose: &ActorPose);
    fn draw_spark(&mut self, position: Vec3, scale: f32, lifetime: u32);
    fn resize(&mut self, width: u32, height: u32);
    fn end_frame(&mut self);
}

/// A no-op renderer useful for headless tests.
#[derive(Default)]
pub struct NullRenderer;

impl SceneRenderer for NullRenderer {
    fn begin_frame(&mut self) {}
    fn draw_actor(&mut self, _position: Vec3, _rotation_y: f32, _pose: &ActorPose) {}
    fn draw_spark(&mut self, _position: Vec3, _scale: f32, _lifetime: u32) {}
    fn resize(&mut self, _width: u32, _height: u32) {}
    fn end_frame(&mut self) {}
}
