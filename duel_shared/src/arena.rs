//! Arena geometry.
//!
//! The arena is built once at session start and never changes: a circular
//! floor ringed by pillars that act as the only collidable volumes, plus a
//! purely decorative crowd ring outside them.

use rand::Rng;

use crate::math::Vec3;

pub const ARENA_RADIUS: f32 = 30.0;
pub const PILLAR_RING_RADIUS: f32 = 32.0;
pub const PILLAR_COUNT: usize = 16;
/// Pillar bounding half extents: roughly a 2x6x2 column.
pub const PILLAR_HALF_EXTENTS: Vec3 = Vec3::new(1.0, 3.0, 1.0);

pub const CROWD_SIZE: usize = 50;
pub const CROWD_INNER_RADIUS: f32 = 35.0;
pub const CROWD_RADIUS_JITTER: f32 = 5.0;

/// Static collidable volume, axis-aligned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl Obstacle {
    pub fn new(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    /// Tests a combatant footprint (x/z box around `at`, expanded by
    /// `half_width`) against this volume. Height is ignored: both actors
    /// and pillars stand on the arena floor.
    pub fn blocks(&self, at: Vec3, half_width: f32) -> bool {
        (at.x - self.center.x).abs() <= self.half_extents.x + half_width
            && (at.z - self.center.z).abs() <= self.half_extents.z + half_width
    }
}

/// A spectator around the arena: decorative only, never collided with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrowdMember {
    pub position: Vec3,
    pub facing: f32,
}

/// The standard pillar ring.
pub fn standard_arena() -> Vec<Obstacle> {
    (0..PILLAR_COUNT)
        .map(|i| {
            let angle = (i as f32 / PILLAR_COUNT as f32) * std::f32::consts::TAU;
            let center = Vec3::new(
                angle.cos() * PILLAR_RING_RADIUS,
                PILLAR_HALF_EXTENTS.y,
                angle.sin() * PILLAR_RING_RADIUS,
            );
            Obstacle::new(center, PILLAR_HALF_EXTENTS)
        })
        .collect()
}

/// Scatters the spectator ring just outside the pillars, facing inward.
pub fn crowd_ring<R: Rng>(rng: &mut R) -> Vec<CrowdMember> {
    (0..CROWD_SIZE)
        .map(|i| {
            let angle = (i as f32 / CROWD_SIZE as f32) * std::f32::consts::TAU;
            let radius = CROWD_INNER_RADIUS + rng.gen::<f32>() * CROWD_RADIUS_JITTER;
            CrowdMember {
                position: Vec3::new(angle.cos() * radius, 0.5, angle.sin() * radius),
                facing: -angle + std::f32::consts::PI,
            }
        })
        .collect()
}
