//! Pose derivation.
//!
//! Maps combat state and the per-frame "did move" flag into the normalized
//! pose parameters the renderer consumes. Nothing here touches gameplay
//! state: the walk cycle is the only memory this module keeps, one per
//! actor, so limbs can ease back to rest instead of snapping.

use duel_shared::{
    actor::ActorState,
    math::Vec3,
    render::{ActorPose, ShieldPose, WeaponPose},
};

/// Walk phase advance per moving tick.
pub const WALK_PHASE_STEP: f32 = 0.3;
/// Per-tick damping applied to limb angles while standing still.
pub const LIMB_DAMPING: f32 = 0.9;

const LEG_SWING: f32 = 0.5;
const ARM_SWING: f32 = 0.3;

/// Per-actor walk cycle state.
#[derive(Debug, Default)]
struct WalkCycle {
    phase: f32,
    left_leg: f32,
    right_leg: f32,
    left_arm: f32,
    right_arm: f32,
    last_position: Option<Vec3>,
}

impl WalkCycle {
    fn advance(&mut self, moving: bool) {
        if moving {
            self.phase += WALK_PHASE_STEP;
            self.left_leg = self.phase.sin() * LEG_SWING;
            self.right_leg = (self.phase + std::f32::consts::PI).sin() * LEG_SWING;
            self.left_arm = (self.phase + std::f32::consts::PI).sin() * ARM_SWING;
            self.right_arm = self.phase.sin() * ARM_SWING;
        } else {
            self.left_leg *= LIMB_DAMPING;
            self.right_leg *= LIMB_DAMPING;
            self.left_arm *= LIMB_DAMPING;
            self.right_arm *= LIMB_DAMPING;
        }
    }
}

/// Derives render poses for the local actor and the mirrored opponent.
#[derive(Debug, Default)]
pub struct AnimationDriver {
    local: WalkCycle,
    remote: WalkCycle,
}

impl AnimationDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Local actor pose; `moved` comes straight from the movement solver.
    pub fn local_pose(&mut self, actor: &ActorState, moved: bool) -> ActorPose {
        self.local.advance(moved);
        compose_pose(&self.local, actor)
    }

    /// Opponent pose. The mirror carries no movement flag, so motion is
    /// detected from the position delta between snapshots.
    pub fn remote_pose(&mut self, actor: &ActorState) -> ActorPose {
        let moved = self
            .remote
            .last_position
            .map(|last| last.distance(actor.position) > f32::EPSILON)
            .unwrap_or(false);
        self.remote.last_position = Some(actor.position);
        self.remote.advance(moved);
        compose_pose(&self.remote, actor)
    }

    /// Drops the opponent's walk state when the actor is torn down.
    pub fn forget_remote(&mut self) {
        self.remote = WalkCycle::default();
    }
}

fn compose_pose(walk: &WalkCycle, actor: &ActorState) -> ActorPose {
    let mut pose = ActorPose {
        left_leg: walk.left_leg,
        right_leg: walk.right_leg,
        left_arm: walk.left_arm,
        right_arm: walk.right_arm,
        ..Default::default()
    };

    if actor.is_attacking && actor.attack_progress <= 1.0 {
        let swing = (actor.attack_progress * std::f32::consts::PI).sin();
        pose.weapon = WeaponPose {
            offset: Vec3::new(
                1.5 + swing * 0.5,
                2.5,
                (actor.attack_progress * std::f32::consts::PI).cos() * 0.5,
            ),
            roll: -std::f32::consts::FRAC_PI_4 + swing * std::f32::consts::FRAC_PI_2,
        };
    } else if actor.is_blocking {
        let oscillation = (actor.block_progress * std::f32::consts::TAU).sin() * 0.1;
        pose.shield = ShieldPose {
            offset: Vec3::new(-1.0, 3.0 + oscillation, 0.5),
            yaw: std::f32::consts::FRAC_PI_2,
            roll: std::f32::consts::FRAC_PI_4 + oscillation,
        };
    }

    pose
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle_actor() -> ActorState {
        ActorState::spawn(Vec3::new(0.0, 2.0, 0.0), 0.0, true)
    }

    #[test]
    fn walk_swings_while_moving_and_eases_to_rest() {
        let mut driver = AnimationDriver::new();
        let actor = idle_actor();

        let walking = driver.local_pose(&actor, true);
        assert!(walking.left_leg.abs() > 0.0);
        // Counter-phase limbs.
        assert!((walking.left_leg + walking.right_leg).abs() < 1e-6);

        let mut last = walking.left_leg.abs();
        for _ in 0..5 {
            let settling = driver.local_pose(&actor, false);
            assert!(settling.left_leg.abs() < last);
            assert!(settling.left_leg.abs() > 0.0);
            last = settling.left_leg.abs();
        }
    }

    #[test]
    fn swing_peaks_mid_attack_and_rests_after() {
        let mut driver = AnimationDriver::new();
        let mut actor = idle_actor();
        actor.is_attacking = true;
        actor.attack_progress = 0.5;

        let mid = driver.local_pose(&actor, false);
        assert!((mid.weapon.roll - std::f32::consts::FRAC_PI_4).abs() < 1e-6);
        assert!((mid.weapon.offset.x - 2.0).abs() < 1e-6);

        actor.is_attacking = false;
        actor.attack_progress = 0.0;
        let after = driver.local_pose(&actor, false);
        assert_eq!(after.weapon, WeaponPose::rest());
    }

    #[test]
    fn guard_oscillates_and_weapon_stays_at_rest() {
        let mut driver = AnimationDriver::new();
        let mut actor = idle_actor();
        actor.is_blocking = true;
        actor.block_progress = 0.25;

        let pose = driver.local_pose(&actor, false);
        assert_eq!(pose.weapon, WeaponPose::rest());
        assert!((pose.shield.offset.y - 3.1).abs() < 1e-6);
        assert_eq!(pose.shield.yaw, std::f32::consts::FRAC_PI_2);
    }

    #[test]
    fn remote_motion_detected_from_position_delta() {
        let mut driver = AnimationDriver::new();
        let mut actor = idle_actor();

        // First sighting establishes the baseline, no motion yet.
        let first = driver.remote_pose(&actor);
        assert_eq!(first.left_leg, 0.0);

        actor.position = Vec3::new(0.25, 2.0, 0.0);
        let moving = driver.remote_pose(&actor);
        assert!(moving.left_leg.abs() > 0.0);
    }
}
