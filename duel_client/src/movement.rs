//! Movement solver.
//!
//! Converts a raw movement intent into an accepted displacement. Collision
//! is all-or-nothing: a candidate footprint overlapping any pillar rejects
//! the whole move, no sliding or partial resolution. The solver only
//! returns data; queuing the outbound `Move` is the caller's job.

use duel_shared::{actor::ActorState, arena::Obstacle, math::Vec3};

/// Distance covered per tick at full intent.
pub const MOVE_SPEED: f32 = 0.25;
/// Combatant footprint half extent used to expand obstacle boxes.
pub const ACTOR_HALF_WIDTH: f32 = 0.5;

/// An accepted displacement, ready to be synced outward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveOutcome {
    pub position: Vec3,
    pub rotation_y: f32,
}

/// Attempts one movement step. Returns `None` (actor untouched) for zero
/// intent or a collision rejection; otherwise updates position (y is never
/// touched) and facing, and reports the result.
pub fn step_actor(
    actor: &mut ActorState,
    obstacles: &[Obstacle],
    move_x: f32,
    move_z: f32,
) -> Option<MoveOutcome> {
    let intent = Vec3::new(move_x, 0.0, move_z);
    if intent.len_sq() == 0.0 {
        return None;
    }

    let direction = intent.normalized();
    let candidate = Vec3::new(
        actor.position.x + direction.x * MOVE_SPEED,
        actor.position.y,
        actor.position.z + direction.z * MOVE_SPEED,
    );

    if obstacles
        .iter()
        .any(|obstacle| obstacle.blocks(candidate, ACTOR_HALF_WIDTH))
    {
        return None;
    }

    actor.position = candidate;
    actor.rotation_y = direction.x.atan2(direction.z);
    Some(MoveOutcome {
        position: actor.position,
        rotation_y: actor.rotation_y,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor_at(x: f32, z: f32) -> ActorState {
        ActorState::spawn(Vec3::new(x, 2.0, z), 0.0, true)
    }

    #[test]
    fn zero_intent_changes_nothing() {
        let mut actor = actor_at(-10.0, 0.0);
        let before = actor;
        assert!(step_actor(&mut actor, &[], 0.0, 0.0).is_none());
        assert_eq!(actor, before);
    }

    #[test]
    fn north_intent_moves_by_speed_and_faces_north() {
        let mut actor = actor_at(0.0, 0.0);
        let outcome = step_actor(&mut actor, &[], 0.0, -1.0).unwrap();

        assert_eq!(outcome.position, Vec3::new(0.0, 2.0, -MOVE_SPEED));
        assert_eq!(actor.position, outcome.position);
        assert!((actor.rotation_y - std::f32::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn diagonal_intent_is_normalized() {
        let mut actor = actor_at(0.0, 0.0);
        step_actor(&mut actor, &[], 1.0, 1.0).unwrap();

        let moved = Vec3::new(actor.position.x, 0.0, actor.position.z).len();
        assert!((moved - MOVE_SPEED).abs() < 1e-6);
    }

    #[test]
    fn blocked_candidate_leaves_actor_in_place() {
        let wall = Obstacle::new(Vec3::new(1.0, 3.0, 0.0), Vec3::new(0.5, 3.0, 0.5));
        let mut actor = actor_at(0.0, 0.0);
        let before = actor;

        assert!(step_actor(&mut actor, &[wall], 1.0, 0.0).is_none());
        assert_eq!(actor, before);

        // Moving away from the wall still works.
        assert!(step_actor(&mut actor, &[wall], -1.0, 0.0).is_some());
    }
}
