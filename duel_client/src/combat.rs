//! Combat transitions.
//!
//! Attack, block, and idle are mutually exclusive phases on `ActorState`.
//! Transitions are pure: they take the current state and return the next
//! one, or `None` when the request is invalid (already mid-swing, cooldown
//! still running, guard raised). Invalid requests are dropped silently; the
//! host remains the final authority either way.
//!
//! Hit resolution is aggressor-side: the attacking client decides whether
//! the swing connected and reports the damage. The host applies it and the
//! next room snapshot carries the authoritative health values back.

use duel_shared::{
    actor::{ActorState, ATTACK_COOLDOWN, ATTACK_DAMAGE, MELEE_RANGE},
    math::Vec3,
};

/// A swing that connected: damage owed and where the impact flash goes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitOutcome {
    pub damage: f32,
    pub spark_at: Vec3,
}

/// Attack entry. Refused while the cooldown runs, mid-swing, or while the
/// guard is up.
pub fn begin_attack(actor: &ActorState) -> Option<ActorState> {
    if actor.is_attacking || actor.is_blocking || actor.attack_cooldown > 0.0 {
        return None;
    }
    let mut next = *actor;
    next.is_attacking = true;
    next.attack_progress = 0.0;
    next.attack_cooldown = ATTACK_COOLDOWN;
    Some(next)
}

/// Mirrors the block key level onto the guard state. Returns the new state
/// only on an actual edge; raising the guard mid-swing is invalid and
/// lowering it when it was never up is a no-op.
pub fn set_blocking(actor: &ActorState, held: bool) -> Option<ActorState> {
    if held {
        if actor.is_blocking || actor.is_attacking {
            return None;
        }
        let mut next = *actor;
        next.is_blocking = true;
        Some(next)
    } else {
        if !actor.is_blocking {
            return None;
        }
        let mut next = *actor;
        next.is_blocking = false;
        next.block_progress = 0.0;
        Some(next)
    }
}

/// Decides whether a fresh swing connects with the opponent: within melee
/// range and the opponent's guard is down.
pub fn resolve_hit(attacker: &ActorState, defender: &ActorState) -> Option<HitOutcome> {
    if defender.is_blocking {
        return None;
    }
    if attacker.position.distance(defender.position) >= MELEE_RANGE {
        return None;
    }
    Some(HitOutcome {
        damage: ATTACK_DAMAGE,
        spark_at: defender.position + Vec3::new(0.0, 2.0, 0.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use duel_shared::actor::CombatPhase;

    fn idle_actor() -> ActorState {
        ActorState::spawn(Vec3::new(0.0, 2.0, 0.0), 0.0, true)
    }

    #[test]
    fn attack_entry_stamps_cooldown() {
        let actor = idle_actor();
        let entered = begin_attack(&actor).unwrap();
        assert_eq!(entered.phase(), CombatPhase::Attacking);
        assert_eq!(entered.attack_progress, 0.0);
        assert_eq!(entered.attack_cooldown, ATTACK_COOLDOWN);
    }

    #[test]
    fn attack_refused_while_cooldown_runs() {
        let entered = begin_attack(&idle_actor()).unwrap();
        assert!(begin_attack(&entered).is_none());

        // Swing over but cooldown still positive: still refused.
        let mut cooling = entered;
        cooling.is_attacking = false;
        cooling.attack_progress = 0.0;
        assert!(cooling.attack_cooldown > 0.0);
        assert!(begin_attack(&cooling).is_none());

        cooling.attack_cooldown = 0.0;
        assert!(begin_attack(&cooling).is_some());
    }

    #[test]
    fn attack_and_block_never_coexist() {
        let attacking = begin_attack(&idle_actor()).unwrap();
        assert!(set_blocking(&attacking, true).is_none());

        let guarding = set_blocking(&idle_actor(), true).unwrap();
        assert!(begin_attack(&guarding).is_none());
    }

    #[test]
    fn guard_release_clears_progress() {
        let mut guarding = set_blocking(&idle_actor(), true).unwrap();
        guarding.block_progress = 0.35;

        let lowered = set_blocking(&guarding, false).unwrap();
        assert!(!lowered.is_blocking);
        assert_eq!(lowered.block_progress, 0.0);

        // No edge: held while already up, released while already down.
        assert!(set_blocking(&guarding, true).is_none());
        assert!(set_blocking(&lowered, false).is_none());
    }

    #[test]
    fn hit_requires_range_and_open_guard() {
        let attacker = idle_actor();

        let mut near = idle_actor();
        near.position = Vec3::new(4.0, 2.0, 0.0);
        let hit = resolve_hit(&attacker, &near).unwrap();
        assert_eq!(hit.damage, ATTACK_DAMAGE);
        assert_eq!(hit.spark_at, Vec3::new(4.0, 4.0, 0.0));

        let mut far = near;
        far.position = Vec3::new(6.0, 2.0, 0.0);
        assert!(resolve_hit(&attacker, &far).is_none());

        let mut guarded = near;
        guarded.is_blocking = true;
        assert!(resolve_hit(&attacker, &guarded).is_none());
    }
}
