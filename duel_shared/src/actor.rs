//! Combatant state.
//!
//! One `ActorState` record per combatant, replicated verbatim in room
//! snapshots. The client owns one locally-predicted copy and mirrors the
//! opponent's copy from the host; the host keeps the authoritative pair.

use serde::{Deserialize, Serialize};

use crate::math::Vec3;

/// Upper health bound; actors spawn at this value.
pub const MAX_HEALTH: f32 = 100.0;
/// Damage dealt by one landed swing.
pub const ATTACK_DAMAGE: f32 = 20.0;
/// Maximum distance at which a swing can connect.
pub const MELEE_RANGE: f32 = 5.0;
/// Cooldown stamped on attack entry.
pub const ATTACK_COOLDOWN: f32 = 1.0;
/// Per-tick cooldown decay, applied whenever the cooldown is positive.
pub const COOLDOWN_DECAY: f32 = 0.05;
/// Per-tick swing progress while attacking; the swing ends past 1.0.
pub const ATTACK_PROGRESS_STEP: f32 = 0.1;
/// Per-tick guard progress while blocking.
pub const BLOCK_PROGRESS_STEP: f32 = 0.05;

/// Mutually exclusive combat phase derived from the state flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatPhase {
    Idle,
    Attacking,
    Blocking,
}

/// Full state of one combatant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActorState {
    pub position: Vec3,
    pub rotation_y: f32,
    pub health: f32,
    pub is_attacking: bool,
    pub is_blocking: bool,
    pub attack_cooldown: f32,
    /// Swing timer in [0, 1]; meaningful only while `is_attacking`.
    pub attack_progress: f32,
    /// Guard timer; accumulates while `is_blocking`, reset when it clears.
    pub block_progress: f32,
    /// Cosmetic side flag: first joiner gets the primary colors.
    pub is_primary_side: bool,
}

impl ActorState {
    /// Fresh combatant at a spawn slot.
    pub fn spawn(position: Vec3, rotation_y: f32, is_primary_side: bool) -> Self {
        Self {
            position,
            rotation_y,
            health: MAX_HEALTH,
            is_attacking: false,
            is_blocking: false,
            attack_cooldown: 0.0,
            attack_progress: 0.0,
            block_progress: 0.0,
            is_primary_side,
        }
    }

    pub fn phase(&self) -> CombatPhase {
        if self.is_attacking {
            CombatPhase::Attacking
        } else if self.is_blocking {
            CombatPhase::Blocking
        } else {
            CombatPhase::Idle
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Applies clamped damage. Returns `true` only on the hit that drops the
    /// actor to zero, so callers can fire a single defeat notification.
    pub fn apply_damage(&mut self, amount: f32) -> bool {
        let was_alive = self.is_alive();
        self.health = (self.health - amount).clamp(0.0, MAX_HEALTH);
        was_alive && !self.is_alive()
    }

    /// Advances the per-tick timers: swing progress, guard progress, and
    /// cooldown decay. A swing past 1.0 ends and the actor returns to idle.
    pub fn advance_timers(&self) -> Self {
        let mut next = *self;
        if next.is_attacking {
            next.attack_progress += ATTACK_PROGRESS_STEP;
            if next.attack_progress > 1.0 {
                next.is_attacking = false;
                next.attack_progress = 0.0;
            }
        }
        if next.is_blocking {
            next.block_progress += BLOCK_PROGRESS_STEP;
        }
        if next.attack_cooldown > 0.0 {
            next.attack_cooldown = (next.attack_cooldown - COOLDOWN_DECAY).max(0.0);
        }
        next
    }
}
