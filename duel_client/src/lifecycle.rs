//! Session lifecycle.
//!
//! Idle → Waiting → Playing → Ended, with Ended → Idle only on an explicit
//! restart. Two things can end a match (the host's game-over message and
//! the local health check), so `finish` is idempotent: the first caller
//! records the winner, the second is a no-op.

use duel_shared::protocol::SessionId;
use tracing::info;

/// Where the session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No room joined.
    Idle,
    /// Room joined, host has not started the match.
    Waiting,
    /// Match running; the per-frame tick is live.
    Playing,
    /// Match decided. Only `reset` leaves this phase.
    Ended,
}

#[derive(Debug)]
pub struct Lifecycle {
    phase: SessionPhase,
    winner: Option<SessionId>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Idle,
            winner: None,
        }
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn winner(&self) -> Option<SessionId> {
        self.winner
    }

    pub fn is_playing(&self) -> bool {
        self.phase == SessionPhase::Playing
    }

    /// Follows the host's room snapshot: Waiting until the room starts,
    /// Playing afterwards. A decided match never reopens.
    pub fn on_room_state(&mut self, started: bool) {
        if self.phase == SessionPhase::Ended {
            return;
        }
        let next = if started {
            SessionPhase::Playing
        } else {
            SessionPhase::Waiting
        };
        if next != self.phase {
            info!(from = ?self.phase, to = ?next, "Session phase change");
            self.phase = next;
        }
    }

    /// Ends the match once. Returns whether this call did the transition.
    pub fn finish(&mut self, winner: SessionId) -> bool {
        if self.phase == SessionPhase::Ended {
            return false;
        }
        info!(winner = ?winner, "Match over");
        self.phase = SessionPhase::Ended;
        self.winner = Some(winner);
        true
    }

    /// Explicit restart back to Idle.
    pub fn reset(&mut self) {
        self.phase = SessionPhase::Idle;
        self.winner = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_room_start_flag() {
        let mut lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.phase(), SessionPhase::Idle);

        lifecycle.on_room_state(false);
        assert_eq!(lifecycle.phase(), SessionPhase::Waiting);

        lifecycle.on_room_state(true);
        assert_eq!(lifecycle.phase(), SessionPhase::Playing);
    }

    #[test]
    fn finish_is_idempotent() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.on_room_state(true);

        assert!(lifecycle.finish(SessionId(1)));
        assert!(!lifecycle.finish(SessionId(2)));
        assert_eq!(lifecycle.winner(), Some(SessionId(1)));
        assert_eq!(lifecycle.phase(), SessionPhase::Ended);

        // Late snapshots cannot reopen a decided match.
        lifecycle.on_room_state(true);
        assert_eq!(lifecycle.phase(), SessionPhase::Ended);
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.on_room_state(true);
        lifecycle.finish(SessionId(1));

        lifecycle.reset();
        assert_eq!(lifecycle.phase(), SessionPhase::Idle);
        assert_eq!(lifecycle.winner(), None);
    }
}
