//! `duel_client`
//!
//! Client-side simulation core:
//! - Input capture and per-frame intent snapshots
//! - Movement with all-or-nothing obstacle collision
//! - Attack/block state machine with cooldown and swing timers
//! - Pose derivation for the rendering collaborator
//! - Room synchronization against the authoritative session host
//! - Session lifecycle and the paced frame loop

pub mod animation;
pub mod combat;
pub mod input;
pub mod lifecycle;
pub mod movement;
pub mod session;
pub mod sync;

pub use session::SessionController;
