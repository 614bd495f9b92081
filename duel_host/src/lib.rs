//! `duel_host`
//!
//! Host-side systems:
//! - Fixed timestep step loop
//! - Session handshake and room membership
//! - Combat state relay between the two combatants of a room
//! - Win arbitration (first drop to zero health decides the match)
//!
//! Networking model: one reliable TCP channel per session; every message
//! is a length-prefixed JSON frame.

pub mod host;

pub use host::SessionHost;
