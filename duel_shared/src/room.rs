//! Room model.
//!
//! A room is the host's matchmaking unit: a string id, up to two
//! participants, and a started flag that flips when the second combatant
//! arrives. The host owns the authoritative copy; clients only ever see it
//! inside `UpdateRoom` snapshots.

use std::collections::BTreeMap;
use std::f32::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

use crate::{actor::ActorState, math::Vec3, protocol::SessionId};

/// Two combatants per room, never more.
pub const ROOM_CAPACITY: usize = 2;

/// Spawn slots face each other across the arena center.
pub const PRIMARY_SPAWN: Vec3 = Vec3::new(-10.0, 2.0, 0.0);
pub const SECONDARY_SPAWN: Vec3 = Vec3::new(10.0, 2.0, 0.0);

/// Room operation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomError {
    RoomFull,
    AlreadyJoined,
    NotAMember,
}

/// A matchmaking room and its participants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Room {
    pub id: String,
    pub participants: BTreeMap<SessionId, ActorState>,
    pub started: bool,
}

impl Room {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            participants: BTreeMap::new(),
            started: false,
        }
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() >= ROOM_CAPACITY
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.participants.contains_key(&id)
    }

    /// Adds a combatant at the next free spawn slot.
    pub fn add_participant(&mut self, id: SessionId) -> Result<(), RoomError> {
        if self.contains(id) {
            return Err(RoomError::AlreadyJoined);
        }
        if self.is_full() {
            return Err(RoomError::RoomFull);
        }
        let actor = if self.participants.is_empty() {
            ActorState::spawn(PRIMARY_SPAWN, FRAC_PI_2, true)
        } else {
            ActorState::spawn(SECONDARY_SPAWN, -FRAC_PI_2, false)
        };
        self.participants.insert(id, actor);
        Ok(())
    }

    pub fn remove_participant(&mut self, id: SessionId) -> Result<(), RoomError> {
        self.participants
            .remove(&id)
            .map(|_| ())
            .ok_or(RoomError::NotAMember)
    }

    pub fn actor(&self, id: SessionId) -> Option<&ActorState> {
        self.participants.get(&id)
    }

    pub fn actor_mut(&mut self, id: SessionId) -> Option<&mut ActorState> {
        self.participants.get_mut(&id)
    }

    /// The other combatant, from `id`'s point of view.
    pub fn opponent_of(&self, id: SessionId) -> Option<(SessionId, &ActorState)> {
        self.participants
            .iter()
            .find(|(other, _)| **other != id)
            .map(|(other, actor)| (*other, actor))
    }
}
