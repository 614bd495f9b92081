//! Host implementation.
//!
//! The host is the single source of truth for room membership, match
//! start, and win condition. It runs a fixed-timestep loop:
//! - Accept new sessions (handshake: `Hello` → `Welcome`).
//! - Poll every peer channel with a short timeout and apply its messages.
//! - Decay combat timers on every participant.
//!
//! State relay is trust-the-aggressor: movement, attack, guard, and damage
//! reports are applied as sent and rebroadcast to the room. Damage that
//! drops a combatant to zero fires exactly one game-over.
//!
//! Determinism notes:
//! - Keep simulation in a fixed timestep.
//! - Avoid wall-clock-dependent branching in gameplay code.
//! - Use stable ordering when iterating collections.

use std::{
    collections::BTreeMap,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use anyhow::Context;
use duel_shared::{
    actor::ATTACK_COOLDOWN,
    math::Vec3,
    protocol::{Channel, ClientMsg, HostMsg, Listener, SessionId, PROTOCOL_VERSION},
    room::{Room, RoomError},
};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// How long one peer poll may wait inside a step.
const PEER_POLL_TIMEOUT: Duration = Duration::from_millis(1);

/// Connected session state.
struct Peer {
    channel: Channel,
    room_id: Option<String>,
}

/// Authoritative session host.
pub struct SessionHost {
    listener: Listener,
    peers: BTreeMap<SessionId, Peer>,
    rooms: BTreeMap<String, Room>,
    tick: u32,
}

impl SessionHost {
    /// Binds the host to the given address.
    pub async fn bind(addr: SocketAddr) -> anyhow::Result<Self> {
        let listener = Listener::bind(addr).await?;
        Ok(Self {
            listener,
            peers: BTreeMap::new(),
            rooms: BTreeMap::new(),
            tick: 0,
        })
    }

    /// Helper for tests: bind to an ephemeral port.
    pub async fn bind_ephemeral() -> anyhow::Result<(Self, SocketAddr)> {
        let bind = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0);
        let host = Self::bind(bind).await?;
        let addr = host.local_addr()?;
        Ok((host, addr))
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn session_count(&self) -> usize {
        self.peers.len()
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn room(&self, id: &str) -> Option<&Room> {
        self.rooms.get(id)
    }

    /// Accepts one session with a timeout (non-blocking from the loop's
    /// point of view).
    pub async fn try_accept(&mut self, timeout: Duration) -> anyhow::Result<Option<SessionId>> {
        match tokio::time::timeout(timeout, self.listener.accept()).await {
            Ok(Ok((conn, peer))) => self.handle_new_connection(conn, peer).await.map(Some),
            Ok(Err(e)) => Err(e),
            Err(_) => Ok(None), // Timeout
        }
    }

    async fn handle_new_connection(
        &mut self,
        mut conn: Channel,
        peer: SocketAddr,
    ) -> anyhow::Result<SessionId> {
        let msg: ClientMsg = conn.recv().await?;
        match msg {
            ClientMsg::Hello { protocol } if protocol == PROTOCOL_VERSION => {
                let id = SessionId::new_unique();
                conn.send(&HostMsg::Welcome { session_id: id }).await?;
                self.peers.insert(
                    id,
                    Peer {
                        channel: conn,
                        room_id: None,
                    },
                );
                info!(session_id = ?id, %peer, "Session connected");
                Ok(id)
            }
            other => anyhow::bail!("unexpected handshake msg: {other:?}"),
        }
    }

    /// Executes one fixed step: drain peer messages, then advance combat
    /// timers on every participant.
    pub async fn step(&mut self) -> anyhow::Result<()> {
        self.pump_peers().await?;

        for room in self.rooms.values_mut() {
            for actor in room.participants.values_mut() {
                *actor = actor.advance_timers();
            }
        }

        self.tick += 1;
        Ok(())
    }

    async fn pump_peers(&mut self) -> anyhow::Result<()> {
        let ids: Vec<SessionId> = self.peers.keys().copied().collect();
        let mut inbound = Vec::new();
        let mut dropped = Vec::new();

        for id in ids {
            let Some(peer) = self.peers.get_mut(&id) else {
                continue;
            };
            loop {
                match peer.channel.recv_timeout::<ClientMsg>(PEER_POLL_TIMEOUT).await {
                    Ok(Some(msg)) => inbound.push((id, msg)),
                    Ok(None) => break,
                    Err(e) => {
                        warn!(session_id = ?id, error = %e, "Peer channel lost");
                        dropped.push(id);
                        break;
                    }
                }
            }
        }

        for id in dropped {
            self.disconnect(id).await?;
        }
        for (id, msg) in inbound {
            // A peer that died mid-batch gets no say anymore.
            if self.peers.contains_key(&id) {
                self.handle_msg(id, msg).await?;
            }
        }
        Ok(())
    }

    /// Removes a session and tells its room the combatant is gone.
    async fn disconnect(&mut self, id: SessionId) -> anyhow::Result<()> {
        let Some(peer) = self.peers.remove(&id) else {
            return Ok(());
        };
        info!(session_id = ?id, "Session disconnected");

        if let Some(room_id) = peer.room_id {
            let emptied = if let Some(room) = self.rooms.get_mut(&room_id) {
                let _ = room.remove_participant(id);
                room.is_empty()
            } else {
                false
            };
            if emptied {
                self.rooms.remove(&room_id);
                debug!(room = %room_id, "Room emptied");
            } else {
                self.broadcast_room(&room_id).await?;
            }
        }
        Ok(())
    }

    async fn handle_msg(&mut self, from: SessionId, msg: ClientMsg) -> anyhow::Result<()> {
        match msg {
            ClientMsg::Hello { .. } => {
                debug!(session_id = ?from, "Duplicate Hello ignored");
            }
            ClientMsg::JoinRoom { room_id } => self.join_room(from, room_id).await?,
            ClientMsg::Move {
                room_id,
                position,
                rotation_y,
            } => {
                self.apply_move(from, &room_id, position, rotation_y);
                self.broadcast_room(&room_id).await?;
            }
            ClientMsg::Attack { room_id } => {
                self.apply_attack(from, &room_id);
                self.broadcast_room(&room_id).await?;
            }
            ClientMsg::Block {
                room_id,
                is_blocking,
            } => {
                self.apply_block(from, &room_id, is_blocking);
                self.broadcast_room(&room_id).await?;
            }
            ClientMsg::UpdateHealth {
                room_id,
                target,
                damage,
            } => self.apply_damage(from, &room_id, target, damage).await?,
        }
        Ok(())
    }

    async fn join_room(&mut self, from: SessionId, room_id: String) -> anyhow::Result<()> {
        let room = self
            .rooms
            .entry(room_id.clone())
            .or_insert_with(|| Room::new(room_id.clone()));

        match room.add_participant(from) {
            Ok(()) => {
                if room.is_full() {
                    room.started = true;
                    info!(room = %room_id, "Room full, match started");
                }
                if let Some(peer) = self.peers.get_mut(&from) {
                    peer.room_id = Some(room_id.clone());
                }
                info!(session_id = ?from, room = %room_id, "Joined room");
                self.broadcast_room(&room_id).await?;
            }
            Err(RoomError::RoomFull) => {
                debug!(session_id = ?from, room = %room_id, "Join rejected, room full");
                self.send_to(from, &HostMsg::RoomFull).await?;
            }
            Err(e) => {
                debug!(session_id = ?from, room = %room_id, error = ?e, "Join ignored");
            }
        }
        Ok(())
    }

    fn apply_move(&mut self, from: SessionId, room_id: &str, position: Vec3, rotation_y: f32) {
        if let Some(actor) = self
            .rooms
            .get_mut(room_id)
            .and_then(|room| room.actor_mut(from))
        {
            actor.position = position;
            actor.rotation_y = rotation_y;
        }
    }

    fn apply_attack(&mut self, from: SessionId, room_id: &str) {
        if let Some(actor) = self
            .rooms
            .get_mut(room_id)
            .and_then(|room| room.actor_mut(from))
        {
            if actor.attack_cooldown <= 0.0 {
                actor.is_attacking = true;
                actor.attack_progress = 0.0;
                actor.attack_cooldown = ATTACK_COOLDOWN;
            }
        }
    }

    fn apply_block(&mut self, from: SessionId, room_id: &str, is_blocking: bool) {
        if let Some(actor) = self
            .rooms
            .get_mut(room_id)
            .and_then(|room| room.actor_mut(from))
        {
            actor.is_blocking = is_blocking;
            if !is_blocking {
                actor.block_progress = 0.0;
            }
        }
    }

    async fn apply_damage(
        &mut self,
        from: SessionId,
        room_id: &str,
        target: SessionId,
        damage: f32,
    ) -> anyhow::Result<()> {
        let Some(actor) = self
            .rooms
            .get_mut(room_id)
            .and_then(|room| room.actor_mut(target))
        else {
            debug!(room = %room_id, target = ?target, "Damage for unknown target");
            return Ok(());
        };

        let defeated = actor.apply_damage(damage);
        info!(
            room = %room_id,
            target = ?target,
            damage,
            health = actor.health,
            "Damage applied"
        );
        self.broadcast_room(room_id).await?;

        if defeated {
            info!(room = %room_id, winner = ?from, "Match decided");
            self.broadcast(room_id, &HostMsg::GameOver { winner: from })
                .await?;
        }
        Ok(())
    }

    /// Sends the room snapshot to every participant.
    async fn broadcast_room(&mut self, room_id: &str) -> anyhow::Result<()> {
        let Some(room) = self.rooms.get(room_id).cloned() else {
            return Ok(());
        };
        self.broadcast(room_id, &HostMsg::UpdateRoom(room)).await
    }

    async fn broadcast(&mut self, room_id: &str, msg: &HostMsg) -> anyhow::Result<()> {
        let members: Vec<SessionId> = self
            .rooms
            .get(room_id)
            .map(|room| room.participants.keys().copied().collect())
            .unwrap_or_default();

        for id in members {
            self.send_to(id, msg).await?;
        }
        Ok(())
    }

    async fn send_to(&mut self, id: SessionId, msg: &HostMsg) -> anyhow::Result<()> {
        if let Some(peer) = self.peers.get_mut(&id) {
            // A failed send is handled like a disconnect on the next pump.
            if let Err(e) = peer.channel.send(msg).await {
                warn!(session_id = ?id, error = %e, "Send failed");
            }
        }
        Ok(())
    }

    /// Runs the host for a number of steps at the given rate.
    pub async fn run_for_steps(&mut self, steps: u32, tick_hz: u32) -> anyhow::Result<()> {
        let dt = Duration::from_secs_f32(1.0 / tick_hz as f32);
        let mut next = Instant::now();

        for _ in 0..steps {
            next += dt;
            self.try_accept(Duration::from_millis(1)).await?;
            self.step().await.context("host step")?;
            tokio::time::sleep_until(next).await;
        }
        Ok(())
    }
}
