//! Room synchronization.
//!
//! One `SyncClient` per session owns the channel to the host. Outbound
//! traffic goes through an `Outbox` the simulation fills and the transport
//! drains; inbound traffic is pulled with a short timeout once per frame and
//! funneled through a single dispatch that applies each message to the
//! session context. The host's word is final, including for the local
//! actor: a room snapshot overwrites whatever the client predicted.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use duel_shared::{
    config::SessionConfig,
    protocol::{Channel, ClientMsg, HostMsg, SessionId, PROTOCOL_VERSION},
    room::Room,
};
use tracing::{debug, info, warn};

use crate::session::{RemoteActor, SessionContext};

/// How long one inbound poll may wait before the frame goes on without it.
const POLL_TIMEOUT: Duration = Duration::from_millis(2);

/// Shown when the host rejects a join because the room already has two.
pub const ROOM_FULL_NOTICE: &str = "Room is full. Try another room.";

/// Outbound command queue, filled by the simulation and drained by the
/// transport once per frame.
#[derive(Debug, Default)]
pub struct Outbox {
    queued: Vec<ClientMsg>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, msg: ClientMsg) {
        self.queued.push(msg);
    }

    pub fn drain(&mut self) -> Vec<ClientMsg> {
        std::mem::take(&mut self.queued)
    }

    pub fn len(&self) -> usize {
        self.queued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }
}

/// Client side of the session connection.
pub struct SyncClient {
    channel: Channel,
    session_id: SessionId,
}

impl SyncClient {
    /// Connects to the host and performs the handshake.
    pub async fn connect(cfg: &SessionConfig) -> anyhow::Result<Self> {
        let addr: SocketAddr = cfg.host_addr.parse().context("parse host_addr")?;
        info!(host = %addr, "Connecting to session host");

        let mut channel = Channel::connect(addr).await?;
        channel
            .send(&ClientMsg::Hello {
                protocol: PROTOCOL_VERSION,
            })
            .await?;

        let welcome: HostMsg = channel.recv().await?;
        let session_id = match welcome {
            HostMsg::Welcome { session_id } => session_id,
            other => anyhow::bail!("expected Welcome, got {other:?}"),
        };

        info!(session_id = ?session_id, "Connected to session host");
        Ok(Self {
            channel,
            session_id,
        })
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Drains every queued inbound message into the session context.
    /// A channel error is terminal: the caller has to rebuild the
    /// connection and reset the lifecycle.
    pub async fn poll(&mut self, ctx: &mut SessionContext) -> anyhow::Result<()> {
        loop {
            match self.channel.recv_timeout::<HostMsg>(POLL_TIMEOUT).await {
                Ok(Some(msg)) => apply_host_msg(ctx, msg),
                Ok(None) => return Ok(()),
                Err(e) => {
                    warn!(error = %e, "Session channel lost");
                    return Err(e).context("session channel lost");
                }
            }
        }
    }

    /// Sends everything the simulation queued this frame.
    pub async fn flush(&mut self, outbox: &mut Outbox) -> anyhow::Result<()> {
        for msg in outbox.drain() {
            self.channel.send(&msg).await.context("send queued msg")?;
        }
        Ok(())
    }
}

/// Applies one host message to the session context.
pub fn apply_host_msg(ctx: &mut SessionContext, msg: HostMsg) {
    match msg {
        HostMsg::Welcome { session_id } => {
            // Identity is fixed during the handshake; a repeat is noise.
            debug!(session_id = ?session_id, "Unexpected Welcome");
        }
        HostMsg::UpdateRoom(room) => apply_room_update(ctx, room),
        HostMsg::RoomFull => {
            info!("Join rejected, room is full");
            ctx.notice = Some(ROOM_FULL_NOTICE.to_string());
        }
        HostMsg::GameOver { winner } => {
            ctx.lifecycle.finish(winner);
        }
    }
}

fn apply_room_update(ctx: &mut SessionContext, room: Room) {
    ctx.lifecycle.on_room_state(room.started);

    if let Some(mine) = room.participants.get(&ctx.session_id) {
        ctx.local = *mine;
    }

    match room.opponent_of(ctx.session_id) {
        Some((id, actor)) => {
            if ctx.opponent.as_ref().map(|o| o.id) != Some(id) {
                info!(opponent = ?id, "Opponent joined");
            }
            ctx.opponent = Some(RemoteActor { id, state: *actor });
        }
        None => {
            if let Some(gone) = ctx.opponent.take() {
                info!(opponent = ?gone.id, "Opponent left");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::SessionPhase;
    use duel_shared::actor::MAX_HEALTH;
    use duel_shared::room::{PRIMARY_SPAWN, SECONDARY_SPAWN};

    fn ctx_for(id: SessionId) -> SessionContext {
        SessionContext::new(id)
    }

    fn two_player_room(me: SessionId, other: SessionId) -> Room {
        let mut room = Room::new("R1");
        room.add_participant(me).unwrap();
        room.add_participant(other).unwrap();
        room.started = true;
        room
    }

    #[test]
    fn snapshot_overwrites_local_and_discovers_opponent() {
        let me = SessionId(1);
        let mut ctx = ctx_for(me);
        // Locally-predicted position that the host never saw.
        ctx.local.position.x = 99.0;

        apply_host_msg(&mut ctx, HostMsg::UpdateRoom(two_player_room(me, SessionId(2))));

        assert_eq!(ctx.lifecycle.phase(), SessionPhase::Playing);
        assert_eq!(ctx.local.position, PRIMARY_SPAWN);

        let opponent = ctx.opponent.as_ref().unwrap();
        assert_eq!(opponent.id, SessionId(2));
        assert_eq!(opponent.state.position, SECONDARY_SPAWN);
    }

    #[test]
    fn unstarted_room_waits() {
        let me = SessionId(1);
        let mut ctx = ctx_for(me);
        let mut room = Room::new("R1");
        room.add_participant(me).unwrap();

        apply_host_msg(&mut ctx, HostMsg::UpdateRoom(room));
        assert_eq!(ctx.lifecycle.phase(), SessionPhase::Waiting);
        assert!(ctx.opponent.is_none());
    }

    #[test]
    fn missing_opponent_tears_down_and_health_reads_full() {
        let me = SessionId(1);
        let mut ctx = ctx_for(me);

        let mut room = two_player_room(me, SessionId(2));
        room.actor_mut(SessionId(2)).unwrap().health = 40.0;
        apply_host_msg(&mut ctx, HostMsg::UpdateRoom(room.clone()));
        assert_eq!(ctx.opponent_health(), 40.0);

        room.remove_participant(SessionId(2)).unwrap();
        apply_host_msg(&mut ctx, HostMsg::UpdateRoom(room));
        assert!(ctx.opponent.is_none());
        assert_eq!(ctx.opponent_health(), MAX_HEALTH);
    }

    #[test]
    fn room_full_leaves_lifecycle_idle() {
        let mut ctx = ctx_for(SessionId(3));
        apply_host_msg(&mut ctx, HostMsg::RoomFull);

        assert_eq!(ctx.notice.as_deref(), Some(ROOM_FULL_NOTICE));
        assert_eq!(ctx.lifecycle.phase(), SessionPhase::Idle);
    }

    #[test]
    fn duplicate_game_over_keeps_first_winner() {
        let me = SessionId(1);
        let mut ctx = ctx_for(me);
        apply_host_msg(&mut ctx, HostMsg::UpdateRoom(two_player_room(me, SessionId(2))));

        apply_host_msg(&mut ctx, HostMsg::GameOver { winner: me });
        apply_host_msg(&mut ctx, HostMsg::GameOver { winner: SessionId(2) });

        assert_eq!(ctx.lifecycle.phase(), SessionPhase::Ended);
        assert_eq!(ctx.local_won(), Some(true));
    }
}
