//! Session control.
//!
//! `SessionContext` is the single owner of everything a frame touches:
//! both actors, lifecycle, transient effects, arena geometry, and the tick
//! counter. It is passed into each component call explicitly; nothing in
//! the simulation reaches for ambient state.
//!
//! `advance_frame` is one simulation step: input → movement → combat →
//! timers → effects → ambience → win check. It queues outbound messages
//! but never sends; `SessionController::run` owns the pacing loop and the
//! transport, and checks a cancellation token every iteration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use duel_shared::{
    actor::{ActorState, MAX_HEALTH},
    arena::{crowd_ring, standard_arena, CrowdMember, Obstacle},
    config::SessionConfig,
    math::Vec3,
    protocol::{ClientMsg, SessionId},
    render::{ActorPose, SceneRenderer},
    room::PRIMARY_SPAWN,
};
use tracing::debug;

use crate::{
    animation::AnimationDriver,
    combat,
    input::InputMap,
    lifecycle::{Lifecycle, SessionPhase},
    movement,
    sync::{Outbox, SyncClient},
};

/// Frames an impact flash stays alive.
pub const SPARK_LIFETIME: u32 = 20;
/// Per-frame shrink factor while it burns out.
pub const SPARK_SHRINK: f32 = 0.95;

const CROWD_TURN_RATE: f32 = 0.01;
const CROWD_BOB_RATE: f32 = 0.06;

/// Short-lived impact flash spawned on a landed hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitSpark {
    pub position: Vec3,
    pub lifetime: u32,
    pub scale: f32,
}

impl HitSpark {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            lifetime: SPARK_LIFETIME,
            scale: 1.0,
        }
    }
}

/// The opponent as mirrored from host snapshots. Gameplay code reads it;
/// only inbound sync writes it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemoteActor {
    pub id: SessionId,
    pub state: ActorState,
}

/// Everything one session owns.
#[derive(Debug)]
pub struct SessionContext {
    pub session_id: SessionId,
    pub room_id: Option<String>,
    pub local: ActorState,
    pub opponent: Option<RemoteActor>,
    pub lifecycle: Lifecycle,
    /// User-visible protocol rejection, e.g. a full room.
    pub notice: Option<String>,
    pub sparks: Vec<HitSpark>,
    pub obstacles: Vec<Obstacle>,
    pub crowd: Vec<CrowdMember>,
    pub tick: u64,
}

impl SessionContext {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            room_id: None,
            local: ActorState::spawn(PRIMARY_SPAWN, std::f32::consts::FRAC_PI_2, true),
            opponent: None,
            lifecycle: Lifecycle::new(),
            notice: None,
            sparks: Vec::new(),
            obstacles: standard_arena(),
            crowd: crowd_ring(&mut rand::thread_rng()),
            tick: 0,
        }
    }

    /// Opponent health as the UI reads it: full while nobody is there.
    pub fn opponent_health(&self) -> f32 {
        self.opponent
            .as_ref()
            .map(|o| o.state.health)
            .unwrap_or(MAX_HEALTH)
    }

    /// `Some(true)` once the match ended in the local player's favor.
    pub fn local_won(&self) -> Option<bool> {
        self.lifecycle.winner().map(|w| w == self.session_id)
    }

    /// Explicit restart: back to Idle with a fresh local actor, no
    /// opponent, and no leftover effects.
    pub fn restart(&mut self) {
        self.lifecycle.reset();
        self.room_id = None;
        self.notice = None;
        self.opponent = None;
        self.sparks.clear();
        self.local = ActorState::spawn(
            PRIMARY_SPAWN,
            std::f32::consts::FRAC_PI_2,
            self.local.is_primary_side,
        );
        self.tick = 0;
    }
}

/// Render-facing results of one frame.
#[derive(Debug)]
pub struct FrameOutput {
    pub local_pose: ActorPose,
    pub opponent_pose: Option<ActorPose>,
    /// Accumulated mouse-look delta, for the camera collaborator.
    pub look_delta: (f32, f32),
    pub free_look: bool,
}

/// One simulation step. Queues outbound messages into `outbox`; the
/// transport sends them after the frame.
pub fn advance_frame(
    ctx: &mut SessionContext,
    input: &mut InputMap,
    anim: &mut AnimationDriver,
    outbox: &mut Outbox,
) -> FrameOutput {
    let frame = input.sample();
    let room_id = ctx.room_id.clone().unwrap_or_default();

    // Movement; an accepted displacement is synced outward.
    let moved = movement::step_actor(&mut ctx.local, &ctx.obstacles, frame.move_x, frame.move_z);
    if moved.is_some() {
        outbox.push(ClientMsg::Move {
            room_id: room_id.clone(),
            position: ctx.local.position,
            rotation_y: ctx.local.rotation_y,
        });
    }

    // Attack edge; a refused entry is dropped without a message.
    if frame.attack {
        if let Some(entered) = combat::begin_attack(&ctx.local) {
            ctx.local = entered;
            outbox.push(ClientMsg::Attack {
                room_id: room_id.clone(),
            });

            if let Some(opponent) = &ctx.opponent {
                if let Some(hit) = combat::resolve_hit(&ctx.local, &opponent.state) {
                    debug!(target = ?opponent.id, damage = hit.damage, "Hit landed");
                    outbox.push(ClientMsg::UpdateHealth {
                        room_id: room_id.clone(),
                        target: opponent.id,
                        damage: hit.damage,
                    });
                    ctx.sparks.push(HitSpark::new(hit.spark_at));
                }
            }
        }
    }

    // Guard level; only actual edges reach the wire.
    if let Some(changed) = combat::set_blocking(&ctx.local, frame.block) {
        ctx.local = changed;
        outbox.push(ClientMsg::Block {
            room_id,
            is_blocking: ctx.local.is_blocking,
        });
    }

    ctx.local = ctx.local.advance_timers();

    // Burn down impact flashes.
    ctx.sparks.retain_mut(|spark| {
        spark.lifetime = spark.lifetime.saturating_sub(1);
        spark.scale *= SPARK_SHRINK;
        spark.lifetime > 0
    });

    advance_crowd(ctx);

    // Redundant local end check; the host's game-over lands on the same
    // idempotent transition, so double-firing is harmless.
    if let Some(opponent) = &ctx.opponent {
        if !ctx.local.is_alive() {
            ctx.lifecycle.finish(opponent.id);
        } else if !opponent.state.is_alive() {
            ctx.lifecycle.finish(ctx.session_id);
        }
    }

    ctx.tick += 1;

    let local_pose = anim.local_pose(&ctx.local, moved.is_some());
    let opponent_pose = match &ctx.opponent {
        Some(opponent) => Some(anim.remote_pose(&opponent.state)),
        None => {
            anim.forget_remote();
            None
        }
    };

    FrameOutput {
        local_pose,
        opponent_pose,
        look_delta: frame.look,
        free_look: frame.free_look,
    }
}

fn advance_crowd(ctx: &mut SessionContext) {
    for (i, person) in ctx.crowd.iter_mut().enumerate() {
        person.facing += CROWD_TURN_RATE;
        person.position.y =
            0.5 + ((ctx.tick as f32) * CROWD_BOB_RATE + i as f32).sin() * 0.1;
    }
}

/// Cooperative cancellation for the frame loop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Owns the context, the components, and the frame loop.
pub struct SessionController {
    pub ctx: SessionContext,
    pub input: InputMap,
    pub outbox: Outbox,
    anim: AnimationDriver,
    sync: SyncClient,
    cancel: CancelToken,
    tick_interval: Duration,
    pending_resize: Option<(u32, u32)>,
}

impl SessionController {
    /// Connects to the host and builds a fresh session around the
    /// assigned identity.
    pub async fn connect(cfg: &SessionConfig) -> anyhow::Result<Self> {
        let sync = SyncClient::connect(cfg).await?;
        let ctx = SessionContext::new(sync.session_id());
        Ok(Self {
            ctx,
            input: InputMap::new(),
            outbox: Outbox::new(),
            anim: AnimationDriver::new(),
            sync,
            cancel: CancelToken::new(),
            tick_interval: Duration::from_secs_f32(1.0 / cfg.tick_hz as f32),
            pending_resize: None,
        })
    }

    pub fn session_id(&self) -> SessionId {
        self.ctx.session_id
    }

    /// Token for stopping the loop from outside.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Queues the join request; the lifecycle moves once the host answers.
    pub fn join_room(&mut self, room_id: &str) {
        self.ctx.notice = None;
        self.ctx.room_id = Some(room_id.to_string());
        self.outbox.push(ClientMsg::JoinRoom {
            room_id: room_id.to_string(),
        });
    }

    /// Forwarded to the renderer at the top of the next frame.
    pub fn note_resize(&mut self, width: u32, height: u32) {
        self.pending_resize = Some((width, height));
    }

    pub fn restart(&mut self) {
        self.ctx.restart();
    }

    /// One loop iteration: drain inbound, simulate if playing, flush
    /// outbound. A channel error is terminal for the session.
    pub async fn step<R: SceneRenderer>(&mut self, renderer: &mut R) -> anyhow::Result<()> {
        self.sync.poll(&mut self.ctx).await?;

        if let Some((width, height)) = self.pending_resize.take() {
            renderer.resize(width, height);
        }

        if self.ctx.lifecycle.is_playing() {
            let output = advance_frame(&mut self.ctx, &mut self.input, &mut self.anim, &mut self.outbox);
            draw_frame(renderer, &self.ctx, &output);
        }

        self.sync.flush(&mut self.outbox).await?;
        Ok(())
    }

    /// Paced frame loop. Returns when the match ends, the token is
    /// cancelled, or the connection drops; no further ticks are scheduled
    /// after any of those.
    pub async fn run<R: SceneRenderer>(&mut self, renderer: &mut R) -> anyhow::Result<()> {
        let mut next = tokio::time::Instant::now();
        while !self.cancel.is_cancelled() {
            self.step(renderer).await?;
            if self.ctx.lifecycle.phase() == SessionPhase::Ended {
                break;
            }
            next += self.tick_interval;
            tokio::time::sleep_until(next).await;
        }
        Ok(())
    }
}

fn draw_frame<R: SceneRenderer>(renderer: &mut R, ctx: &SessionContext, output: &FrameOutput) {
    renderer.begin_frame();
    renderer.draw_actor(ctx.local.position, ctx.local.rotation_y, &output.local_pose);
    if let (Some(opponent), Some(pose)) = (&ctx.opponent, &output.opponent_pose) {
        renderer.draw_actor(opponent.state.position, opponent.state.rotation_y, pose);
    }
    for spark in &ctx.sparks {
        renderer.draw_spark(spark.position, spark.scale, spark.lifetime);
    }
    renderer.end_frame();
}
