//! Standalone host binary.
//!
//! Usage:
//!   cargo run -p duel_host -- [--addr 127.0.0.1:40600] [--tick-hz 60]
//!
//! The host accepts sessions, arbitrates rooms, and relays combat state
//! between the two combatants of each room.

use std::env;
use std::time::Duration;

use anyhow::Context;
use duel_host::host::SessionHost;
use duel_shared::config::SessionConfig;
use tracing::info;

fn parse_args() -> SessionConfig {
    let mut cfg = SessionConfig::default();
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--addr" if i + 1 < args.len() => {
                cfg.host_addr = args[i + 1].clone();
                i += 2;
            }
            "--tick-hz" if i + 1 < args.len() => {
                cfg.tick_hz = args[i + 1].parse().unwrap_or(60);
                i += 2;
            }
            _ => i += 1,
        }
    }
    cfg
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cfg = parse_args();
    info!(addr = %cfg.host_addr, tick_hz = cfg.tick_hz, "Starting host");

    let mut host = SessionHost::bind(cfg.host_addr.parse().context("parse host_addr")?)
        .await
        .context("bind host")?;
    let local = host.local_addr()?;
    info!(%local, "Host listening");

    let tick_interval = Duration::from_secs_f32(1.0 / cfg.tick_hz as f32);
    let mut next_tick = tokio::time::Instant::now();

    loop {
        // Accept new sessions (non-blocking); a botched handshake only
        // costs that connection.
        if let Ok(Some(id)) = host.try_accept(Duration::from_millis(1)).await {
            info!(session_id = ?id, "New session accepted");
        }

        host.step().await?;

        next_tick += tick_interval;
        tokio::time::sleep_until(next_tick).await;
    }
}
