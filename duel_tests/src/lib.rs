//! Shared support for the integration suite: background host, tracing
//! setup, and a step-until-condition driver for clients.

use std::net::SocketAddr;
use std::time::Duration;

use duel_client::SessionController;
use duel_host::SessionHost;
use duel_shared::render::NullRenderer;
use tokio::task::JoinHandle;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_test_writer()
        .try_init();
}

/// Binds a host to an ephemeral port and runs it in the background for up
/// to `steps` fixed steps. Abort the handle once the test is done with it.
pub async fn spawn_host(
    steps: u32,
) -> anyhow::Result<(JoinHandle<anyhow::Result<()>>, SocketAddr)> {
    let (mut host, addr) = SessionHost::bind_ephemeral().await?;
    let handle = tokio::spawn(async move {
        host.run_for_steps(steps, 250).await?;
        Ok::<_, anyhow::Error>(())
    });
    Ok((handle, addr))
}

/// Steps a client until `done` holds or the step budget runs out; returns
/// whether the condition was reached.
pub async fn drive_until<F>(
    client: &mut SessionController,
    renderer: &mut NullRenderer,
    max_steps: u32,
    mut done: F,
) -> anyhow::Result<bool>
where
    F: FnMut(&SessionController) -> bool,
{
    for _ in 0..max_steps {
        if done(client) {
            return Ok(true);
        }
        client.step(renderer).await?;
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    Ok(done(client))
}
