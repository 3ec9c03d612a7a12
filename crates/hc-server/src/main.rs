//! homecore daemon
//!
//! Usage: `homecore [config.yaml]`

use anyhow::Result;
use hc_config::{config_path, Config};
use hc_server::HomeCore;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load(config_path(std::env::args().nth(1)))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.system.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("Starting homecore");
    let (core, sensors) = HomeCore::start(config)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut sensor_loop = tokio::spawn(sensors.run(shutdown_rx));

    let mut sensors = tokio::select! {
        sensors = &mut sensor_loop => sensors?,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt received, finishing current cycle");
            let _ = shutdown_tx.send(true);
            sensor_loop.await?
        }
    };

    core.demonstrate();

    core.shutdown();
    sensors.shutdown();
    info!("homecore stopped");
    Ok(())
}
