//! Daemon entry point: configuration, discovery, and signal wiring.

use anyhow::Context;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use powercapd::calc::PowerStrategy;
use powercapd::config::Config;
use powercapd::controller::Controller;
use powercapd::market::Provider;
use powercapd::node::HttpNodeState;
use powercapd::powercap::PowercapManager;
use powercapd::store::CsvDataStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("failed to load configuration")?;
    info!(
        node = %config.node_name,
        provider = ?config.provider,
        strategy = ?config.strategy,
        timezone = %config.timezone,
        "starting power-cap controller"
    );

    let powercap = PowercapManager::discover(&config.powercap_root)
        .context("failed to discover power domains")?;

    let provider = Provider::from_config(&config).context("failed to construct data provider")?;
    let store = CsvDataStore::new(provider, config.data_dir.clone());
    let strategy = PowerStrategy::from_config(&config);
    let sync = HttpNodeState::new(
        &config.coordinator_url,
        &config.node_name,
        config.coordinator_token.clone(),
    )
    .context("failed to construct coordinator client")?;

    let mut controller = Controller::new(config, powercap, store, strategy, sync);
    controller.start().await.context("failed to initialize node")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "cannot listen for shutdown signal");
            return;
        }
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    controller.run(shutdown_rx).await;
    Ok(())
}
