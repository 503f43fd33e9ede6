// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use kube::Client;
use tokio::signal;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use vaultingkube::config::Config;
use vaultingkube::kubernetes::ClusterSink;
use vaultingkube::sync::run_tick;
use vaultingkube::vault::VaultClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Started with sync period every {} seconds",
        config.sync_period.as_secs()
    );

    // Long-lived client handles, constructed once for the process lifetime
    let vault = VaultClient::from_env()?;
    let client = Client::try_default().await?;
    let sink = ClusterSink::new(client);
    info!("Connected to Kubernetes cluster");

    let mut ticker = interval(config.sync_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The interval's first tick completes immediately; consume it so the
    // first reconciliation happens one full period after startup.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_tick(&vault, &sink, &config).await?;
            }
            _ = signal::ctrl_c() => {
                info!("Received shutdown signal, exiting");
                return Ok(());
            }
        }
    }
}
