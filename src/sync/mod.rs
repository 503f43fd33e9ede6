// SPDX-License-Identifier: Apache-2.0

//! The per-tick reconciliation loop: Vault mounts in, cluster objects out.

use tracing::{error, info, instrument};

use crate::config::Config;
use crate::error::Result;
use crate::kubernetes::ClusterSink;
use crate::vault::{Mount, VaultClient};

/// Run one full reconciliation tick.
///
/// A fetch or prune failure is fatal and propagates to the caller; upsert
/// failures are isolated per secret inside [`apply_mounts`].
#[instrument(skip(vault, sink, config))]
pub async fn run_tick(vault: &VaultClient, sink: &ClusterSink, config: &Config) -> Result<()> {
    let mounts = vault.get_mounts(&config.root_mount_path).await?;
    apply_mounts(sink, &mounts).await;
    if config.delete_old {
        sink.prune_unmatched(&mounts).await?;
    }
    Ok(())
}

/// Create or update the cluster object behind every Vault secret.
///
/// Objects that exist without the managed annotation are skipped with a
/// notice. A failed upsert is logged and does not stop the remaining
/// secrets. No ordering is guaranteed across mounts or secrets.
pub async fn apply_mounts(sink: &ClusterSink, mounts: &[Mount]) {
    for mount in mounts {
        for secret in &mount.secrets {
            let object = mount.kind.object_name();
            if !sink
                .is_managed(&secret.name, mount.kind, &mount.namespace)
                .await
            {
                info!(
                    "{} {} in namespace {} is not managed by vaultingkube, ignoring",
                    object, secret.name, mount.namespace
                );
                continue;
            }
            match sink
                .upsert(mount.kind, &secret.name, &mount.namespace, &secret.pairs)
                .await
            {
                Ok(()) => info!("Set {} for {}/{}", object, mount.namespace, secret.name),
                Err(e) => error!(
                    "Failed to set {} {}/{}: {}",
                    object, mount.namespace, secret.name, e
                ),
            }
        }
    }
}
