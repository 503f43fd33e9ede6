// SPDX-License-Identifier: Apache-2.0
use anyhow::{bail, Context, Result};
use std::env;
use std::time::Duration;

use crate::constants::sync::DEFAULT_PERIOD_SECS;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Vault path under which namespace/kind mounts live
    pub root_mount_path: String,
    /// Time between reconciliation ticks
    pub sync_period: Duration,
    /// Whether managed objects no longer backed by Vault get deleted
    pub delete_old: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let root_mount_path = require_root_mount_path(env::var("VK_VAULT_ROOT_MOUNT_PATH").ok())?;

        let sync_period = parse_sync_period(env::var("VK_SYNC_PERIOD").ok().as_deref())?;
        let delete_old = parse_delete_old(env::var("VK_DELETE_OLD").ok().as_deref())?;

        Ok(Config {
            root_mount_path,
            sync_period,
            delete_old,
        })
    }
}

/// Require VK_VAULT_ROOT_MOUNT_PATH; a set-but-empty value counts as unset
pub fn require_root_mount_path(value: Option<String>) -> Result<String> {
    value
        .filter(|v| !v.is_empty())
        .context("VK_VAULT_ROOT_MOUNT_PATH environment variable not set")
}

/// Parse VK_SYNC_PERIOD as whole seconds, defaulting to 300
pub fn parse_sync_period(value: Option<&str>) -> Result<Duration> {
    let secs = match value {
        None | Some("") => DEFAULT_PERIOD_SECS,
        Some(v) => v
            .parse::<u64>()
            .with_context(|| format!("VK_SYNC_PERIOD {v:?} is not a whole number of seconds"))?,
    };
    Ok(Duration::from_secs(secs))
}

/// Parse VK_DELETE_OLD. Unset, empty, and "true" enable pruning,
/// "false" disables it, anything else refuses to start.
pub fn parse_delete_old(value: Option<&str>) -> Result<bool> {
    match value {
        None | Some("") | Some("true") => Ok(true),
        Some("false") => Ok(false),
        Some(other) => bail!("VK_DELETE_OLD must be \"true\" or \"false\", got {other:?}"),
    }
}
