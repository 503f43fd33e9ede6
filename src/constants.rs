// SPDX-License-Identifier: Apache-2.0

/// Kubernetes annotation marking objects owned by vaultingkube
pub mod annotations {
    /// Set to "true" on every ConfigMap/Secret this operator creates
    pub const MANAGED: &str = "vaultingkube.io/managed";
    /// Expected value of the managed annotation
    pub const MANAGED_VALUE: &str = "true";
}

/// Sync loop defaults
pub mod sync {
    /// Seconds between ticks when VK_SYNC_PERIOD is unset
    pub const DEFAULT_PERIOD_SECS: u64 = 300;
}
