// SPDX-License-Identifier: Apache-2.0

//! In-memory model of the Vault KV layout this operator consumes.
//!
//! Each Vault mount under the configured root maps one Kubernetes
//! (namespace, kind) pair: `<root>/<namespace>/<configmaps|secrets>`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::{Result, SyncError};

/// Which Kubernetes object kind a mount feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKind {
    ConfigMaps,
    Secrets,
}

impl SecretKind {
    /// The path segment / object word used in Vault paths and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            SecretKind::ConfigMaps => "configmaps",
            SecretKind::Secrets => "secrets",
        }
    }

    /// The Kubernetes object name, for log lines
    pub fn object_name(&self) -> &'static str {
        match self {
            SecretKind::ConfigMaps => "ConfigMap",
            SecretKind::Secrets => "Secret",
        }
    }
}

impl fmt::Display for SecretKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecretKind {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "configmaps" => Ok(SecretKind::ConfigMaps),
            "secrets" => Ok(SecretKind::Secrets),
            other => Err(SyncError::InvalidKind(other.to_string())),
        }
    }
}

/// One named key/value document read from a mount
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultSecret {
    pub name: String,
    pub pairs: BTreeMap<String, String>,
}

/// A Vault mount this operator cares about
#[derive(Debug, Clone)]
pub struct Mount {
    /// Full mount path as reported by Vault, without the trailing slash
    pub path: String,
    pub namespace: String,
    pub kind: SecretKind,
    pub secrets: Vec<VaultSecret>,
}

/// Decompose a mount path into its namespace and kind.
///
/// After stripping the root prefix there must be exactly two path
/// segments; anything else fails the whole listing.
pub fn split_mount(root: &str, path: &str) -> Result<(String, SecretKind)> {
    let root = root.trim_matches('/');
    let rest = path
        .trim_matches('/')
        .strip_prefix(root)
        .ok_or_else(|| SyncError::InvalidMount(path.to_string()))?
        .trim_matches('/');

    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() != 2 {
        return Err(SyncError::InvalidMount(path.to_string()));
    }

    Ok((segments[0].to_string(), segments[1].parse()?))
}

/// Convert a Vault secret document's data into flat string pairs.
///
/// Nested or non-string values are not supported; the first one found
/// fails the read.
pub fn pairs_from_data(
    path: &str,
    data: &serde_json::Map<String, Value>,
) -> Result<BTreeMap<String, String>> {
    let mut pairs = BTreeMap::new();
    for (key, value) in data {
        let Value::String(s) = value else {
            return Err(SyncError::NonStringValue {
                path: path.to_string(),
                key: key.clone(),
            });
        };
        pairs.insert(key.clone(), s.clone());
    }
    Ok(pairs)
}
