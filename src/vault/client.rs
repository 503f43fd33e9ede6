// SPDX-License-Identifier: Apache-2.0

//! Vault KV v1 client over the plain HTTP API.

use std::env;
use std::time::Duration;

use anyhow::Context;
use reqwest::{Method, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::{Result, SyncError};
use crate::vault::mounts::{pairs_from_data, split_mount, Mount, VaultSecret};

const DEFAULT_VAULT_ADDR: &str = "http://127.0.0.1:8200";
const VAULT_TOKEN_HEADER: &str = "X-Vault-Token";
const KV_MOUNT_TYPE: &str = "kv";

/// Long-lived handle to the Vault HTTP API
#[derive(Debug, Clone)]
pub struct VaultClient {
    http: reqwest::Client,
    addr: Url,
    token: String,
}

#[derive(Deserialize)]
struct KeyListResponse {
    data: KeyListData,
}

#[derive(Deserialize)]
struct KeyListData {
    #[serde(default)]
    keys: Vec<String>,
}

#[derive(Deserialize)]
struct SecretReadResponse {
    data: serde_json::Map<String, Value>,
}

impl VaultClient {
    /// Build a client from the standard VAULT_ADDR/VAULT_TOKEN environment
    pub fn from_env() -> anyhow::Result<Self> {
        let addr = env::var("VAULT_ADDR").unwrap_or_else(|_| DEFAULT_VAULT_ADDR.to_string());
        let addr: Url = addr
            .parse()
            .with_context(|| format!("VAULT_ADDR {addr:?} is not a valid URL"))?;
        let token = env::var("VAULT_TOKEN").unwrap_or_default();

        Self::new(addr, token)
    }

    /// Build a client for a known address and token
    pub fn new(addr: Url, token: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build Vault HTTP client")?;

        Ok(VaultClient {
            http,
            addr,
            token: token.into(),
        })
    }

    async fn request(&self, method: Method, path: &str) -> Result<Response> {
        let url = self
            .addr
            .join(&format!("v1/{}", path.trim_start_matches('/')))
            .map_err(|e| SyncError::VaultApi(format!("invalid Vault path {path:?}: {e}")))?;
        debug!("Vault {} {}", method, url);
        let response = self
            .http
            .request(method, url)
            .header(VAULT_TOKEN_HEADER, &self.token)
            .send()
            .await?;
        Ok(response)
    }

    /// List all KV mounts under `root` and populate their secrets.
    ///
    /// The first malformed mount path or kind fails the whole listing;
    /// callers never see a partial mount set.
    pub async fn get_mounts(&self, root: &str) -> Result<Vec<Mount>> {
        let response = self.request(Method::GET, "sys/mounts").await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::VaultApi(format!(
                "listing mounts failed: {status} {body}"
            )));
        }
        let body: Value = response.json().await?;

        let root = root.trim_matches('/');
        let mut mounts = Vec::new();
        for (path, mount_type) in mount_table(&body) {
            if !(path.trim_matches('/').starts_with(root) && mount_type == KV_MOUNT_TYPE) {
                continue;
            }
            let (namespace, kind) = split_mount(root, &path)?;
            let path = path.trim_end_matches('/').to_string();
            let secrets = self.populate_secrets(&path).await?;
            mounts.push(Mount {
                path,
                namespace,
                kind,
                secrets,
            });
        }

        Ok(mounts)
    }

    /// Read every secret document directly under a mount.
    ///
    /// A mount with no entries yields an empty list, not an error.
    async fn populate_secrets(&self, mount_path: &str) -> Result<Vec<VaultSecret>> {
        let list_method = Method::from_bytes(b"LIST").expect("LIST is a valid method");
        let response = self.request(list_method, mount_path).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::VaultApi(format!(
                "listing {mount_path} failed: {status} {body}"
            )));
        }
        let list: KeyListResponse = response.json().await?;

        let mut secrets = Vec::new();
        for name in list.data.keys {
            let path = format!("{mount_path}/{name}");
            let response = self.request(Method::GET, &path).await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(SyncError::VaultApi(format!(
                    "reading {path} failed: {status} {body}"
                )));
            }
            let doc: SecretReadResponse = response.json().await?;
            secrets.push(VaultSecret {
                name,
                pairs: pairs_from_data(&path, &doc.data)?,
            });
        }

        Ok(secrets)
    }
}

/// Extract (path, type) rows from a sys/mounts response.
///
/// Newer Vault versions wrap the mount map in a "data" field while older
/// ones put it at the top level; accept both.
pub fn mount_table(body: &Value) -> Vec<(String, String)> {
    let top = body.as_object();
    let table = top
        .and_then(|o| o.get("data"))
        .and_then(Value::as_object)
        .filter(|data| data.values().any(|v| v.get("type").is_some()))
        .or(top);

    let Some(table) = table else {
        return Vec::new();
    };

    table
        .iter()
        .filter_map(|(path, info)| {
            let mount_type = info.get("type")?.as_str()?;
            Some((path.clone(), mount_type.to_string()))
        })
        .collect()
}
