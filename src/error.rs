// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Vault mount {0} is invalid: expected <root>/<namespace>/<kind>")]
    InvalidMount(String),

    #[error("Vault mount kind {0:?} is invalid: must be \"configmaps\" or \"secrets\"")]
    InvalidKind(String),

    #[error("Vault secret {path} has a non-string value for key {key}")]
    NonStringValue { path: String, key: String },

    #[error("Vault API error: {0}")]
    VaultApi(String),

    #[error("Vault request failed: {0}")]
    VaultHttp(#[from] reqwest::Error),

    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;
