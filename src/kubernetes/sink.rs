// SPDX-License-Identifier: Apache-2.0

//! Cluster-side writes: managed ConfigMaps/Secrets and stale-object pruning.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::ByteString;
use kube::{
    api::{DeleteParams, ListParams, ObjectMeta, PostParams},
    Api, Client, ResourceExt,
};
use tracing::{error, info, instrument};

use crate::constants::annotations;
use crate::error::Result;
use crate::vault::{Mount, SecretKind};

/// Long-lived handle to the cluster this operator writes into
pub struct ClusterSink {
    client: Client,
}

impl ClusterSink {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn configmaps(&self, namespace: &str) -> Api<ConfigMap> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn secrets(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }

    /// Whether this operator may create or overwrite the named object.
    ///
    /// Nonexistent objects are safe to manage. Existing objects must carry
    /// the managed annotation; objects we cannot look up are left alone.
    #[instrument(skip(self))]
    pub async fn is_managed(&self, name: &str, kind: SecretKind, namespace: &str) -> bool {
        match self.object_annotations(name, kind, namespace).await {
            Ok(None) => {
                info!(
                    "{} {}/{} does not appear to exist, assuming management",
                    kind, namespace, name
                );
                true
            }
            Ok(Some(existing)) => has_marker(&existing),
            Err(e) => {
                error!("Failed to look up {} {}/{}: {}", kind, namespace, name, e);
                false
            }
        }
    }

    async fn object_annotations(
        &self,
        name: &str,
        kind: SecretKind,
        namespace: &str,
    ) -> std::result::Result<Option<BTreeMap<String, String>>, kube::Error> {
        let fetched = match kind {
            SecretKind::ConfigMaps => self
                .configmaps(namespace)
                .get(name)
                .await
                .map(|cm| cm.metadata.annotations),
            SecretKind::Secrets => self
                .secrets(namespace)
                .get(name)
                .await
                .map(|s| s.metadata.annotations),
        };
        match fetched {
            Ok(annotations) => Ok(Some(annotations.unwrap_or_default())),
            Err(kube::Error::Api(err)) if err.code == 404 => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Create the named object, or fully replace its data if it exists.
    ///
    /// The managed annotation is stamped on either way.
    #[instrument(skip(self, pairs))]
    pub async fn upsert(
        &self,
        kind: SecretKind,
        name: &str,
        namespace: &str,
        pairs: &BTreeMap<String, String>,
    ) -> Result<()> {
        match kind {
            SecretKind::ConfigMaps => {
                let api = self.configmaps(namespace);
                let mut cm = managed_configmap(name, namespace, pairs);
                match api.get(name).await {
                    Err(kube::Error::Api(err)) if err.code == 404 => {
                        api.create(&PostParams::default(), &cm).await?;
                    }
                    Ok(existing) => {
                        cm.metadata.resource_version = existing.metadata.resource_version;
                        api.replace(name, &PostParams::default(), &cm).await?;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            SecretKind::Secrets => {
                let api = self.secrets(namespace);
                let mut secret = managed_secret(name, namespace, pairs);
                match api.get(name).await {
                    Err(kube::Error::Api(err)) if err.code == 404 => {
                        api.create(&PostParams::default(), &secret).await?;
                    }
                    Ok(existing) => {
                        secret.metadata.resource_version = existing.metadata.resource_version;
                        api.replace(name, &PostParams::default(), &secret).await?;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Ok(())
    }

    /// Delete every managed object no longer backed by a Vault secret.
    ///
    /// Lists across all namespaces; objects without the managed annotation
    /// are never touched. Any list or delete failure aborts the pass.
    #[instrument(skip(self, mounts))]
    pub async fn prune_unmatched(&self, mounts: &[Mount]) -> Result<()> {
        let all_cms: Api<ConfigMap> = Api::all(self.client.clone());
        for cm in all_cms.list(&ListParams::default()).await?.items {
            if !has_marker(cm.annotations()) {
                continue;
            }
            let name = cm.name_any();
            let namespace = cm.namespace().unwrap_or_default();
            if is_backed(mounts, &namespace, &name, SecretKind::ConfigMaps) {
                continue;
            }
            self.delete(SecretKind::ConfigMaps, &name, &namespace)
                .await?;
            info!("Deleted old ConfigMap {}/{}", namespace, name);
        }

        let all_secrets: Api<Secret> = Api::all(self.client.clone());
        for secret in all_secrets.list(&ListParams::default()).await?.items {
            if !has_marker(secret.annotations()) {
                continue;
            }
            let name = secret.name_any();
            let namespace = secret.namespace().unwrap_or_default();
            if is_backed(mounts, &namespace, &name, SecretKind::Secrets) {
                continue;
            }
            self.delete(SecretKind::Secrets, &name, &namespace).await?;
            info!("Deleted old Secret {}/{}", namespace, name);
        }

        Ok(())
    }

    /// Delete by identity; errors propagate to the caller
    pub async fn delete(&self, kind: SecretKind, name: &str, namespace: &str) -> Result<()> {
        match kind {
            SecretKind::ConfigMaps => {
                self.configmaps(namespace)
                    .delete(name, &DeleteParams::default())
                    .await?;
            }
            SecretKind::Secrets => {
                self.secrets(namespace)
                    .delete(name, &DeleteParams::default())
                    .await?;
            }
        }
        Ok(())
    }
}

/// Check for the exact managed annotation key/value
pub fn has_marker(annotations: &BTreeMap<String, String>) -> bool {
    annotations
        .get(annotations::MANAGED)
        .is_some_and(|v| v == annotations::MANAGED_VALUE)
}

/// Whether any mount backs the given (namespace, name, kind) triple
pub fn is_backed(mounts: &[Mount], namespace: &str, name: &str, kind: SecretKind) -> bool {
    mounts.iter().any(|m| {
        m.namespace == namespace && m.kind == kind && m.secrets.iter().any(|s| s.name == name)
    })
}

fn marker_annotations() -> BTreeMap<String, String> {
    BTreeMap::from([(
        annotations::MANAGED.to_string(),
        annotations::MANAGED_VALUE.to_string(),
    )])
}

fn managed_configmap(name: &str, namespace: &str, pairs: &BTreeMap<String, String>) -> ConfigMap {
    ConfigMap {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            annotations: Some(marker_annotations()),
            ..Default::default()
        },
        data: Some(pairs.clone()),
        ..Default::default()
    }
}

fn managed_secret(name: &str, namespace: &str, pairs: &BTreeMap<String, String>) -> Secret {
    // The API server base64-encodes data values for us
    let data = pairs
        .iter()
        .map(|(k, v)| (k.clone(), ByteString(v.as_bytes().to_vec())))
        .collect();
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            annotations: Some(marker_annotations()),
            ..Default::default()
        },
        type_: Some("Opaque".to_string()),
        data: Some(data),
        ..Default::default()
    }
}
