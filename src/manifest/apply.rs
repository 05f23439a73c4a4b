// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Decoding a manifest and creating or updating it through the dynamic API

use crate::constants::FIELD_MANAGER;
use crate::error::{FerrymanError, Result};
use crate::manifest::download::download_manifest;
use kube::{
    api::{DynamicObject, GroupVersionKind, PostParams},
    discovery::{self, Scope},
    Api, Client, ResourceExt,
};
use tracing::{debug, info, instrument};

/// What `apply_manifest` did to the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Created,
    Updated,
}

/// Decode exactly one YAML document into an untyped object and its target type.
pub fn decode_manifest(data: &[u8]) -> Result<(DynamicObject, GroupVersionKind)> {
    let obj: DynamicObject = serde_yaml::from_slice(data)?;

    let gvk = manifest_gvk(&obj)?;
    if obj.metadata.name.is_none() {
        return Err(FerrymanError::InvalidManifest(
            "metadata.name is required".to_string(),
        ));
    }

    Ok((obj, gvk))
}

/// Split `apiVersion`/`kind` into a group, version and kind.
/// An apiVersion without a `/` belongs to the core group.
pub fn manifest_gvk(obj: &DynamicObject) -> Result<GroupVersionKind> {
    let Some(types) = obj.types.as_ref() else {
        return Err(FerrymanError::InvalidManifest(
            "apiVersion and kind are required".to_string(),
        ));
    };

    if types.kind.is_empty() || types.api_version.is_empty() {
        return Err(FerrymanError::InvalidManifest(
            "apiVersion and kind must not be empty".to_string(),
        ));
    }

    let (group, version) = match types.api_version.split_once('/') {
        Some((group, version)) => (group, version),
        None => ("", types.api_version.as_str()),
    };

    Ok(GroupVersionKind::gvk(group, version, &types.kind))
}

/// Apply a single manifest: replace the live object when one exists, create it otherwise.
#[instrument(skip(client, data))]
pub async fn apply_manifest(client: &Client, data: &[u8]) -> Result<ApplyOutcome> {
    let (mut obj, gvk) = decode_manifest(data)?;

    let (resource, capabilities) = discovery::pinned_kind(client, &gvk).await.map_err(|e| {
        FerrymanError::Discovery(format!(
            "Failed to get REST mapping for {}/{} {}: {}",
            gvk.group, gvk.version, gvk.kind, e
        ))
    })?;

    let api: Api<DynamicObject> = match capabilities.scope {
        Scope::Namespaced => match obj.namespace() {
            Some(namespace) => Api::namespaced_with(client.clone(), &namespace, &resource),
            None => Api::default_namespaced_with(client.clone(), &resource),
        },
        Scope::Cluster => Api::all_with(client.clone(), &resource),
    };

    let name = obj.name_any();
    let pp = PostParams {
        field_manager: Some(FIELD_MANAGER.to_string()),
        ..Default::default()
    };

    debug!("Resolved {} {} to resource {}", gvk.kind, name, resource.plural);

    match api.get_opt(&name).await? {
        Some(existing) => {
            obj.metadata.resource_version = existing.metadata.resource_version;
            api.replace(&name, &pp, &obj).await?;
            info!("Resource updated successfully");
            Ok(ApplyOutcome::Updated)
        }
        None => {
            api.create(&pp, &obj).await?;
            info!("Resource created successfully");
            Ok(ApplyOutcome::Created)
        }
    }
}

/// Download the manifest at `url` and apply it. Nothing is written when the download fails.
#[instrument(skip(http, client))]
pub async fn fetch_and_apply(
    http: &reqwest::Client,
    client: &Client,
    url: &str,
) -> Result<ApplyOutcome> {
    let data = download_manifest(http, url).await?;
    apply_manifest(client, &data).await
}
