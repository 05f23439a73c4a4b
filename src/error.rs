// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FerrymanError {
    #[error("Failed to download manifest: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to fetch manifest from {url}, status code: {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to decode manifest: {0}")]
    Decode(#[from] serde_yaml::Error),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Failed to discover resource type: {0}")]
    Discovery(String),

    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("NATS error: {0}")]
    Nats(String),

    #[error("Wrong last revision for key {key}: expected {expected}")]
    RevisionConflict { key: String, expected: u64 },

    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Change stream ended: {0}")]
    Stream(String),
}

pub type Result<T> = std::result::Result<T, FerrymanError>;
