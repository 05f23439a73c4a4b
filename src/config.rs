// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{kv, manifest};
use anyhow::{bail, Context, Result};
use std::env;
use std::time::Duration;
use url::Url;

/// Manifest flow configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ManifestConfig {
    /// Raw manifest location
    pub manifest_url: Url,
}

impl ManifestConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| env::var(k).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let raw = lookup("MANIFEST_URL").unwrap_or(manifest::DEFAULT_URL.to_string());
        let manifest_url = Url::parse(&raw)
            .with_context(|| format!("MANIFEST_URL is not a valid URL: {}", raw))?;

        Ok(ManifestConfig { manifest_url })
    }
}

/// Which key-value implementation the demo runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KvBackend {
    Nats,
    Memory,
}

/// Key-value flow configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct KvConfig {
    pub nats_url: String,
    pub bucket: String,
    pub timeout: Duration,
    pub backend: KvBackend,
}

impl KvConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| env::var(k).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let nats_url = lookup("NATS_URL").unwrap_or(kv::DEFAULT_NATS_URL.to_string());
        let bucket = lookup("KV_BUCKET").unwrap_or(kv::DEFAULT_BUCKET.to_string());

        let timeout_secs: u64 = match lookup("KV_TIMEOUT_SECS") {
            Some(v) => v.parse().with_context(|| {
                format!("KV_TIMEOUT_SECS must be a number of seconds, got {}", v)
            })?,
            None => kv::DEFAULT_TIMEOUT_SECS,
        };

        let backend = match lookup("KV_BACKEND").as_deref() {
            None | Some("nats") => KvBackend::Nats,
            Some("memory") => KvBackend::Memory,
            Some(other) => bail!("KV_BACKEND must be 'nats' or 'memory', got {}", other),
        };

        Ok(KvConfig {
            nats_url,
            bucket,
            timeout: Duration::from_secs(timeout_secs),
            backend,
        })
    }
}
