// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use kube::Client;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ferryman::config::ManifestConfig;
use ferryman::manifest::{fetch_and_apply, ApplyOutcome};

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ManifestConfig::from_env()?;
    info!("Applying manifest from {}", config.manifest_url);

    // Local kubeconfig first, then in-cluster config
    let client = Client::try_default()
        .await
        .context("failed to get Kubernetes config")?;
    let http = reqwest::Client::new();

    let outcome = fetch_and_apply(&http, &client, config.manifest_url.as_str()).await?;

    match outcome {
        ApplyOutcome::Created => println!("Resource created"),
        ApplyOutcome::Updated => println!("Resource updated"),
    }

    Ok(())
}
