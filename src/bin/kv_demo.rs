// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ferryman::config::{KvBackend, KvConfig};
use ferryman::kv::{run_demo, KeyValueStore, MemoryStore, NatsStore};

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = KvConfig::from_env()?;
    info!(
        "Configuration loaded: nats_url={}, bucket={}, backend={:?}",
        config.nats_url, config.bucket, config.backend
    );

    let walkthrough = async {
        let store: Box<dyn KeyValueStore> = match config.backend {
            KvBackend::Nats => Box::new(
                NatsStore::connect(&config.nats_url, &config.bucket, config.timeout).await?,
            ),
            KvBackend::Memory => Box::new(MemoryStore::new(config.bucket.clone())),
        };
        println!("KV stream name: {}", store.stream_name());

        run_demo(store.as_ref(), config.timeout).await
    };

    let (report, observation) = tokio::time::timeout(config.timeout, walkthrough)
        .await
        .with_context(|| format!("key-value demo did not finish within {:?}", config.timeout))??;

    info!(
        "Walkthrough complete: {} writes in sequence, {} events seen by each path",
        report.mutations,
        observation.watched.len()
    );
    if observation.consumed != observation.watched {
        println!("consumer and watcher disagreed on the change log");
    }

    Ok(())
}
