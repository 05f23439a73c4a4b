// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! JetStream-backed bucket

use crate::constants::kv::{BUCKET_HISTORY, OPERATION_HEADER};
use crate::error::{FerrymanError, Result};
use crate::kv::store::{
    Change, ChangeStream, Entry, KeyValueStore, LogRecord, Operation, RecordStream,
};
use async_nats::jetstream::{
    self,
    consumer::{pull, AckPolicy, DeliverPolicy},
    kv::{self, UpdateError, UpdateErrorKind},
};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::time::Duration;
use tracing::{debug, info, instrument};

fn nats_err(context: &str, e: impl std::fmt::Display) -> FerrymanError {
    FerrymanError::Nats(format!("{}: {}", context, e))
}

fn to_operation(op: kv::Operation) -> Operation {
    match op {
        kv::Operation::Put => Operation::Put,
        kv::Operation::Delete => Operation::Delete,
        kv::Operation::Purge => Operation::Purge,
    }
}

fn update_err(key: &str, expected_revision: u64, e: UpdateError) -> FerrymanError {
    match e.kind() {
        UpdateErrorKind::WrongLastRevision => FerrymanError::RevisionConflict {
            key: key.to_string(),
            expected: expected_revision,
        },
        _ => nats_err("Failed to update", e),
    }
}

/// A key-value bucket on a NATS JetStream server
pub struct NatsStore {
    jetstream: jetstream::Context,
    store: kv::Store,
}

impl NatsStore {
    /// Connect to `url` and create the bucket, or open it when it already exists
    #[instrument]
    pub async fn connect(url: &str, bucket: &str, timeout: Duration) -> Result<Self> {
        let client = async_nats::ConnectOptions::new()
            .connection_timeout(timeout)
            .connect(url)
            .await
            .map_err(|e| nats_err("Failed to connect", e))?;
        info!("Connected to NATS at {}", url);

        let jetstream = jetstream::new(client);
        let store = jetstream
            .create_key_value(kv::Config {
                bucket: bucket.to_string(),
                history: BUCKET_HISTORY,
                ..Default::default()
            })
            .await
            .map_err(|e| nats_err("Failed to create KV bucket", e))?;
        info!("Opened KV bucket {} on stream {}", bucket, store.stream_name);

        Ok(Self { jetstream, store })
    }
}

#[async_trait]
impl KeyValueStore for NatsStore {
    fn bucket(&self) -> &str {
        &self.store.name
    }

    fn stream_name(&self) -> String {
        self.store.stream_name.clone()
    }

    async fn put(&self, key: &str, value: Bytes) -> Result<u64> {
        self.store
            .put(key, value)
            .await
            .map_err(|e| nats_err("Failed to put", e))
    }

    async fn get(&self, key: &str) -> Result<Option<Entry>> {
        let entry = self
            .store
            .entry(key)
            .await
            .map_err(|e| nats_err("Failed to get", e))?;

        Ok(entry
            .filter(|e| matches!(e.operation, kv::Operation::Put))
            .map(|e| Entry {
                key: e.key,
                value: e.value,
                revision: e.revision,
            }))
    }

    async fn update(&self, key: &str, value: Bytes, expected_revision: u64) -> Result<u64> {
        self.store
            .update(key, value, expected_revision)
            .await
            .map_err(|e| update_err(key, expected_revision, e))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.store
            .delete(key)
            .await
            .map_err(|e| nats_err("Failed to delete", e))
    }

    async fn watch(&self, pattern: &str) -> Result<ChangeStream> {
        let watch = self
            .store
            .watch_from_revision(pattern, 1)
            .await
            .map_err(|e| nats_err("Failed to watch", e))?;

        let changes = watch.map(|entry| {
            entry
                .map(|e| Change {
                    key: e.key,
                    value: e.value,
                    revision: e.revision,
                    operation: to_operation(e.operation),
                })
                .map_err(|e| nats_err("Watcher failed", e))
        });

        Ok(changes.boxed())
    }

    async fn consume(&self) -> Result<RecordStream> {
        let stream_name = self.stream_name();
        let stream = self
            .jetstream
            .get_stream(&stream_name)
            .await
            .map_err(|e| nats_err("Failed to get stream", e))?;

        let consumer = stream
            .create_consumer(pull::Config {
                deliver_policy: DeliverPolicy::All,
                ack_policy: AckPolicy::None,
                ..Default::default()
            })
            .await
            .map_err(|e| nats_err("Failed to create consumer", e))?;
        debug!("Created ephemeral consumer on stream {}", stream_name);

        let messages = consumer
            .messages()
            .await
            .map_err(|e| nats_err("Failed to get messages", e))?;

        let records = messages.map(|message| -> Result<LogRecord> {
            let message = message.map_err(|e| nats_err("Consumer failed", e))?;
            let info = message.info().map_err(|e| nats_err("Missing message metadata", e))?;
            let operation = Operation::from_header(
                message
                    .headers
                    .as_ref()
                    .and_then(|h| h.get(OPERATION_HEADER))
                    .map(|v| v.as_str()),
            );

            Ok(LogRecord {
                subject: message.subject.to_string(),
                sequence: info.stream_sequence,
                payload: message.payload.clone(),
                operation,
            })
        });

        Ok(records.boxed())
    }
}
