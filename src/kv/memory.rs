// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! In-process bucket over an append-only log, with the same revision rules as JetStream

use crate::error::{FerrymanError, Result};
use crate::kv::store::{
    key_matches, subject_prefix, ChangeStream, Entry, KeyValueStore, LogRecord, Operation,
    RecordStream,
};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, StreamExt};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::debug;

const LIVE_CHANNEL_CAPACITY: usize = 256;

/// A bucket kept in memory. Every mutation appends a record and gets the next
/// bucket-wide sequence number as its revision.
#[derive(Clone)]
pub struct MemoryStore {
    bucket: String,
    log: Arc<Mutex<Vec<LogRecord>>>,
    live: broadcast::Sender<LogRecord>,
}

impl MemoryStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        let (live, _) = broadcast::channel(LIVE_CHANNEL_CAPACITY);
        Self {
            bucket: bucket.into(),
            log: Arc::new(Mutex::new(Vec::new())),
            live,
        }
    }

    fn subject(&self, key: &str) -> String {
        format!("{}{}", subject_prefix(&self.bucket), key)
    }

    fn last_record<'a>(log: &'a [LogRecord], subject: &str) -> Option<&'a LogRecord> {
        log.iter().rev().find(|r| r.subject == subject)
    }

    /// Append under the log lock, optionally checking the key's last revision first
    fn append(
        &self,
        key: &str,
        payload: Bytes,
        operation: Operation,
        expected_revision: Option<u64>,
    ) -> Result<u64> {
        let subject = self.subject(key);
        let mut log = self.log.lock().map_err(|e| FerrymanError::Stream(e.to_string()))?;

        if let Some(expected) = expected_revision {
            // A delete marker is still the key's last revision
            let current = Self::last_record(&log, &subject)
                .map(|r| r.sequence)
                .unwrap_or(0);
            if current != expected {
                return Err(FerrymanError::RevisionConflict {
                    key: key.to_string(),
                    expected,
                });
            }
        }

        let sequence = log.len() as u64 + 1;
        let record = LogRecord {
            subject,
            sequence,
            payload,
            operation,
        };
        log.push(record.clone());

        // No receivers just means nobody is watching yet
        let _ = self.live.send(record);
        debug!("Appended {} at sequence {}", key, sequence);

        Ok(sequence)
    }

    /// Snapshot the log and subscribe to later appends without losing records in between
    fn replay_then_live(&self) -> Result<RecordStream> {
        let log = self.log.lock().map_err(|e| FerrymanError::Stream(e.to_string()))?;
        let history = log.clone();
        let receiver = self.live.subscribe();
        drop(log);

        let live = stream::unfold(receiver, |mut receiver| async move {
            match receiver.recv().await {
                Ok(record) => Some((Ok(record), receiver)),
                Err(broadcast::error::RecvError::Lagged(n)) => Some((
                    Err(FerrymanError::Stream(format!("consumer lagged by {} records", n))),
                    receiver,
                )),
                Err(broadcast::error::RecvError::Closed) => None,
            }
        });

        Ok(stream::iter(history.into_iter().map(Ok::<LogRecord, FerrymanError>))
            .chain(live)
            .boxed())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(&self, key: &str, value: Bytes) -> Result<u64> {
        self.append(key, value, Operation::Put, None)
    }

    async fn get(&self, key: &str) -> Result<Option<Entry>> {
        let subject = self.subject(key);
        let log = self.log.lock().map_err(|e| FerrymanError::Stream(e.to_string()))?;

        Ok(Self::last_record(&log, &subject)
            .filter(|r| r.operation == Operation::Put)
            .map(|r| Entry {
                key: key.to_string(),
                value: r.payload.clone(),
                revision: r.sequence,
            }))
    }

    async fn update(&self, key: &str, value: Bytes, expected_revision: u64) -> Result<u64> {
        self.append(key, value, Operation::Put, Some(expected_revision))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.append(key, Bytes::new(), Operation::Delete, None)?;
        Ok(())
    }

    async fn watch(&self, pattern: &str) -> Result<ChangeStream> {
        let bucket = self.bucket.clone();
        let pattern = pattern.to_string();

        let changes = self.replay_then_live()?.filter_map(move |record| {
            let change = match record {
                Ok(record) => record
                    .to_change(&bucket)
                    .filter(|c| key_matches(&pattern, &c.key))
                    .map(Ok),
                Err(e) => Some(Err(e)),
            };
            async move { change }
        });

        Ok(changes.boxed())
    }

    async fn consume(&self) -> Result<RecordStream> {
        self.replay_then_live()
    }
}
