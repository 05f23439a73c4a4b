// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The fixed key-value walkthrough: revisioned writes, then the change log
//! seen through a raw consumer and a key watcher side by side.

use crate::error::{FerrymanError, Result};
use crate::kv::store::{Change, ChangeStream, KeyValueStore, RecordStream};
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::time::Duration;
use tracing::{info, instrument};

pub const KEY: &str = "sue.color";
pub const SECOND_KEY: &str = "sue.food";
pub const WATCH_PATTERN: &str = "sue.*";

/// Revisions observed while running the fixed sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceReport {
    pub first_put: u64,
    pub second_put: u64,
    pub stale_update_rejected: bool,
    pub update: u64,
    /// Successful writes, including the delete marker
    pub mutations: usize,
}

/// put, put, stale update, update, delete against `KEY`
#[instrument(skip(store), fields(bucket = %store.bucket()))]
pub async fn run_sequence(store: &dyn KeyValueStore) -> Result<SequenceReport> {
    let first_put = store.put(KEY, Bytes::from_static(b"blue")).await?;
    print_current(store, KEY).await?;

    let second_put = store.put(KEY, Bytes::from_static(b"green")).await?;
    print_current(store, KEY).await?;

    let stale = store.update(KEY, Bytes::from_static(b"red"), first_put).await;
    let stale_update_rejected = match stale {
        Err(e @ FerrymanError::RevisionConflict { .. }) => {
            println!("expected error: {}", e);
            true
        }
        Err(e) => return Err(e),
        Ok(revision) => {
            println!(
                "unexpected: update with stale revision {} succeeded at {}",
                first_put, revision
            );
            false
        }
    };

    let update = store.update(KEY, Bytes::from_static(b"red"), second_put).await?;
    print_current(store, KEY).await?;

    store.delete(KEY).await?;
    print_current(store, KEY).await?;

    Ok(SequenceReport {
        first_put,
        second_put,
        stale_update_rejected,
        update,
        mutations: if stale_update_rejected { 4 } else { 5 },
    })
}

async fn print_current(store: &dyn KeyValueStore, key: &str) -> Result<()> {
    match store.get(key).await? {
        Some(entry) => println!("{}", entry),
        None => println!("{} has no value", key),
    }
    Ok(())
}

async fn next_within<T>(
    stream: &mut BoxStream<'static, Result<T>>,
    timeout: Duration,
) -> Result<T> {
    match tokio::time::timeout(timeout, stream.next()).await {
        Err(_) => Err(FerrymanError::Timeout(timeout)),
        Ok(None) => Err(FerrymanError::Stream("stream closed".to_string())),
        Ok(Some(item)) => item,
    }
}

/// A raw consumer and a watcher attached to the same bucket
pub struct ChangeLogView {
    bucket: String,
    stream_name: String,
    records: RecordStream,
    changes: ChangeStream,
    timeout: Duration,
}

impl ChangeLogView {
    pub async fn attach(store: &dyn KeyValueStore, timeout: Duration) -> Result<Self> {
        let records = store.consume().await?;
        let changes = store.watch(WATCH_PATTERN).await?;
        info!("Attached consumer and watcher to stream {}", store.stream_name());

        Ok(Self {
            bucket: store.bucket().to_string(),
            stream_name: store.stream_name(),
            records,
            changes,
            timeout,
        })
    }

    /// Receive the next event from both paths, printing each.
    /// Returns `(consumed, watched)`, the consumer's record viewed as a change.
    pub async fn next_pair(&mut self) -> Result<(Change, Change)> {
        let record = next_within(&mut self.records, self.timeout).await?;
        println!("{}: {}", self.stream_name, record);
        let consumed = record.to_change(&self.bucket).ok_or_else(|| {
            FerrymanError::Stream(format!(
                "subject {} is not in bucket {}",
                record.subject, self.bucket
            ))
        })?;

        let watched = next_within(&mut self.changes, self.timeout).await?;
        println!("watcher: {}", watched);

        Ok((consumed, watched))
    }

    pub async fn observe(&mut self, count: usize) -> Result<Vec<(Change, Change)>> {
        let mut pairs = Vec::with_capacity(count);
        for _ in 0..count {
            pairs.push(self.next_pair().await?);
        }
        Ok(pairs)
    }
}

/// Everything both paths delivered during `run_demo`
#[derive(Debug, Clone, Default)]
pub struct Observation {
    pub consumed: Vec<Change>,
    pub watched: Vec<Change>,
}

impl Observation {
    fn extend(&mut self, pairs: Vec<(Change, Change)>) {
        for (consumed, watched) in pairs {
            self.consumed.push(consumed);
            self.watched.push(watched);
        }
    }
}

/// The full walkthrough: the fixed sequence, its history replayed through both
/// paths, then live puts observed by both.
#[instrument(skip(store), fields(bucket = %store.bucket()))]
pub async fn run_demo(
    store: &dyn KeyValueStore,
    timeout: Duration,
) -> Result<(SequenceReport, Observation)> {
    let report = run_sequence(store).await?;

    let mut view = ChangeLogView::attach(store, timeout).await?;
    let mut observation = Observation::default();
    observation.extend(view.observe(report.mutations).await?);

    for (key, value) in [(KEY, "yellow"), (KEY, "purple"), (SECOND_KEY, "pizza")] {
        store.put(key, Bytes::from(value)).await?;
        observation.extend(view.observe(1).await?);
    }

    Ok((report, observation))
}
