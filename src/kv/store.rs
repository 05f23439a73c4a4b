// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Key-value bucket abstraction shared by the NATS and in-memory stores

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::fmt;

/// What a change did to its key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Put,
    Delete,
    Purge,
}

impl Operation {
    /// Parse the `KV-Operation` header value; no header means a put
    pub fn from_header(value: Option<&str>) -> Self {
        match value {
            Some("DEL") => Operation::Delete,
            Some("PURGE") => Operation::Purge,
            _ => Operation::Put,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Put => write!(f, "KeyValuePutOp"),
            Operation::Delete => write!(f, "KeyValueDeleteOp"),
            Operation::Purge => write!(f, "KeyValuePurgeOp"),
        }
    }
}

/// The current value of a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub value: Bytes,
    pub revision: u64,
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} -> {:?}",
            self.key,
            self.revision,
            String::from_utf8_lossy(&self.value)
        )
    }
}

/// A change as seen by a key watcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub key: String,
    pub value: Bytes,
    pub revision: u64,
    pub operation: Operation,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} -> {:?} (op: {})",
            self.key,
            self.revision,
            String::from_utf8_lossy(&self.value),
            self.operation
        )
    }
}

/// A raw message read from the stream backing a bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub subject: String,
    pub sequence: u64,
    pub payload: Bytes,
    pub operation: Operation,
}

impl LogRecord {
    /// View this record the way a watcher on `bucket` reports it.
    /// Returns None when the subject does not belong to the bucket.
    pub fn to_change(&self, bucket: &str) -> Option<Change> {
        let prefix = subject_prefix(bucket);
        let key = self.subject.strip_prefix(&prefix)?;

        Some(Change {
            key: key.to_string(),
            value: self.payload.clone(),
            revision: self.sequence,
            operation: self.operation,
        })
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} -> {:?}",
            self.subject,
            self.sequence,
            String::from_utf8_lossy(&self.payload)
        )
    }
}

pub type ChangeStream = BoxStream<'static, Result<Change>>;
pub type RecordStream = BoxStream<'static, Result<LogRecord>>;

/// A revisioned key-value bucket layered over a message stream
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Bucket name
    fn bucket(&self) -> &str;

    /// Name of the stream holding the bucket's change log
    fn stream_name(&self) -> String {
        format!("KV_{}", self.bucket())
    }

    /// Store `value` under `key`, returning the new revision
    async fn put(&self, key: &str, value: Bytes) -> Result<u64>;

    /// Latest value of `key`; None when absent or deleted
    async fn get(&self, key: &str) -> Result<Option<Entry>>;

    /// Store `value` only if `key` is still at `expected_revision`.
    /// A stale revision is a `RevisionConflict` and leaves the value untouched.
    async fn update(&self, key: &str, value: Bytes, expected_revision: u64) -> Result<u64>;

    /// Place a delete marker for `key`
    async fn delete(&self, key: &str) -> Result<()>;

    /// Every retained change to keys matching `pattern` from the first revision, then live
    async fn watch(&self, pattern: &str) -> Result<ChangeStream>;

    /// An ordered consumer over every message in the bucket's stream
    async fn consume(&self) -> Result<RecordStream>;
}

/// Subject prefix under which a bucket stores its keys
pub fn subject_prefix(bucket: &str) -> String {
    format!("$KV.{}.", bucket)
}

/// Match a key against a subject pattern: `*` is one token, `>` is one or more trailing tokens
pub fn key_matches(pattern: &str, key: &str) -> bool {
    let mut pattern_tokens = pattern.split('.');
    let mut key_tokens = key.split('.');

    loop {
        match (pattern_tokens.next(), key_tokens.next()) {
            (Some(">"), Some(_)) => return true,
            (Some("*"), Some(_)) => continue,
            (Some(p), Some(k)) if p == k => continue,
            (None, None) => return true,
            _ => return false,
        }
    }
}
