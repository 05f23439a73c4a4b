// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Key-value buckets over a message stream and the walkthrough that exercises them.

pub mod demo;
pub mod memory;
pub mod nats;
pub mod store;

pub use demo::{run_demo, run_sequence, ChangeLogView, Observation, SequenceReport};
pub use memory::MemoryStore;
pub use nats::NatsStore;
pub use store::{Change, Entry, KeyValueStore, LogRecord, Operation};
