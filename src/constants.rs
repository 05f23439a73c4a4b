// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Field manager recorded on create and replace calls
pub const FIELD_MANAGER: &str = "ferryman";

/// Manifest download defaults
pub mod manifest {
    /// Raw manifest fetched when MANIFEST_URL is not set
    pub const DEFAULT_URL: &str =
        "https://raw.githubusercontent.com/shishir9159/vanguard-fiesta/main/content/kubearmor.yaml";
}

/// Key-value demo defaults
pub mod kv {
    pub const DEFAULT_NATS_URL: &str = "nats://127.0.0.1:4222";
    pub const DEFAULT_BUCKET: &str = "profiles";
    /// Deadline applied to the whole key-value flow and to every blocking receive
    pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
    /// Revisions kept per key, so the change log can be replayed
    pub const BUCKET_HISTORY: i64 = 10;
    /// Header JetStream sets on delete and purge markers
    pub const OPERATION_HEADER: &str = "KV-Operation";
}
