// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Manifest download and create-or-update through the dynamic client.

pub mod apply;
pub mod download;

pub use apply::{apply_manifest, decode_manifest, fetch_and_apply, manifest_gvk, ApplyOutcome};
pub use download::download_manifest;
