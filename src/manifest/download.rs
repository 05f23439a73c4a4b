// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Raw manifest download over HTTP

use crate::error::{FerrymanError, Result};
use bytes::Bytes;
use tracing::{debug, instrument};

/// Fetch the manifest at `url` and return its raw content.
/// Any non-success status is an error.
#[instrument(skip(http))]
pub async fn download_manifest(http: &reqwest::Client, url: &str) -> Result<Bytes> {
    let response = http.get(url).send().await?;
    let status = response.status();

    if !status.is_success() {
        return Err(FerrymanError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let data = response.bytes().await?;
    debug!("Downloaded {} bytes", data.len());

    Ok(data)
}
