//! Downloading resolved export files into their canonical location.

mod archive;

pub use archive::{extract_entry, write_raw};

use anyhow::{Context, Result};
use bytes::Bytes;
use reqwest::StatusCode;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

use crate::fetch::{self, HttpClient};
use crate::reports::{ARCHIVE_ENTRY_NAME, ReportKind};
use crate::resolver::FileId;

pub const EXPORT_API_BASE: &str = "https://api.hubapi.com";

#[derive(Deserialize)]
struct SignedUrlResponse {
    #[serde(default)]
    url: Option<String>,
}

/// Fetches export files by id.
///
/// `api` talks to the export service and must carry its bearer token.
/// `download` fetches the signed URL itself, which needs no credentials.
pub struct FileRetriever<A, D> {
    api: A,
    download: D,
    base_url: String,
}

impl<A: HttpClient, D: HttpClient> FileRetriever<A, D> {
    pub fn new(api: A, download: D) -> Self {
        Self::with_base_url(api, download, EXPORT_API_BASE)
    }

    pub fn with_base_url(api: A, download: D, base_url: &str) -> Self {
        Self {
            api,
            download,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// A short-lived download URL for `id`, or `None` if the service refused.
    pub async fn signed_url(&self, id: &FileId) -> Result<Option<String>> {
        let url = format!("{}/files/v3/files/{}/signed-url", self.base_url, id);
        let response = fetch::get(&self.api, &url).await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            warn!(file_id = %id, %status, body = %body, "Error getting signed URL");
            return Ok(None);
        }

        let signed: SignedUrlResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse signed URL response for file {id}"))?;
        if signed.url.is_none() {
            warn!(file_id = %id, "Signed URL response has no url");
        }
        Ok(signed.url)
    }

    /// The bytes behind a signed URL, or `None` on a non-200 response.
    pub async fn download(&self, signed_url: &str) -> Result<Option<Bytes>> {
        let response = fetch::get(&self.download, signed_url).await?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(%status, "Error downloading file");
            return Ok(None);
        }

        Ok(Some(response.bytes().await.context("Failed to read download body")?))
    }

    /// Places the file behind `id` at `dest_dir/canonical_name`.
    ///
    /// Returns `Ok(true)` once the canonical file is fully in place and
    /// `Ok(false)` on any soft failure, in which case an existing canonical
    /// file is left as it was.
    #[tracing::instrument(skip(self, dest_dir), fields(file_id = %id))]
    pub async fn retrieve(
        &self,
        id: &FileId,
        kind: ReportKind,
        canonical_name: &str,
        dest_dir: &Path,
    ) -> Result<bool> {
        let Some(signed_url) = self.signed_url(id).await? else {
            return Ok(false);
        };
        let Some(bytes) = self.download(&signed_url).await? else {
            return Ok(false);
        };

        let dest = dest_dir.join(canonical_name);
        match kind {
            ReportKind::Raw => {
                write_raw(&bytes, &dest)?;
                info!(path = %dest.display(), "Saved CSV");
                Ok(true)
            }
            ReportKind::Archived => {
                let extracted = extract_entry(&bytes, ARCHIVE_ENTRY_NAME, &dest)?;
                if extracted {
                    info!(path = %dest.display(), "Extracted CSV");
                }
                Ok(extracted)
            }
        }
    }
}
