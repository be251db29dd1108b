//! Turning emailed report notifications into export file ids.
//!
//! The chain is split into stages that can be exercised on their own:
//! message → [`decode_body`] → [`extract_notification_links`] →
//! [`resolve_notification_link`] → [`FileId`]. Only the last stage touches
//! the network.

mod body;
mod links;

pub use body::{decode_body, decode_part_data};
pub use links::{FileId, extract_notification_links, parse_file_id};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderValue, LOCATION};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

use crate::fetch::{self, HttpClient};
use crate::services::inbox_api::InboxApi;

/// Report name → file ids found for it. A name with no hits maps to an empty set.
pub type ResolvedReports = BTreeMap<String, BTreeSet<FileId>>;

/// Only the newest notification for each report is considered.
const SEARCH_LIMIT: u32 = 1;

/// Requests a notification link without following redirects and reads the
/// file id out of the `Location` it points to.
///
/// Anything other than a 302/303 with a matching target is `Ok(None)`;
/// transport failures are errors.
#[tracing::instrument(skip(client))]
pub async fn resolve_notification_link<C: HttpClient>(
    client: &C,
    url: &str,
) -> Result<Option<FileId>> {
    let mut req = fetch::get_request(url)?;
    req.headers_mut()
        .insert(ACCEPT, HeaderValue::from_static("application/json"));

    let response = client
        .execute(req)
        .await
        .context("Failed to resolve notification link")?;

    let status = response.status();
    if status != StatusCode::FOUND && status != StatusCode::SEE_OTHER {
        debug!(%status, "Notification link did not redirect");
        return Ok(None);
    }

    let Some(location) = response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
    else {
        debug!(%status, "Redirect without a usable Location header");
        return Ok(None);
    };

    let file_id = parse_file_id(location);
    if file_id.is_none() {
        debug!(location, "Redirect target is not a signed-url redirect");
    }
    Ok(file_id)
}

/// Finds the latest notification email for each report and resolves the
/// export files it links to.
pub struct ReportResolver<I, C> {
    inbox: I,
    export: C,
}

impl<I: InboxApi, C: HttpClient> ReportResolver<I, C> {
    /// `export` must not follow redirects and should carry the export API
    /// bearer token.
    pub fn new(inbox: I, export: C) -> Self {
        Self { inbox, export }
    }

    /// File ids for a single report. Empty when nothing matched at any stage.
    #[tracing::instrument(skip(self))]
    pub async fn resolve_report(&self, name: &str) -> Result<BTreeSet<FileId>> {
        let mut file_ids = BTreeSet::new();

        let messages = self
            .inbox
            .search_subject(name, SEARCH_LIMIT)
            .await
            .with_context(|| format!("Inbox search failed for '{name}'"))?;

        if messages.is_empty() {
            warn!("No notification email found");
            return Ok(file_ids);
        }

        for summary in &messages {
            let message = self
                .inbox
                .fetch_message(&summary.id)
                .await
                .with_context(|| format!("Failed to fetch message {}", summary.id))?;

            let body = decode_body(&message);
            let links = extract_notification_links(&body);
            if links.is_empty() {
                warn!(message_id = %summary.id, "No notification links in message body");
                continue;
            }
            debug!(message_id = %summary.id, links = links.len(), "Extracted notification links");

            for link in &links {
                match resolve_notification_link(&self.export, link).await? {
                    Some(id) => {
                        file_ids.insert(id);
                    }
                    None => warn!(message_id = %summary.id, "Notification link did not resolve to a file"),
                }
            }
        }

        Ok(file_ids)
    }

    /// Resolves every name in `names`. The first transport failure aborts the
    /// whole call; soft misses just leave an empty set for that name.
    pub async fn resolve<S: AsRef<str>>(
        &self,
        names: impl IntoIterator<Item = S>,
    ) -> Result<ResolvedReports> {
        let mut resolved = ResolvedReports::new();
        for name in names {
            let name = name.as_ref();
            let ids = self.resolve_report(name).await?;
            info!(report = name, file_ids = ?ids, "Resolved report");
            resolved.insert(name.to_string(), ids);
        }
        Ok(resolved)
    }
}
