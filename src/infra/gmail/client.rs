use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Deserialize;

use crate::fetch::{self, HttpClient};
use crate::services::inbox_api::{InboxApi, Message, MessageSummary};

pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageListResponse {
    #[serde(default)]
    messages: Vec<MessageSummary>,
}

/// Gmail v1 REST client. The wrapped [`HttpClient`] is expected to carry the
/// OAuth bearer header.
pub struct GmailClient<C> {
    client: C,
    base_url: String,
}

impl<C: HttpClient> GmailClient<C> {
    pub fn new(client: C) -> Self {
        Self::with_base_url(client, GMAIL_API_BASE)
    }

    pub fn with_base_url(client: C, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let response = fetch::get(&self.client, url).await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Gmail API returned status {}: {}", status, body);
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse Gmail response from {url}"))
    }
}

/// Gmail search syntax for an exact subject match.
pub fn subject_query(subject: &str) -> String {
    format!("subject:\"{}\"", subject.replace('"', ""))
}

#[async_trait]
impl<C: HttpClient> InboxApi for GmailClient<C> {
    async fn search_subject(&self, subject: &str, limit: u32) -> Result<Vec<MessageSummary>> {
        let mut url = reqwest::Url::parse(&format!("{}/users/me/messages", self.base_url))
            .context("invalid Gmail base URL")?;
        url.query_pairs_mut()
            .append_pair("q", &subject_query(subject))
            .append_pair("maxResults", &limit.to_string());

        let list: MessageListResponse = self.get_json(url.as_str()).await?;
        Ok(list.messages)
    }

    async fn fetch_message(&self, id: &str) -> Result<Message> {
        let url = format!("{}/users/me/messages/{}?format=full", self.base_url, id);
        self.get_json(&url).await
    }
}
