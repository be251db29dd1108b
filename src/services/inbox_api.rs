//! Trait and types for searching an email inbox for report notifications.

use anyhow::Result;
use serde::Deserialize;

/// A search hit. Only the id is needed to fetch the full message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSummary {
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
}

/// Body payload of a MIME node; `data` is URL-safe base64.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PartBody {
    #[serde(default)]
    pub data: Option<String>,
}

/// A MIME node. Flat messages have a body and no parts; multi-part messages
/// nest further nodes under `parts`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub body: Option<PartBody>,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

/// A fully fetched message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub payload: Option<MessagePart>,
}

/// Abstraction over an inbox provider (e.g., Gmail).
#[async_trait::async_trait]
pub trait InboxApi: Send + Sync {
    /// Messages whose subject matches `subject` exactly, newest first, at most `limit`.
    async fn search_subject(&self, subject: &str, limit: u32) -> Result<Vec<MessageSummary>>;

    /// The full message including its decoded MIME tree.
    async fn fetch_message(&self, id: &str) -> Result<Message>;
}
