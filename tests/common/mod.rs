#![allow(dead_code)]

use anyhow::{Result, bail};
use async_trait::async_trait;
use base64::Engine;
use reqwest::header::HeaderMap;
use reqwest::{Request, Response};
use sales_rater::fetch::HttpClient;
use sales_rater::services::inbox_api::{InboxApi, Message, MessageSummary};
use serde_json::json;
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};

/// A response the mock hands back.
#[derive(Debug, Clone)]
pub struct Canned {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Canned {
    pub fn status(status: u16) -> Self {
        Self {
            status,
            headers: vec![],
            body: vec![],
        }
    }

    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            ..Self::status(200)
        }
    }

    pub fn json(value: serde_json::Value) -> Self {
        let mut canned = Self::ok(value.to_string());
        canned
            .headers
            .push(("content-type".into(), "application/json".into()));
        canned
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn redirect(status: u16, location: &str) -> Self {
        let mut canned = Self::status(status);
        canned.headers.push(("location".into(), location.into()));
        canned
    }
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub url: String,
    pub headers: HeaderMap,
}

pub type RequestLog = Arc<Mutex<Vec<Recorded>>>;

/// An [`HttpClient`] that answers from a routing closure and records every
/// request it sees.
pub struct MockClient {
    route: Box<dyn Fn(&Request) -> Canned + Send + Sync>,
    log: RequestLog,
}

impl MockClient {
    pub fn new(route: impl Fn(&Request) -> Canned + Send + Sync + 'static) -> Self {
        Self {
            route: Box::new(route),
            log: RequestLog::default(),
        }
    }

    /// Handle to the request log that survives moving the client.
    pub fn log(&self) -> RequestLog {
        self.log.clone()
    }
}

#[async_trait]
impl HttpClient for MockClient {
    async fn execute(&self, req: Request) -> reqwest::Result<Response> {
        let canned = (self.route)(&req);
        self.log.lock().unwrap().push(Recorded {
            url: req.url().to_string(),
            headers: req.headers().clone(),
        });

        let mut builder = http::Response::builder().status(canned.status);
        for (name, value) in &canned.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        Ok(Response::from(builder.body(canned.body).unwrap()))
    }
}

/// An inbox holding at most a few messages per subject.
#[derive(Default)]
pub struct FakeInbox {
    by_subject: HashMap<String, Vec<Message>>,
    failing: Vec<String>,
}

impl FakeInbox {
    pub fn with_message(mut self, subject: &str, message: Message) -> Self {
        self.by_subject
            .entry(subject.to_string())
            .or_default()
            .push(message);
        self
    }

    pub fn failing_on(mut self, subject: &str) -> Self {
        self.failing.push(subject.to_string());
        self
    }
}

#[async_trait]
impl InboxApi for FakeInbox {
    async fn search_subject(&self, subject: &str, limit: u32) -> Result<Vec<MessageSummary>> {
        if self.failing.iter().any(|s| s == subject) {
            bail!("inbox unavailable");
        }
        Ok(self
            .by_subject
            .get(subject)
            .map(|msgs| {
                msgs.iter()
                    .take(limit as usize)
                    .map(|m| MessageSummary {
                        id: m.id.clone(),
                        thread_id: String::new(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn fetch_message(&self, id: &str) -> Result<Message> {
        self.by_subject
            .values()
            .flatten()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no message {id}"))
    }
}

pub fn b64(text: &str) -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(text)
}

/// A Gmail-shaped multi-part message whose HTML part contains `html`.
pub fn html_message(id: &str, html: &str) -> Message {
    serde_json::from_value(json!({
        "id": id,
        "threadId": "t-1",
        "payload": {
            "mimeType": "multipart/alternative",
            "body": { "size": 0 },
            "parts": [
                { "mimeType": "text/plain", "body": { "data": b64("Your export is ready.") } },
                { "mimeType": "text/html", "body": { "data": b64(html) } },
                { "mimeType": "image/png", "body": { "attachmentId": "att-1", "size": 1024 } }
            ]
        }
    }))
    .unwrap()
}

pub fn notification_link(uuid: &str) -> String {
    format!(
        "https://app.hubspot.com/api/notification-station/general/v1/notifications/cta/{uuid}?portalId=4410&notificationId=7"
    )
}

/// An HTML body with one anchor per link, `&` escaped the way mail clients do.
pub fn anchors(links: &[String]) -> String {
    links
        .iter()
        .map(|l| format!(r#"<a href="{}">Download</a>"#, l.replace('&', "&amp;")))
        .collect::<Vec<_>>()
        .join("<br>")
}

pub fn zip_with(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        writer
            .start_file(*name, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
