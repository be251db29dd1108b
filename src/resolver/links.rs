//! Pattern matching over message bodies and redirect targets.

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

/// Opaque export file id, the digits captured from a redirect target.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

fn re_notification_link() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"https://app\.hubspot\.com/api/notification-station/general/v1/notifications/cta/[a-f0-9\-]+\?[^"'<>\s]+"#,
        )
        .expect("notification link pattern is a valid regex")
    })
}

fn re_signed_redirect() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"/files/(\d+)/signed-url-redirect").expect("redirect pattern is a valid regex")
    })
}

/// Every notification call-to-action link in `body`, deduplicated.
///
/// HTML bodies escape `&` in hrefs; the escaped form is folded back so the
/// plain and HTML renderings of one link collapse to a single entry.
pub fn extract_notification_links(body: &str) -> BTreeSet<String> {
    re_notification_link()
        .find_iter(body)
        .map(|m| m.as_str().replace("&amp;", "&"))
        .collect()
}

/// File id carried by a `Location` header, if it points at a signed-URL redirect.
pub fn parse_file_id(location: &str) -> Option<FileId> {
    re_signed_redirect()
        .captures(location)
        .and_then(|c| c.get(1))
        .map(|m| FileId(m.as_str().to_string()))
}
