use crate::fetch::client::HttpClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderName, HeaderValue};

/// An [`HttpClient`] wrapper that injects a credential as an HTTP header on
/// every request.
///
/// The header value is validated once at construction, so `execute` never
/// has to deal with a malformed token.
pub struct ApiKey<C> {
    inner: C,
    header_name: HeaderName,
    value: HeaderValue,
}

impl<C> ApiKey<C> {
    /// Sends `key` verbatim in `header_name`.
    pub fn new(inner: C, header_name: &str, key: &str) -> Result<Self> {
        let header_name = HeaderName::from_bytes(header_name.as_bytes())
            .with_context(|| format!("invalid header name '{header_name}'"))?;
        let mut value = HeaderValue::from_str(key).context("credential is not a valid header value")?;
        value.set_sensitive(true);
        Ok(Self {
            inner,
            header_name,
            value,
        })
    }

    /// `Authorization: Bearer <token>`, used by both the inbox and export APIs.
    pub fn bearer(inner: C, token: &str) -> Result<Self> {
        Self::new(inner, AUTHORIZATION.as_str(), &format!("Bearer {token}"))
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut()
            .insert(self.header_name.clone(), self.value.clone());
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_prefixes_token() {
        let key = ApiKey::bearer((), "pat-na1-123").unwrap();
        assert_eq!(key.header_name, AUTHORIZATION);
        assert_eq!(key.value, "Bearer pat-na1-123");
        assert!(key.value.is_sensitive());
    }

    #[test]
    fn test_rejects_control_characters() {
        assert!(ApiKey::bearer((), "abc\ndef").is_err());
    }

    #[test]
    fn test_rejects_invalid_header_name() {
        assert!(ApiKey::new((), "bad header", "x").is_err());
    }
}
