use super::client::HttpClient;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::redirect::Policy;

pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn new() -> Self {
        Self(reqwest::Client::new())
    }

    /// A client that returns 3xx responses to the caller instead of following
    /// them. Notification links are resolved by reading their `Location`.
    pub fn without_redirects() -> Result<Self> {
        let inner = reqwest::Client::builder()
            .redirect(Policy::none())
            .build()?;
        Ok(Self(inner))
    }
}

impl Default for BasicClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.0.execute(req).await
    }
}
