use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes a prepared request. Implemented by the real transport and by the
/// header-injecting wrappers in [`crate::fetch::auth`].
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
