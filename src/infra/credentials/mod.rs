//! Credential acquisition for the two remote services.
//!
//! [`CredentialProvider`] yields a bearer token for the inbox API.
//! [`TokenFile`] implements it over persisted OAuth state (`token.json`),
//! refreshing expired access tokens. [`StaticToken`] wraps a fixed value.
//! The export API uses a static token read by [`export_token_from_env`].

mod token_file;

pub use token_file::{OAuthToken, TokenFile};

use anyhow::{Result, bail};

pub const EXPORT_TOKEN_VAR: &str = "HUBSPOT_ACCESS_TOKEN";

/// Supplies a currently valid bearer token.
#[async_trait::async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn bearer_token(&self) -> Result<String>;
}

/// A token that never changes.
pub struct StaticToken(pub String);

#[async_trait::async_trait]
impl CredentialProvider for StaticToken {
    async fn bearer_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Reads the export API token from the environment.
///
/// Must be called before any network traffic so a missing token aborts the
/// run up front.
pub fn export_token_from_env() -> Result<String> {
    export_token_from(std::env::var(EXPORT_TOKEN_VAR).ok())
}

fn export_token_from(value: Option<String>) -> Result<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => bail!("{EXPORT_TOKEN_VAR} is not set; export it (or add it to .env) before running"),
    }
}
