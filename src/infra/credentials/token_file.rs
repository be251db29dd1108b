use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::CredentialProvider;
use crate::fetch::{self, BasicClient, HttpClient};

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// Persisted OAuth state, in the layout written by Google's installed-app
/// flow (`token.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthToken {
    #[serde(alias = "access_token")]
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub expiry: Option<String>,
}

impl OAuthToken {
    /// A token without an expiry never expires; one whose expiry does not
    /// parse is treated as expired. Tokens within a minute of expiry are
    /// refreshed early.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let Some(expiry) = self.expiry.as_deref() else {
            return false;
        };
        match DateTime::parse_from_rfc3339(expiry) {
            Ok(expiry) => expiry.with_timezone(&Utc) <= now + Duration::seconds(60),
            Err(_) => true,
        }
    }
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// OAuth state on disk. Acquiring the initial token is out of scope; the
/// file must already exist. Refreshes go out through `client`.
pub struct TokenFile<C = BasicClient> {
    path: PathBuf,
    client: C,
}

impl TokenFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_client(path, BasicClient::new())
    }
}

impl<C: HttpClient> TokenFile<C> {
    pub fn with_client(path: impl Into<PathBuf>, client: C) -> Self {
        Self {
            path: path.into(),
            client,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<OAuthToken> {
        if !self.path.exists() {
            bail!(
                "OAuth token not found at {}; complete the inbox consent flow first",
                self.path.display()
            );
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }

    /// Rewrites the token file via temp file + rename.
    pub fn save(&self, token: &OAuthToken) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(serde_json::to_string_pretty(token)?.as_bytes())?;
        tmp.persist(&self.path)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(token_uri = %token.token_uri))]
    async fn refresh(&self, token: &OAuthToken) -> Result<OAuthToken> {
        let refresh_token = token
            .refresh_token
            .as_deref()
            .ok_or_else(|| anyhow!("OAuth token expired and has no refresh token"))?;

        let mut form = vec![
            ("client_id", token.client_id.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        if let Some(secret) = token.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        let request = fetch::post_form_request(&token.token_uri, &form)?;
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| anyhow!("Failed to send token refresh request: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Token refresh failed with status {}: {}", status, body);
        }

        let body: RefreshResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse token refresh response: {}", e))?;

        let expiry = Utc::now() + Duration::seconds(body.expires_in.unwrap_or(3600));
        let mut refreshed = token.clone();
        refreshed.token = body.access_token;
        refreshed.expiry = Some(expiry.to_rfc3339());
        Ok(refreshed)
    }
}

#[async_trait::async_trait]
impl<C: HttpClient> CredentialProvider for TokenFile<C> {
    async fn bearer_token(&self) -> Result<String> {
        let token = self.load()?;
        if !token.is_expired(Utc::now()) {
            debug!("Using stored inbox token");
            return Ok(token.token);
        }

        info!("Inbox token expired, refreshing");
        let refreshed = self.refresh(&token).await?;
        self.save(&refreshed)?;
        Ok(refreshed.token)
    }
}
