//! Token provider strategies
//!
//! Implementations of [`TokenProvider`] for the ways spsync obtains Graph
//! tokens:
//!
//! - [`StaticToken`] - A literal token fixed at construction
//! - [`FileToken`] - A JSON credential file with an `access_token` field,
//!   re-read on every call so an external refresher can rotate it
//! - [`SharedKeyExchange`] - A token service authenticated with a shared
//!   `API-Key`, queried on every call
//!
//! None of them cache: the API client asks once per attempt, and expiry
//! handling lives in whatever keeps the file or the service up to date.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;
use spsync_core::config::{AuthConfig, AuthMethod};
use spsync_core::ports::TokenProvider;
use tracing::debug;

/// Shape shared by the credential file and the exchange response
#[derive(Debug, Deserialize)]
struct TokenDocument {
    access_token: Option<String>,
}

// ============================================================================
// StaticToken
// ============================================================================

/// Always returns the same token
#[derive(Clone)]
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> Result<Option<String>> {
        Ok(Some(self.token.clone()))
    }
}

// ============================================================================
// FileToken
// ============================================================================

/// Reads `access_token` from a JSON credential file on every call
#[derive(Debug, Clone)]
pub struct FileToken {
    path: PathBuf,
}

impl FileToken {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TokenProvider for FileToken {
    async fn access_token(&self) -> Result<Option<String>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read token file {}", self.path.display()))?;

        let doc: TokenDocument = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse token file {}", self.path.display()))?;

        if doc.access_token.is_none() {
            debug!(path = %self.path.display(), "Token file has no access_token");
        }
        Ok(doc.access_token)
    }
}

// ============================================================================
// SharedKeyExchange
// ============================================================================

/// Fetches a token from a service that trusts a shared `API-Key`
///
/// Sends `GET <endpoint>` with `Authorization: API-Key <key>` and reads
/// `access_token` from the JSON response.
#[derive(Clone)]
pub struct SharedKeyExchange {
    http: Client,
    endpoint: String,
    shared_key: String,
}

impl SharedKeyExchange {
    pub fn new(endpoint: impl Into<String>, shared_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.into(),
            shared_key: shared_key.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TokenProvider for SharedKeyExchange {
    async fn access_token(&self) -> Result<Option<String>> {
        let doc: TokenDocument = self
            .http
            .get(&self.endpoint)
            .header(header::ACCEPT, "application/json")
            .header(header::AUTHORIZATION, format!("API-Key {}", self.shared_key))
            .send()
            .await
            .context("Failed to reach token exchange endpoint")?
            .error_for_status()
            .context("Token exchange returned error status")?
            .json()
            .await
            .context("Failed to parse token exchange response")?;

        Ok(doc.access_token)
    }
}

// ============================================================================
// Construction from configuration
// ============================================================================

/// Builds the provider selected by the `auth` configuration section
pub fn provider_from_config(config: &AuthConfig) -> Result<Arc<dyn TokenProvider>> {
    match config.method {
        AuthMethod::Static => {
            let Some(token) = &config.token else {
                bail!("auth.token is required for the static method");
            };
            Ok(Arc::new(StaticToken::new(token.clone())))
        }
        AuthMethod::File => {
            let Some(file) = &config.file else {
                bail!("auth.file is required for the file method");
            };
            Ok(Arc::new(FileToken::new(file.clone())))
        }
        AuthMethod::Exchange => {
            let (Some(endpoint), Some(key)) = (&config.endpoint, &config.shared_key) else {
                bail!("auth.endpoint and auth.shared_key are required for the exchange method");
            };
            Ok(Arc::new(SharedKeyExchange::new(endpoint.clone(), key.clone())))
        }
    }
}
