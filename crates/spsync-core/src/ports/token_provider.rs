//! Token provider port
//!
//! The API client asks its provider for a token before *every* request and
//! never caches the answer itself. Expiry tracking, refresh and caching
//! belong to the provider.

use anyhow::Result;
use async_trait::async_trait;

/// Source of bearer tokens for API requests
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns the current access token
    ///
    /// `Ok(None)` means "no token available"; the request is then sent
    /// unauthenticated and the server decides. `Err` means the provider
    /// itself failed (unreadable file, unreachable exchange endpoint, ...).
    async fn access_token(&self) -> Result<Option<String>>;
}
