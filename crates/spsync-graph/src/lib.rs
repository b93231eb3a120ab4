//! spsync Graph - Microsoft Graph client for SharePoint document libraries
//!
//! Provides an async client and library adapter for:
//! - Bearer-token authenticated REST calls with bounded auth-failure retry
//! - `@odata.nextLink` pagination
//! - Folder creation, uploads and list-field annotation in a document library
//! - Best-effort batch runs that log and skip failing items
//!
//! ## Modules
//!
//! - [`auth`] - Token provider strategies (static, file, shared-key exchange)
//! - [`client`] - Graph API HTTP client with retry and pagination
//! - [`paths`] - Logical path splitting, sanitizing and leaf encoding
//! - [`merge`] - Deep merge of JSON objects for column definitions
//! - [`columns`] - Column cache and attribute alias layer
//! - [`library`] - The document library adapter
//! - [`best_effort`] - Failure-suppressing decorator for batch runs
//! - [`loaders`] - Built-in loaders for [`library::DocumentLibrary::loader`]

pub mod auth;
pub mod best_effort;
pub mod client;
pub mod columns;
pub mod library;
pub mod loaders;
pub mod merge;
pub mod paths;

use thiserror::Error;

pub use best_effort::BestEffortLibrary;
pub use client::{ApiClient, ApiFailure, ApiResponse, CallOptions};
pub use columns::ColumnRegistry;
pub use library::DocumentLibrary;

/// Errors that can occur when talking to a document library
#[derive(Debug, Error)]
pub enum GraphError {
    /// The API answered with a non-success status
    ///
    /// Raised only once the auth-retry budget is spent or the failure was
    /// not an authentication failure.
    #[error("{}", .0)]
    Api(Box<ApiFailure>),

    /// A network-level error occurred
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The API response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The token provider failed to produce a token
    #[error("Token provider failed: {0:#}")]
    Token(anyhow::Error),

    /// Reading a local file failed
    #[error("Failed to read {}: {source}", .path.display())]
    LocalFile {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    /// No list on the site carries the requested library name
    #[error("Library '{library}' not found on site '{site}'")]
    LibraryNotFound { library: String, site: String },

    /// The parent folder of `path` is not in the path cache
    #[error("Parent '{parent}' of '{path}' is not resolved; create it first or pass make_parents")]
    ParentNotResolved { path: String, parent: String },

    /// A logical path had no usable components
    #[error("Invalid path: {0:?}")]
    InvalidPath(String),

    /// `load` was called for a source with no registered loader
    #[error("Unhandled source '{source_id}' for {uri} -> {dest}")]
    UnknownLoader {
        source_id: String,
        uri: String,
        dest: String,
    },

    /// A registered loader failed
    #[error("Loader '{source_id}' failed for {uri}: {error:#}")]
    Loader {
        source_id: String,
        uri: String,
        error: anyhow::Error,
    },
}

/// Result alias for Graph operations
pub type GraphResult<T> = Result<T, GraphError>;

impl From<ApiFailure> for GraphError {
    fn from(failure: ApiFailure) -> Self {
        Self::Api(Box::new(failure))
    }
}

impl From<spsync_core::domain::DomainError> for GraphError {
    fn from(err: spsync_core::domain::DomainError) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
