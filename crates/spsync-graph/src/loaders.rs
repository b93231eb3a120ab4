//! Built-in loaders
//!
//! A loader fetches content named by a source-specific URI and uploads it
//! into the store it is handed. Only local files are built in; other
//! sources register their own [`Loader`] on the library.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use spsync_core::ports::{DocumentStore, Loader};
use tracing::debug;

/// Source identifier the [`FileLoader`] is registered under
pub const FILE_SOURCE: &str = "file";

/// Uploads a local file; the URI is a filesystem path, optionally
/// prefixed with `file://`
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLoader;

impl FileLoader {
    pub fn new() -> Self {
        Self
    }

    fn local_path(source_uri: &str) -> &Path {
        Path::new(source_uri.strip_prefix("file://").unwrap_or(source_uri))
    }
}

#[async_trait]
impl Loader for FileLoader {
    async fn load(
        &self,
        store: &mut dyn DocumentStore,
        source_uri: &str,
        dest_file: &str,
        make_parents: bool,
    ) -> Result<()> {
        let local = Self::local_path(source_uri);
        debug!(local = %local.display(), dest = dest_file, "Loading local file");
        store
            .upload(local, dest_file, make_parents)
            .await
            .with_context(|| format!("uploading {} to {dest_file}", local.display()))?
            .ok_or_else(|| anyhow!("upload of {} to {dest_file} was skipped", local.display()))?;
        Ok(())
    }
}
