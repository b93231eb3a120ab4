//! Failure-suppressing decorator for batch runs
//!
//! [`BestEffortLibrary`] wraps any [`DocumentStore`] and turns every failed
//! operation into a logged warning plus a `None` result, so one bad item
//! does not stop a long migration while callers can still tell a skipped
//! operation from a completed one. Registration calls (`alias`,
//! `register_loader`) cannot fail and pass straight through.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use spsync_core::domain::{Attributes, ColumnDefinition, RemoteId};
use spsync_core::ports::{ColumnMap, DocumentStore, Loader};
use tracing::warn;

/// Decorator that logs and swallows failures of the wrapped store
#[derive(Debug)]
pub struct BestEffortLibrary<S> {
    inner: S,
}

impl<S: DocumentStore> BestEffortLibrary<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

/// Unwraps `result`, logging the error chain and substituting `fallback`
fn absorb<T>(result: Result<T>, op: &'static str, item: &str, fallback: T) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(op, item, error = %format!("{e:#}"), "Operation failed, continuing");
            fallback
        }
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for BestEffortLibrary<S> {
    async fn mkdir(&mut self, path: &str, make_parents: bool) -> Result<Option<RemoteId>> {
        let result = self.inner.mkdir(path, make_parents).await;
        Ok(absorb(result, "mkdir", path, None))
    }

    async fn upload(
        &mut self,
        local: &Path,
        remote: &str,
        make_parents: bool,
    ) -> Result<Option<RemoteId>> {
        let result = self.inner.upload(local, remote, make_parents).await;
        Ok(absorb(result, "upload", remote, None))
    }

    async fn load(
        &mut self,
        source: &str,
        source_uri: &str,
        dest_file: &str,
        attrs: &Attributes,
        make_parents: bool,
    ) -> Result<Option<()>> {
        let result = self
            .inner
            .load(source, source_uri, dest_file, attrs, make_parents)
            .await;
        Ok(absorb(result, "load", source_uri, None))
    }

    async fn list_columns(&mut self, force_reload: bool) -> Result<Option<ColumnMap>> {
        let result = self.inner.list_columns(force_reload).await;
        Ok(absorb(result, "list_columns", "", None))
    }

    async fn delete_column(&mut self, name: &str) -> Result<Option<bool>> {
        let result = self.inner.delete_column(name).await;
        Ok(absorb(result, "delete_column", name, None))
    }

    async fn create_column(
        &mut self,
        name: &str,
        details: &Value,
    ) -> Result<Option<ColumnDefinition>> {
        let result = self.inner.create_column(name, details).await;
        Ok(absorb(result, "create_column", name, None))
    }

    async fn annotate(&mut self, rel_path: &str, attrs: &Attributes) -> Result<Option<Value>> {
        let result = self.inner.annotate(rel_path, attrs).await;
        Ok(absorb(result, "annotate", rel_path, None))
    }

    fn alias(&mut self, key: &str, column: &str) {
        self.inner.alias(key, column);
    }

    fn register_loader(&mut self, source: &str, loader: Arc<dyn Loader>) {
        self.inner.register_loader(source, loader);
    }
}
