//! Document store port
//!
//! The capability set shared by the real document library and its
//! best-effort decorator. Callers that drive batch runs program against
//! this trait and choose at construction time whether failures abort.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` at the port boundary, like the other ports.
//! - Every fallible operation returns `Option`: the real library always
//!   yields `Some`, a decorator that suppressed a failure yields `None`.
//!   Callers reporting results must treat `None` as "did not happen".
//! - Methods take `&mut self`; path and column caches are mutated in place
//!   by a single owner.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{Attributes, ColumnDefinition, RemoteId};

/// Column definitions keyed by column name
pub type ColumnMap = BTreeMap<String, ColumnDefinition>;

/// Remote document library operations
#[async_trait]
pub trait DocumentStore: Send {
    /// Creates (or replaces) the folder at `path`, returning its id
    async fn mkdir(&mut self, path: &str, make_parents: bool) -> Result<Option<RemoteId>>;

    /// Uploads the local file to the remote path, returning the new item id
    async fn upload(
        &mut self,
        local: &Path,
        remote: &str,
        make_parents: bool,
    ) -> Result<Option<RemoteId>>;

    /// Runs the loader registered for `source`, then annotates `dest_file`
    async fn load(
        &mut self,
        source: &str,
        source_uri: &str,
        dest_file: &str,
        attrs: &Attributes,
        make_parents: bool,
    ) -> Result<Option<()>>;

    /// Returns the library's column definitions, fetching them if needed
    async fn list_columns(&mut self, force_reload: bool) -> Result<Option<ColumnMap>>;

    /// Deletes the column called `name` if it exists; `Some(false)` when
    /// there was nothing to delete
    async fn delete_column(&mut self, name: &str) -> Result<Option<bool>>;

    /// Creates or updates the column called `name`, returning the stored
    /// definition
    async fn create_column(
        &mut self,
        name: &str,
        details: &Value,
    ) -> Result<Option<ColumnDefinition>>;

    /// Writes `attrs` (after alias translation) to the item's list fields,
    /// returning the fields echoed by the server
    async fn annotate(&mut self, rel_path: &str, attrs: &Attributes) -> Result<Option<Value>>;

    /// Maps the logical attribute `key` to the remote column `column`
    fn alias(&mut self, key: &str, column: &str);

    /// Registers the loader used by [`load`](Self::load) for `source`
    fn register_loader(&mut self, source: &str, loader: Arc<dyn Loader>);
}

/// Fetches content from a source-specific URI and uploads it to the store
#[async_trait]
pub trait Loader: Send + Sync {
    async fn load(
        &self,
        store: &mut dyn DocumentStore,
        source_uri: &str,
        dest_file: &str,
        make_parents: bool,
    ) -> Result<()>;
}
