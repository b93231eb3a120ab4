//! SharePoint document library adapter
//!
//! [`DocumentLibrary`] resolves a named library on a site once, then
//! creates folders, uploads files and writes list-field metadata into it.
//!
//! ## Path cache
//!
//! Every folder or file created through a library instance is remembered
//! under its normalized logical path (`/a/b/c`). Parents are looked up in
//! this cache rather than on the server, so a child can only be created
//! under a folder this instance created (or with `make_parents`). Entries
//! are never invalidated; items changed out-of-band leave stale ids.
//!
//! ## Endpoints
//!
//! | operation        | request                                                        |
//! |------------------|----------------------------------------------------------------|
//! | resolve library  | `GET /sites/{host}:/sites/{site}:/lists`                       |
//! | resolve drive    | `GET /sites/{host}:/sites/{site}:/lists/{list}/drive`          |
//! | mkdir (root)     | `POST /sites/{host}/drives/{drive}/root/children`              |
//! | mkdir (child)    | `POST /sites/{host}/drives/{drive}/items/{parent}/children`    |
//! | upload (root)    | `PUT /drives/{drive}/items/root:/{leaf}:/content`              |
//! | upload (child)   | `PUT /drives/{drive}/items/{parent}:/{leaf}:/content`          |
//! | annotate         | `GET /drives/{drive}/items/root:{path}` then                   |
//! |                  | `PATCH /sites/{host}/drives/{drive}/items/{id}/listItem/fields`|
//! | columns          | `GET/POST/PATCH/DELETE .../lists/{list}/columns[/{id}]`        |

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use spsync_core::domain::{Attributes, ColumnDefinition, LibraryHandle, RemoteId};
use spsync_core::ports::{ColumnMap, DocumentStore, Loader};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::client::{ApiClient, CallOptions};
use crate::columns::ColumnRegistry;
use crate::paths::{encode_leaf, join_path, normalize, split_path};
use crate::{GraphError, GraphResult};

const OCTET_STREAM: &str = "application/octet-stream";

/// Minimal list resource, enough to match a library by name
#[derive(Debug, Deserialize)]
struct ListSummary {
    id: RemoteId,
    name: String,
}

/// Any resource where only the id matters (drive, drive item)
#[derive(Debug, Deserialize)]
struct IdOnly {
    id: RemoteId,
}

// ============================================================================
// ProgressClock
// ============================================================================

/// Item counter plus elapsed time since start, for progress logging
#[derive(Debug, Clone)]
pub struct ProgressClock {
    count: u64,
    started: Instant,
}

impl ProgressClock {
    pub fn start() -> Self {
        Self {
            count: 0,
            started: Instant::now(),
        }
    }

    /// Zeroes the counter and restarts the clock
    pub fn reset(&mut self) {
        *self = Self::start();
    }

    /// Counts one more item and returns `(count, elapsed)`
    pub fn tick(&mut self) -> (u64, Duration) {
        self.count += 1;
        self.check()
    }

    /// Returns `(count, elapsed)` without counting
    pub fn check(&self) -> (u64, Duration) {
        (self.count, self.started.elapsed())
    }

    /// Mean time per counted item
    pub fn average(&self) -> Option<Duration> {
        let (count, elapsed) = self.check();
        u32::try_from(count)
            .ok()
            .filter(|n| *n > 0)
            .map(|n| elapsed / n)
    }
}

// ============================================================================
// DocumentLibrary
// ============================================================================

/// A resolved SharePoint document library
pub struct DocumentLibrary {
    api: ApiClient,
    handle: LibraryHandle,
    /// Normalized logical path -> item id
    paths: HashMap<String, RemoteId>,
    registry: ColumnRegistry,
    loaders: HashMap<String, Arc<dyn Loader>>,
    clock: ProgressClock,
}

impl std::fmt::Debug for DocumentLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentLibrary")
            .field("handle", &self.handle)
            .field("cached_paths", &self.paths.len())
            .field("loaders", &self.loaders.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl DocumentLibrary {
    /// Resolves `library` on `host`/`site` and opens it
    ///
    /// Lists the site's lists, takes the first whose `name` matches, then
    /// resolves the drive backing it.
    ///
    /// # Errors
    /// [`GraphError::LibraryNotFound`] if no list matches; any API error
    /// from the two lookups.
    pub async fn open(
        api: ApiClient,
        host: &str,
        site: &str,
        library: &str,
    ) -> GraphResult<Self> {
        let lists_endpoint = format!("/sites/{host}:/sites/{site}:/lists");
        let lists = api.depaginate(&lists_endpoint).await?;

        let mut library_id = None;
        for value in lists {
            let list: ListSummary = serde_json::from_value(value)
                .map_err(|e| GraphError::InvalidResponse(format!("list entry: {e}")))?;
            if list.name == library {
                library_id = Some(list.id);
                break;
            }
        }

        let library_id = library_id.ok_or_else(|| GraphError::LibraryNotFound {
            library: library.to_string(),
            site: site.to_string(),
        })?;

        let drive_endpoint = format!("{lists_endpoint}/{library_id}/drive");
        let drive: IdOnly = api.get(&drive_endpoint, CallOptions::new()).await?.json()?;

        info!(
            library,
            library_id = %library_id,
            drive_id = %drive.id,
            "Resolved document library"
        );

        Ok(Self::from_handle(
            api,
            LibraryHandle::new(host, site, library_id, drive.id),
        ))
    }

    /// Wraps an already resolved handle without any network calls
    pub fn from_handle(api: ApiClient, handle: LibraryHandle) -> Self {
        Self {
            api,
            handle,
            paths: HashMap::new(),
            registry: ColumnRegistry::new(),
            loaders: HashMap::new(),
            clock: ProgressClock::start(),
        }
    }

    pub fn handle(&self) -> &LibraryHandle {
        &self.handle
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn registry(&self) -> &ColumnRegistry {
        &self.registry
    }

    /// Cached id for a logical path, if this instance created it
    pub fn cached_id(&self, path: &str) -> Option<&RemoteId> {
        self.paths.get(&normalize(path))
    }

    // ------------------------------------------------------------------
    // Progress clock
    // ------------------------------------------------------------------

    pub fn clock_start(&mut self) {
        self.clock.reset();
    }

    pub fn clock_next(&mut self) -> (u64, Duration) {
        self.clock.tick()
    }

    pub fn clock_check(&self) -> (u64, Duration) {
        self.clock.check()
    }

    // ------------------------------------------------------------------
    // Folders and uploads
    // ------------------------------------------------------------------

    /// Splits `path`, rejecting paths without a usable leaf
    fn split_checked(path: &str) -> GraphResult<Vec<String>> {
        let parts = split_path(path);
        match parts.last() {
            Some(leaf) if !leaf.is_empty() => Ok(parts),
            _ => Err(GraphError::InvalidPath(path.to_string())),
        }
    }

    /// Returns the id of the parent of `parts`, creating ancestors if asked
    async fn resolve_parent(
        &mut self,
        parts: &[String],
        make_parents: bool,
    ) -> GraphResult<RemoteId> {
        let parent_parts = &parts[..parts.len() - 1];
        let parent = join_path(parent_parts);

        if let Some(id) = self.paths.get(&parent) {
            return Ok(id.clone());
        }

        if !make_parents {
            return Err(GraphError::ParentNotResolved {
                path: join_path(parts),
                parent,
            });
        }

        // Walk down from the root, creating whatever is not cached yet
        let mut current: Option<RemoteId> = None;
        for depth in 1..=parent_parts.len() {
            let prefix = join_path(&parent_parts[..depth]);
            if let Some(id) = self.paths.get(&prefix) {
                current = Some(id.clone());
                continue;
            }
            let id = self
                .create_folder(current.as_ref(), &parent_parts[depth - 1])
                .await?;
            debug!(path = %prefix, id = %id, "Created missing parent folder");
            self.paths.insert(prefix, id.clone());
            current = Some(id);
        }

        current.ok_or(GraphError::ParentNotResolved {
            path: join_path(parts),
            parent,
        })
    }

    /// `POST .../children` with replace-on-conflict semantics
    async fn create_folder(&self, parent: Option<&RemoteId>, name: &str) -> GraphResult<RemoteId> {
        let host = self.handle.host();
        let drive = self.handle.drive_id();
        let endpoint = match parent {
            None => format!("/sites/{host}/drives/{drive}/root/children"),
            Some(parent) => format!("/sites/{host}/drives/{drive}/items/{parent}/children"),
        };
        let body = json!({
            "name": name,
            "folder": {},
            "@microsoft.graph.conflictBehavior": "replace",
        });

        let item: IdOnly = self.api.post(&endpoint, CallOptions::json(body)).await?.json()?;
        Ok(item.id)
    }

    /// Creates the folder at `path` (replacing on conflict) and caches its id
    ///
    /// # Errors
    /// [`GraphError::ParentNotResolved`] when the parent is not cached and
    /// `make_parents` is false.
    pub async fn mkdir(&mut self, path: &str, make_parents: bool) -> GraphResult<RemoteId> {
        info!(path, make_parents, "Creating folder");
        let parts = Self::split_checked(path)?;

        let parent = if parts.len() == 1 {
            None
        } else {
            Some(self.resolve_parent(&parts, make_parents).await?)
        };

        let leaf = &parts[parts.len() - 1];
        let id = self.create_folder(parent.as_ref(), leaf).await?;
        self.paths.insert(join_path(&parts), id.clone());
        Ok(id)
    }

    /// Uploads `local` to the logical path `remote` and caches the item id
    ///
    /// The whole file is read before any request is made, so the local
    /// handle is closed whether or not the upload succeeds and a missing
    /// file creates no remote folders.
    pub async fn upload(
        &mut self,
        local: &Path,
        remote: &str,
        make_parents: bool,
    ) -> GraphResult<RemoteId> {
        let parts = Self::split_checked(remote)?;

        // An unreadable source must not leave freshly created parents behind
        let data = tokio::fs::read(local)
            .await
            .map_err(|source| GraphError::LocalFile {
                path: local.to_path_buf(),
                source,
            })?;

        let leaf = encode_leaf(&parts[parts.len() - 1]);
        let drive = self.handle.drive_id().clone();

        let endpoint = if parts.len() == 1 {
            format!("/drives/{drive}/items/root:/{leaf}:/content")
        } else {
            let parent = self.resolve_parent(&parts, make_parents).await?;
            format!("/drives/{drive}/items/{parent}:/{leaf}:/content")
        };

        debug!(
            local = %local.display(),
            remote,
            bytes = data.len(),
            "Uploading file"
        );

        let item: IdOnly = self
            .api
            .put(&endpoint, CallOptions::raw(data, OCTET_STREAM))
            .await?
            .json()?;

        self.paths.insert(join_path(&parts), item.id.clone());
        Ok(item.id)
    }

    // ------------------------------------------------------------------
    // Loaders
    // ------------------------------------------------------------------

    /// Registers the loader used for `source`, replacing any previous one
    pub fn loader(&mut self, source: impl Into<String>, loader: Arc<dyn Loader>) {
        self.loaders.insert(source.into(), loader);
    }

    /// Fetches `source_uri` with the loader for `source`, then annotates
    /// `dest_file` with `attrs`
    pub async fn load(
        &mut self,
        source: &str,
        source_uri: &str,
        dest_file: &str,
        attrs: &Attributes,
        make_parents: bool,
    ) -> GraphResult<()> {
        let loader = self
            .loaders
            .get(source)
            .cloned()
            .ok_or_else(|| GraphError::UnknownLoader {
                source_id: source.to_string(),
                uri: source_uri.to_string(),
                dest: dest_file.to_string(),
            })?;

        let (n, elapsed) = self.clock.tick();
        let avg_secs = self.clock.average().map(|avg| avg.as_secs_f64());
        info!(
            n,
            elapsed_secs = elapsed.as_secs_f64(),
            avg_secs,
            dest = dest_file,
            "Loading item"
        );

        loader
            .load(&mut *self, source_uri, dest_file, make_parents)
            .await
            .map_err(|error| GraphError::Loader {
                source_id: source.to_string(),
                uri: source_uri.to_string(),
                error,
            })?;

        self.annotate(dest_file, attrs).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Columns and metadata
    // ------------------------------------------------------------------

    /// Returns the library's column definitions, fetching them on first use
    /// or when `force_reload` is set
    pub async fn list_columns(&mut self, force_reload: bool) -> GraphResult<&ColumnMap> {
        if force_reload || !self.registry.is_loaded() {
            let endpoint = format!("{}/columns", self.handle.list_path());
            let definitions = self
                .api
                .depaginate(&endpoint)
                .await?
                .into_iter()
                .map(serde_json::from_value::<ColumnDefinition>)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| GraphError::InvalidResponse(format!("column definition: {e}")))?;
            self.registry.replace(definitions);
        }

        self.registry
            .columns()
            .ok_or_else(|| GraphError::InvalidResponse("column cache not loaded".to_string()))
    }

    /// Creates column `name`, or updates it if it already exists
    ///
    /// `details` is deep-merged over the default definition. The column is
    /// also registered as an alias of itself.
    pub async fn create_column(
        &mut self,
        name: &str,
        details: &Value,
    ) -> GraphResult<ColumnDefinition> {
        let payload = self.registry.column_payload(name, details);
        self.list_columns(false).await?;

        let columns_endpoint = format!("{}/columns", self.handle.list_path());
        let response = match self.registry.get(name).map(|c| c.id.clone()) {
            Some(id) => {
                debug!(name, id = %id, "Updating existing column");
                self.api
                    .patch(&format!("{columns_endpoint}/{id}"), CallOptions::json(payload))
                    .await?
            }
            None => {
                debug!(name, "Creating column");
                self.api
                    .post(&columns_endpoint, CallOptions::json(payload))
                    .await?
            }
        };

        let definition: ColumnDefinition = response.json()?;
        self.registry.upsert(definition.clone());
        Ok(definition)
    }

    /// Deletes column `name`; returns whether it existed
    pub async fn delete_column(&mut self, name: &str) -> GraphResult<bool> {
        self.list_columns(false).await?;

        let Some(id) = self.registry.get(name).map(|c| c.id.clone()) else {
            debug!(name, "Column not present, nothing to delete");
            return Ok(false);
        };

        let endpoint = format!("{}/columns/{id}", self.handle.list_path());
        self.api.delete(&endpoint, CallOptions::new()).await?;
        self.registry.remove(name);
        info!(name, id = %id, "Deleted column");
        Ok(true)
    }

    /// Maps logical attribute `key` to remote column `column`
    pub fn alias(&mut self, key: impl Into<String>, column: impl Into<String>) {
        self.registry.alias(key, column);
    }

    /// Translates logical attributes into list field values
    pub fn de_alias(&self, attrs: &Attributes) -> Map<String, Value> {
        self.registry.de_alias(attrs)
    }

    /// Writes `attrs` to the list fields of the item at `rel_path`
    ///
    /// The item is looked up with the path kept literal (separators are not
    /// encoded) so the server resolves the hierarchy. Returns the updated
    /// fields as reported by the server.
    pub async fn annotate(&mut self, rel_path: &str, attrs: &Attributes) -> GraphResult<Value> {
        let lookup = normalize(rel_path);
        let drive = self.handle.drive_id();

        let item: IdOnly = self
            .api
            .get(&format!("/drives/{drive}/items/root:{lookup}"), CallOptions::new())
            .await?
            .json()?;

        let fields = self.registry.de_alias(attrs);
        debug!(path = %lookup, id = %item.id, fields = fields.len(), "Annotating item");

        let endpoint = format!(
            "/sites/{}/drives/{drive}/items/{}/listItem/fields",
            self.handle.host(),
            item.id
        );
        let response = self
            .api
            .patch(&endpoint, CallOptions::json(Value::Object(fields)))
            .await?;

        if response.bytes().is_empty() {
            Ok(Value::Null)
        } else {
            response.value()
        }
    }
}

#[async_trait]
impl DocumentStore for DocumentLibrary {
    async fn mkdir(&mut self, path: &str, make_parents: bool) -> anyhow::Result<Option<RemoteId>> {
        Ok(Some(DocumentLibrary::mkdir(self, path, make_parents).await?))
    }

    async fn upload(
        &mut self,
        local: &Path,
        remote: &str,
        make_parents: bool,
    ) -> anyhow::Result<Option<RemoteId>> {
        Ok(Some(
            DocumentLibrary::upload(self, local, remote, make_parents).await?,
        ))
    }

    async fn load(
        &mut self,
        source: &str,
        source_uri: &str,
        dest_file: &str,
        attrs: &Attributes,
        make_parents: bool,
    ) -> anyhow::Result<Option<()>> {
        DocumentLibrary::load(self, source, source_uri, dest_file, attrs, make_parents).await?;
        Ok(Some(()))
    }

    async fn list_columns(&mut self, force_reload: bool) -> anyhow::Result<Option<ColumnMap>> {
        Ok(Some(
            DocumentLibrary::list_columns(self, force_reload).await?.clone(),
        ))
    }

    async fn delete_column(&mut self, name: &str) -> anyhow::Result<Option<bool>> {
        Ok(Some(DocumentLibrary::delete_column(self, name).await?))
    }

    async fn create_column(
        &mut self,
        name: &str,
        details: &Value,
    ) -> anyhow::Result<Option<ColumnDefinition>> {
        Ok(Some(
            DocumentLibrary::create_column(self, name, details).await?,
        ))
    }

    async fn annotate(
        &mut self,
        rel_path: &str,
        attrs: &Attributes,
    ) -> anyhow::Result<Option<Value>> {
        Ok(Some(DocumentLibrary::annotate(self, rel_path, attrs).await?))
    }

    fn alias(&mut self, key: &str, column: &str) {
        DocumentLibrary::alias(self, key, column);
    }

    fn register_loader(&mut self, source: &str, loader: Arc<dyn Loader>) {
        self.loader(source, loader);
    }
}
