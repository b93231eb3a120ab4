//! Column cache and attribute alias layer
//!
//! [`ColumnRegistry`] holds two caches owned by a document library:
//!
//! - the library's column definitions keyed by name, empty until first
//!   loaded and replaced wholesale on a forced reload;
//! - the alias map from logical attribute keys to column names, which only
//!   grows through explicit registration.
//!
//! It performs no I/O; the library fetches and feeds it.

use std::collections::HashMap;

use serde_json::{json, Map, Value};
use spsync_core::domain::{Attributes, ColumnDefinition};
use spsync_core::ports::ColumnMap;
use tracing::debug;

use crate::merge::deep_merge;

/// Longest text a list field accepts
pub const MAX_FIELD_CHARS: usize = 255;

/// Characters kept when a value is clipped, before the ellipsis
const CLIPPED_CHARS: usize = MAX_FIELD_CHARS - ELLIPSIS.len();

const ELLIPSIS: &str = "...";

/// Trims a field value and clips it to [`MAX_FIELD_CHARS`] characters
pub fn clip_field(value: &str) -> String {
    let value = value.trim();
    if value.chars().count() > MAX_FIELD_CHARS {
        let mut clipped: String = value.chars().take(CLIPPED_CHARS).collect();
        clipped.push_str(ELLIPSIS);
        clipped
    } else {
        value.to_string()
    }
}

/// Default definition a new column starts from
pub fn default_column(name: &str) -> Value {
    json!({
        "columnGroup": "Custom Columns",
        "description": "",
        "displayName": name,
        "name": name,
        "enforceUniqueValues": false,
        "hidden": false,
        "indexed": false,
        "readOnly": false,
        "required": false,
    })
}

/// Cached column definitions plus the attribute alias map
#[derive(Debug, Default)]
pub struct ColumnRegistry {
    columns: Option<ColumnMap>,
    aliases: HashMap<String, String>,
}

impl ColumnRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether column definitions have been loaded at least once
    pub fn is_loaded(&self) -> bool {
        self.columns.is_some()
    }

    /// The cached definitions, if loaded
    pub fn columns(&self) -> Option<&ColumnMap> {
        self.columns.as_ref()
    }

    pub fn get(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.as_ref().and_then(|c| c.get(name))
    }

    /// Replaces the cache with freshly fetched definitions
    pub fn replace(&mut self, definitions: impl IntoIterator<Item = ColumnDefinition>) {
        let columns: ColumnMap = definitions
            .into_iter()
            .map(|c| (c.name.clone(), c))
            .collect();
        debug!(count = columns.len(), "Column cache loaded");
        self.columns = Some(columns);
    }

    /// Records a definition returned by a create or update
    pub fn upsert(&mut self, definition: ColumnDefinition) {
        self.columns
            .get_or_insert_with(ColumnMap::new)
            .insert(definition.name.clone(), definition);
    }

    pub fn remove(&mut self, name: &str) -> Option<ColumnDefinition> {
        self.columns.as_mut().and_then(|c| c.remove(name))
    }

    /// Maps logical attribute `key` to remote column `column`
    pub fn alias(&mut self, key: impl Into<String>, column: impl Into<String>) {
        self.aliases.insert(key.into(), column.into());
    }

    pub fn alias_for(&self, key: &str) -> Option<&str> {
        self.aliases.get(key).map(String::as_str)
    }

    pub fn aliases(&self) -> &HashMap<String, String> {
        &self.aliases
    }

    /// Translates logical attributes into list field values
    ///
    /// Lists are joined with `", "`, values are trimmed and clipped to
    /// [`MAX_FIELD_CHARS`]. Keys without an alias are dropped.
    pub fn de_alias(&self, attrs: &Attributes) -> Map<String, Value> {
        let mut fields = Map::new();
        for (key, value) in attrs {
            match self.aliases.get(key) {
                Some(column) => {
                    fields.insert(column.clone(), Value::String(clip_field(&value.flatten())));
                }
                None => debug!(key = %key, "Dropping attribute without alias"),
            }
        }
        fields
    }

    /// Builds the create/update payload for column `name`
    ///
    /// Registers `name` as its own alias so attributes keyed by the column
    /// name pass through [`de_alias`](Self::de_alias).
    pub fn column_payload(&mut self, name: &str, details: &Value) -> Value {
        self.alias(name, name);
        deep_merge([&default_column(name), details])
    }
}
