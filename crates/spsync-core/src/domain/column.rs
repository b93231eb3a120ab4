//! Column (metadata field) definitions of a document library

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::newtypes::RemoteId;

/// A column definition as returned by the list `columns` endpoint
///
/// Only the identifying fields are typed; the type-specific facets
/// (`text`, `choice`, `dateTime`, ...) are kept verbatim in `config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    /// Column id, unique within the list
    pub id: RemoteId,
    /// Internal column name (the key used in list item fields)
    pub name: String,
    /// Human-facing label
    #[serde(default)]
    pub display_name: Option<String>,
    /// Remaining properties of the definition
    #[serde(flatten)]
    pub config: Map<String, Value>,
}
