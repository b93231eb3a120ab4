//! Metadata attributes attached to uploaded documents
//!
//! Attributes are keyed by *logical* names chosen by the caller; the
//! column registry maps them onto remote column names before they are
//! written to the item's list fields.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Ordered map from logical attribute key to value
pub type Attributes = BTreeMap<String, AttrValue>;

/// A single attribute value: free text or a list of text values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Text(String),
    List(Vec<String>),
}

impl AttrValue {
    /// Collapses the value into one string, joining list elements with `", "`
    pub fn flatten(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::List(items) => items.join(", "),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

impl From<Vec<&str>> for AttrValue {
    fn from(items: Vec<&str>) -> Self {
        Self::List(items.into_iter().map(str::to_string).collect())
    }
}
