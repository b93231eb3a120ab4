//! Logical path handling for drive items
//!
//! Two encodings meet here and must stay different:
//! - item lookup by path (`root:/a/b/c.pdf`) keeps `/` literal so the
//!   server walks the hierarchy;
//! - the leaf name in upload addresses (`root:/{leaf}:/content`) is fully
//!   percent-encoded.
//!
//! Components are sanitized first in both cases, see
//! <https://learn.microsoft.com/en-us/graph/onedrive-addressing-driveitems>.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters OneDrive/SharePoint refuse in item names
const RESERVED: &[char] = &['/', '\\', '*', '<', '>', '?', ':', '|', '#', '%'];

/// Everything except RFC 3986 unreserved characters gets encoded
const LEAF_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Replaces every reserved character with `_`
///
/// Idempotent: a sanitized component contains no reserved characters.
pub fn sanitize_component(component: &str) -> String {
    component
        .chars()
        .map(|c| if RESERVED.contains(&c) { '_' } else { c })
        .collect()
}

/// Splits a logical path into sanitized components
///
/// A single leading `/` is ignored; `"/a/b"` and `"a/b"` are the same path.
pub fn split_path(path: &str) -> Vec<String> {
    let path = path.strip_prefix('/').unwrap_or(path);
    path.split('/').map(sanitize_component).collect()
}

/// Joins components back into a rooted logical path (`/a/b`)
pub fn join_path<S: AsRef<str>>(parts: &[S]) -> String {
    let mut joined = String::new();
    for part in parts {
        joined.push('/');
        joined.push_str(part.as_ref());
    }
    if joined.is_empty() {
        joined.push('/');
    }
    joined
}

/// Canonical cache key / lookup path: split, sanitize, rejoin
pub fn normalize(path: &str) -> String {
    join_path(&split_path(path))
}

/// Percent-encodes a leaf name for use inside an upload address
pub fn encode_leaf(name: &str) -> String {
    utf8_percent_encode(name, LEAF_ENCODE_SET).to_string()
}
