//! Domain types
//!
//! - Newtypes for remote identifiers
//! - The resolved library handle
//! - Metadata attributes and column definitions
//! - Domain-specific error types

pub mod attributes;
pub mod column;
pub mod errors;
pub mod library;
pub mod newtypes;

pub use attributes::{AttrValue, Attributes};
pub use column::ColumnDefinition;
pub use errors::DomainError;
pub use library::LibraryHandle;
pub use newtypes::RemoteId;
