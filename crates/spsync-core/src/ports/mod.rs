//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are the interfaces the rest of the system depends on; their
//! implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`TokenProvider`] - Source of bearer tokens, queried once per API call
//! - [`DocumentStore`] - Capability set of a remote document library
//! - [`Loader`] - Source-specific fetch-and-upload extension point

pub mod document_store;
pub mod token_provider;

pub use document_store::{ColumnMap, DocumentStore, Loader};
pub use token_provider::TokenProvider;
