//! spsync Core - Domain types, ports and configuration
//!
//! This crate contains the provider-agnostic core of spsync:
//! - **Domain types** - `RemoteId`, `LibraryHandle`, `Attributes`, `ColumnDefinition`
//! - **Port definitions** - `TokenProvider`, `DocumentStore`, `Loader`
//! - **Configuration** - YAML-backed [`config::Config`]
//!
//! # Architecture
//!
//! Ports define the trait interfaces that adapter crates (e.g. `spsync-graph`)
//! implement. The domain module holds plain data with validation and no I/O.

pub mod config;
pub mod domain;
pub mod ports;
