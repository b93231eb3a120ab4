//! Subcommands of the `spsync` binary
//!
//! Every command opens the configured library, runs one operation through
//! the [`DocumentStore`] port and reports the result. With `--best-effort`
//! the library is wrapped so failures are logged and reported as skipped.

pub mod annotate;
pub mod columns;
pub mod load;
pub mod mkdir;
pub mod upload;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde_json::{json, Value};
use spsync_core::config::Config;
use spsync_core::domain::{AttrValue, Attributes, RemoteId};
use spsync_core::ports::DocumentStore;
use spsync_graph::auth::provider_from_config;
use spsync_graph::loaders::{FileLoader, FILE_SOURCE};
use spsync_graph::{ApiClient, BestEffortLibrary, DocumentLibrary};
use tracing::info;

use crate::output::{OutputFormat, OutputFormatter};

/// Flags shared by every command
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub config: Option<PathBuf>,
    pub best_effort: bool,
    pub format: OutputFormat,
}

impl GlobalArgs {
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    pub fn formatter(&self) -> Box<dyn OutputFormatter> {
        self.format.formatter()
    }
}

/// Loads and validates the configuration
pub fn load_config(global: &GlobalArgs) -> Result<Config> {
    let path = global.config_path();
    let config = Config::load(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

    let errors = config.validate();
    if !errors.is_empty() {
        let messages: Vec<String> = errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        bail!("Invalid configuration ({}): {}", path.display(), messages.join("; "));
    }

    info!(config_path = %path.display(), "Loaded configuration");
    Ok(config)
}

/// Opens the configured library with config aliases and built-in loaders
/// registered, wrapped in [`BestEffortLibrary`] when requested
pub async fn open_store(global: &GlobalArgs) -> Result<Box<dyn DocumentStore>> {
    let config = load_config(global)?;

    let tokens = provider_from_config(&config.auth)?;
    let api = ApiClient::from_config(&config.api, tokens);
    let mut library = DocumentLibrary::open(
        api,
        &config.library.host,
        &config.library.site,
        &config.library.name,
    )
    .await
    .with_context(|| format!("Failed to open library '{}'", config.library.name))?;

    for (key, column) in &config.aliases {
        library.alias(key.as_str(), column.as_str());
    }
    library.loader(FILE_SOURCE, Arc::new(FileLoader::new()));

    if global.best_effort {
        Ok(Box::new(BestEffortLibrary::new(library)))
    } else {
        Ok(Box::new(library))
    }
}

/// Parses a `key=value` attribute argument
pub fn parse_attr(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

/// Collects `key=value` pairs; a key given more than once becomes a list
pub fn collect_attrs(pairs: &[(String, String)]) -> Attributes {
    let mut attrs = Attributes::new();
    for (key, value) in pairs {
        let merged = match attrs.remove(key) {
            None => AttrValue::Text(value.clone()),
            Some(AttrValue::Text(first)) => AttrValue::List(vec![first, value.clone()]),
            Some(AttrValue::List(mut values)) => {
                values.push(value.clone());
                AttrValue::List(values)
            }
        };
        attrs.insert(key.clone(), merged);
    }
    attrs
}

/// Reports an operation that yields an item id
pub fn report_item(global: &GlobalArgs, action: &str, path: &str, id: Option<RemoteId>) {
    let outcome = id.map(|id| (format!("{action} {path} ({id})"), json!({"path": path, "id": id})));
    report(global, &format!("{action} {path}"), outcome);
}

/// Prints a completed operation, or a skip when the store suppressed it
///
/// `outcome` carries the success message and JSON details; `None` means a
/// best-effort store logged the failure and carried on.
pub fn report(global: &GlobalArgs, subject: &str, outcome: Option<(String, Value)>) {
    report_to(global.formatter().as_ref(), subject, outcome);
}

fn report_to(formatter: &dyn OutputFormatter, subject: &str, outcome: Option<(String, Value)>) {
    match outcome {
        Some((message, details)) => formatter.success(&message, details),
        None => formatter.skipped(subject),
    }
}
