//! Configuration module for spsync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default Microsoft Graph v1.0 endpoint
pub const DEFAULT_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Default auth-failure retry budget per API call
pub const DEFAULT_MAX_RETRIES: u32 = 2;

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for spsync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub library: LibraryConfig,
    pub auth: AuthConfig,
    pub api: ApiConfig,
    /// Logical attribute key -> remote column name, registered on startup.
    pub aliases: BTreeMap<String, String>,
}

/// Target document library.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// SharePoint host, e.g. `contoso.sharepoint.com`.
    pub host: String,
    /// Site name under `/sites/`.
    pub site: String,
    /// Display name of the document library (list) to sync into.
    pub name: String,
}

/// How bearer tokens are obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// A literal token from `auth.token`.
    #[default]
    Static,
    /// A JSON credential file at `auth.file` with an `access_token` field.
    File,
    /// A shared-key exchange against `auth.endpoint`.
    Exchange,
}

/// Authentication settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// Literal token for [`AuthMethod::Static`].
    pub token: Option<String>,
    /// Credential file for [`AuthMethod::File`].
    pub file: Option<PathBuf>,
    /// Token exchange URL for [`AuthMethod::Exchange`].
    pub endpoint: Option<String>,
    /// Shared key sent as `API-Key` for [`AuthMethod::Exchange`].
    pub shared_key: Option<String>,
}

/// REST client tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL prefixed to every relative endpoint.
    pub base_url: String,
    /// Auth-failure retry budget per call (1 disables retrying).
    pub max_retries: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/spsync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("spsync")
            .join("config.yaml")
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"library.host"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn require(errors: &mut Vec<ValidationError>, field: &str, present: bool) {
    if !present {
        errors.push(ValidationError {
            field: field.into(),
            message: "must be set".into(),
        });
    }
}

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- library ---
        require(&mut errors, "library.host", !self.library.host.is_empty());
        require(&mut errors, "library.site", !self.library.site.is_empty());
        require(&mut errors, "library.name", !self.library.name.is_empty());

        // --- auth ---
        match self.auth.method {
            AuthMethod::Static => {
                require(&mut errors, "auth.token", self.auth.token.is_some());
            }
            AuthMethod::File => {
                require(&mut errors, "auth.file", self.auth.file.is_some());
            }
            AuthMethod::Exchange => {
                require(&mut errors, "auth.endpoint", self.auth.endpoint.is_some());
                require(
                    &mut errors,
                    "auth.shared_key",
                    self.auth.shared_key.is_some(),
                );
            }
        }

        // --- api ---
        if !(self.api.base_url.starts_with("https://") || self.api.base_url.starts_with("http://"))
        {
            errors.push(ValidationError {
                field: "api.base_url".into(),
                message: format!("not an http(s) URL: {}", self.api.base_url),
            });
        }
        if self.api.max_retries == 0 {
            errors.push(ValidationError {
                field: "api.max_retries".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- aliases ---
        for (key, column) in &self.aliases {
            if column.is_empty() {
                errors.push(ValidationError {
                    field: format!("aliases.{key}"),
                    message: "column name must not be empty".into(),
                });
            }
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// # Example
///
/// ```rust,no_run
/// use spsync_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .library("contoso.sharepoint.com", "archive", "Documents")
///     .static_token("eyJ0eXAi...")
///     .alias("title", "Title")
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn library(
        mut self,
        host: impl Into<String>,
        site: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.config.library = LibraryConfig {
            host: host.into(),
            site: site.into(),
            name: name.into(),
        };
        self
    }

    pub fn static_token(mut self, token: impl Into<String>) -> Self {
        self.config.auth.method = AuthMethod::Static;
        self.config.auth.token = Some(token.into());
        self
    }

    pub fn token_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.config.auth.method = AuthMethod::File;
        self.config.auth.file = Some(file.into());
        self
    }

    pub fn token_exchange(
        mut self,
        endpoint: impl Into<String>,
        shared_key: impl Into<String>,
    ) -> Self {
        self.config.auth.method = AuthMethod::Exchange;
        self.config.auth.endpoint = Some(endpoint.into());
        self.config.auth.shared_key = Some(shared_key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api.base_url = url.into();
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.api.max_retries = n;
        self
    }

    pub fn alias(mut self, key: impl Into<String>, column: impl Into<String>) -> Self {
        self.config.aliases.insert(key.into(), column.into());
        self
    }

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}
