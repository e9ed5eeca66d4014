//! Configuration management for Shroud.
//!
//! Parses `shroud.toml` with serde and discovers it in the current
//! directory or any parent. Values given on the command line are applied on
//! top through [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String values support `${VAR}` (error if unset) and `${VAR:-default}`.
//!
//! Expanded fields:
//! - `techdocs.api_origin`
//! - `reader.location`
//! - `sanitizer.allowed_iframe_hosts` (each entry)

mod expand;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "shroud.toml";

/// Command-line values that override the configuration file.
///
/// Only `Some` fields override.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the documentation backend origin.
    pub api_origin: Option<String>,
    /// Override the page location the document is rendered at.
    pub location: Option<String>,
    /// Override the request timeout in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Override the iframe host allow-list.
    pub allowed_iframe_hosts: Option<Vec<String>>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Documentation backend.
    pub techdocs: TechDocsConfig,
    /// Content sanitization.
    pub sanitizer: SanitizerConfig,
    /// Reader page context.
    pub reader: ReaderConfig,
    /// Styles injected into rendered documents.
    pub theme: ThemeConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Documentation backend configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TechDocsConfig {
    /// Origin of the backend serving `/static/docs/...`.
    pub api_origin: String,
    /// Timeout for each resource fetch.
    pub request_timeout_secs: u64,
}

impl Default for TechDocsConfig {
    fn default() -> Self {
        Self {
            api_origin: "http://localhost:7007/api/techdocs".to_owned(),
            request_timeout_secs: 30,
        }
    }
}

impl TechDocsConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Sanitizer configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SanitizerConfig {
    /// Hosts whose iframes survive sanitization. Empty disables iframes.
    pub allowed_iframe_hosts: Vec<String>,
}

/// Reader page configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// URL of the reader page, including any `#fragment` to scroll to.
    pub location: String,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            location: "http://localhost:3000/docs/default/component/local/".to_owned(),
        }
    }
}

/// Theme values for the injected stylesheet.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub font_family: String,
    pub primary_color: String,
    pub background_color: String,
    pub text_color: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            font_family: "Helvetica Neue, Helvetica, Roboto, Arial, sans-serif".to_owned(),
            primary_color: "#1f5493".to_owned(),
            background_color: "#ffffff".to_owned(),
            text_color: "#000000de".to_owned(),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g. "`techdocs.api_origin`").
        field: String,
        /// Error message.
        message: String,
    },
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require an absolute http(s) URL.
fn require_http_url(value: &str, field: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(value)
        .map_err(|e| ConfigError::Validation(format!("{field} is not a valid URL: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration, then apply CLI settings.
    ///
    /// With `config_path`, that file must exist. Otherwise `shroud.toml` is
    /// searched in the current directory and its parents, falling back to
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit `config_path` doesn't exist, the file
    /// can't be parsed, or the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(api_origin) = &settings.api_origin {
            self.techdocs.api_origin.clone_from(api_origin);
        }
        if let Some(location) = &settings.location {
            self.reader.location.clone_from(location);
        }
        if let Some(timeout) = settings.request_timeout_secs {
            self.techdocs.request_timeout_secs = timeout;
        }
        if let Some(hosts) = &settings.allowed_iframe_hosts {
            self.sanitizer.allowed_iframe_hosts.clone_from(hosts);
        }
    }

    /// Search for the config file in the current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;
        config.normalize();
        config.config_path = Some(path.to_path_buf());
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` on the first invalid value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.techdocs.api_origin, "techdocs.api_origin")?;
        require_http_url(&self.techdocs.api_origin, "techdocs.api_origin")?;
        if self.techdocs.request_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "techdocs.request_timeout_secs must be greater than 0".to_owned(),
            ));
        }

        for host in &self.sanitizer.allowed_iframe_hosts {
            require_non_empty(host, "sanitizer.allowed_iframe_hosts")?;
            if host.contains("://") || host.contains('/') {
                return Err(ConfigError::Validation(format!(
                    "sanitizer.allowed_iframe_hosts entries must be bare hosts, got {host:?}"
                )));
            }
        }

        require_http_url(&self.reader.location, "reader.location")?;

        for (value, field) in [
            (&self.theme.font_family, "theme.font_family"),
            (&self.theme.primary_color, "theme.primary_color"),
            (&self.theme.background_color, "theme.background_color"),
            (&self.theme.text_color, "theme.text_color"),
        ] {
            require_non_empty(value, field)?;
            if value.contains([';', '{', '}', '<', '>']) {
                return Err(ConfigError::Validation(format!(
                    "{field} contains characters not allowed in a CSS value"
                )));
            }
        }

        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.techdocs.api_origin =
            expand::expand_env(&self.techdocs.api_origin, "techdocs.api_origin")?;
        self.reader.location = expand::expand_env(&self.reader.location, "reader.location")?;
        for host in &mut self.sanitizer.allowed_iframe_hosts {
            *host = expand::expand_env(host, "sanitizer.allowed_iframe_hosts")?;
        }
        Ok(())
    }

    /// Trim the trailing slash from the origin and lowercase iframe hosts.
    fn normalize(&mut self) {
        let trimmed = self.techdocs.api_origin.trim_end_matches('/').len();
        self.techdocs.api_origin.truncate(trimmed);
        for host in &mut self.sanitizer.allowed_iframe_hosts {
            *host = host.trim().to_ascii_lowercase();
        }
    }
}
