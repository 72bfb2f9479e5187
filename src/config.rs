//! Configuration to acknowledge admin preferences as well as set defaults.
//!
//! Specifically, we try to find a folio.toml, and if present we load settings from there.
//! This provides storage locations, the admin account, editor wrapping and the log file.

use facet::Facet;
use std::fs;
use std::path::Path;
use tracing::warn;

/// File name looked up in the working directory.
pub const CONFIG_FILE: &str = "folio.toml";

#[derive(Facet, Clone, Debug)]
/// Settings loaded from folio.toml or falling back to defaults.
pub struct Config {
    #[facet(default = "folio-data".to_string())]
    /// Directory holding one JSON file per collection.
    pub data_dir: String,
    #[facet(default = "folio-media".to_string())]
    /// Directory uploaded images are copied into.
    pub media_dir: String,
    #[facet(default = 100)]
    /// Maximum line width for editor text wrapping.
    pub wrap_width: usize,
    #[facet(default = String::new())]
    /// Email of the admin account; empty disables login.
    pub admin_email: String,
    #[facet(default = String::new())]
    /// Lowercase hex SHA-256 digest of the admin password.
    pub admin_password_sha256: String,
    #[facet(default = "folio.log".to_string())]
    /// File the log is appended to; empty disables logging.
    pub log_file: String,
}

impl Config {
    #[must_use]
    /// Every setting at its default.
    ///
    /// # Panics
    ///
    /// Panics if the default configuration cannot be parsed.
    pub fn defaults() -> Self {
        Self::parse("").unwrap()
    }

    #[must_use]
    /// Load configuration from folio.toml in the working directory if present.
    pub fn load() -> Self {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    #[must_use]
    /// Load configuration from `path`, using defaults when it is missing or unparsable.
    pub fn load_from(path: &Path) -> Self {
        match Self::read(path) {
            Ok(config) => config.unwrap_or_else(Self::defaults),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unparsable config");
                Self::defaults()
            }
        }
    }

    /// Read configuration from `path`; `None` when there is no readable file.
    ///
    /// # Errors
    ///
    /// Returns the parser's message when the file exists but is not valid configuration.
    pub fn read(path: &Path) -> Result<Option<Self>, String> {
        let Ok(contents) = fs::read_to_string(path) else {
            return Ok(None);
        };
        Self::parse(&contents).map(Some)
    }

    /// Parse configuration text, defaulting every absent setting.
    ///
    /// # Errors
    ///
    /// Returns the parser's message when the text is not valid for this configuration.
    pub fn parse(contents: &str) -> Result<Self, String> {
        facet_toml::from_str::<Self>(contents).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
#[path = "tests/config.rs"]
mod tests;
