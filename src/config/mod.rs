//! Client configuration for `pyfron.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── apply      # [apply]
//! │   ├── dom        # [dom]
//! │   ├── http       # [http]
//! │   ├── page       # [page]
//! │   └── push       # [push], [push.reconnect]
//! ├── error          # ConfigError, ConfigDiagnostics
//! └── mod.rs         # ClientConfig (this file)
//! ```
//!
//! Every section is optional; an absent file means all defaults.

mod error;
pub mod section;

pub use error::{ConfigDiagnostic, ConfigDiagnostics, ConfigError};
pub use section::{ApplyConfig, DomConfig, HttpConfig, PageConfig, PushConfig, ReconnectConfig};

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::apply::ApplyOptions;
use crate::log;
use crate::runtime::RuntimeOptions;

/// Default config file name.
pub const CONFIG_FILE: &str = "pyfron.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing pyfron.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Path the config was loaded from (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    pub page: PageConfig,
    pub http: HttpConfig,
    pub push: PushConfig,
    pub dom: DomConfig,
    pub apply: ApplyConfig,
}

impl ClientConfig {
    /// Load `name`, searching upward from the current directory.
    ///
    /// A missing file yields the defaults.
    pub fn load(name: &Path) -> Result<Self, ConfigError> {
        let Some(path) = find_config_file(name) else {
            crate::debug!("config"; "{} not found, using defaults", name.display());
            return Ok(Self::default());
        };
        Self::from_path(&path)
    }

    /// Load configuration from file path with unknown field detection.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (mut config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("config"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Validate every section, collecting all errors at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        self.http.validate(&mut diag);
        self.push.validate(&mut diag);
        self.dom.validate(&mut diag);

        diag.into_result()
    }

    pub fn runtime_options(&self) -> RuntimeOptions {
        RuntimeOptions {
            apply: ApplyOptions {
                root_body: self.dom.root_body.clone(),
                missing: self.apply.missing_target,
            },
            capture: self.dom.capture_options(),
        }
    }
}

/// Find config file by searching upward from current directory.
fn find_config_file(name: &Path) -> Option<PathBuf> {
    if name.is_absolute() {
        return name.exists().then(|| name.to_path_buf());
    }

    let cwd = std::env::current_dir().ok()?;
    cwd.ancestors()
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.exists())
}

// ============================================================================
// Test Helpers
// ============================================================================

/// Parse config, panicking on unknown fields (to catch typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> ClientConfig {
    let (parsed, ignored) = ClientConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
