//! `[dom]` section configuration.
//!
//! Attribute and class names shared with the server's renderer.
//!
//! ```toml
//! [dom]
//! identifier_attr = "elemid"
//! field_key_attr = "key"
//! root_body = "pyfron_body"
//! ```

use serde::{Deserialize, Serialize};

use crate::capture::{CaptureOptions, FIELD_KEY_ATTR, IDENTIFIER_ATTR};
use crate::config::ConfigDiagnostics;
use crate::protocol::ROOT_BODY;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomConfig {
    pub identifier_attr: String,
    pub field_key_attr: String,
    /// Change-set key whose target only has its children replaced.
    pub root_body: String,
}

impl Default for DomConfig {
    fn default() -> Self {
        Self {
            identifier_attr: IDENTIFIER_ATTR.to_string(),
            field_key_attr: FIELD_KEY_ATTR.to_string(),
            root_body: ROOT_BODY.to_string(),
        }
    }
}

impl DomConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        for (field, value) in [
            ("dom.identifier_attr", &self.identifier_attr),
            ("dom.field_key_attr", &self.field_key_attr),
            ("dom.root_body", &self.root_body),
        ] {
            if value.is_empty() || value.contains(char::is_whitespace) {
                diag.error(field, format!("`{value}` is not a valid name"));
            }
        }
    }

    pub fn capture_options(&self) -> CaptureOptions {
        CaptureOptions {
            identifier_attr: self.identifier_attr.clone(),
            field_key_attr: self.field_key_attr.clone(),
        }
    }
}
