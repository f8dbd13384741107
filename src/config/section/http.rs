//! `[http]` section configuration.
//!
//! ```toml
//! [http]
//! timeout_secs = 10           # Upper bound for one event round trip
//! endpoint_suffix = "onEvent" # Appended to the page URL path
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;
use crate::transport::{EVENT_ENDPOINT, HttpOptions};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub endpoint_suffix: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            endpoint_suffix: EVENT_ENDPOINT.to_string(),
        }
    }
}

impl HttpConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.timeout_secs == 0 {
            diag.error("http.timeout_secs", "must be greater than 0");
        }
        if self.endpoint_suffix.is_empty() || self.endpoint_suffix.contains(['/', '?', '#']) {
            diag.error_with_hint(
                "http.endpoint_suffix",
                format!("`{}` is not a single path segment", self.endpoint_suffix),
                format!("use \"{EVENT_ENDPOINT}\""),
            );
        }
    }

    pub fn options(&self) -> HttpOptions {
        HttpOptions {
            timeout: Duration::from_secs(self.timeout_secs),
            endpoint_suffix: self.endpoint_suffix.clone(),
        }
    }
}
