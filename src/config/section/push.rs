//! `[push]` section configuration.
//!
//! ```toml
//! [push]
//! enable = true
//! url = "ws://localhost:8001/"
//! connect_timeout_secs = 5
//!
//! [push.reconnect]
//! initial_ms = 250
//! max_ms = 10000
//! multiplier = 2.0
//! max_attempts = 0            # 0 = retry forever
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;
use crate::core::SocketUrl;
use crate::lifecycle::{BackoffPolicy, ConnectionManager};
use crate::transport::PushChannel;

pub const DEFAULT_PUSH_URL: &str = "ws://localhost:8001/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    pub enable: bool,
    pub url: SocketUrl,
    pub connect_timeout_secs: u64,
    pub reconnect: ReconnectConfig,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            enable: true,
            url: SocketUrl::parse(DEFAULT_PUSH_URL).expect("default push url is valid"),
            connect_timeout_secs: 5,
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// `[push.reconnect]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub initial_ms: u64,
    pub max_ms: u64,
    pub multiplier: f64,
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_ms: 250,
            max_ms: 10_000,
            multiplier: 2.0,
            max_attempts: 0,
        }
    }
}

impl PushConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.connect_timeout_secs == 0 {
            diag.error("push.connect_timeout_secs", "must be greater than 0");
        }
        self.reconnect.validate(diag);
    }

    pub fn channel(&self) -> PushChannel {
        PushChannel::new(
            self.url.clone(),
            Duration::from_secs(self.connect_timeout_secs),
        )
    }

    /// Lifecycle manager announcing `page_id`, or `None` when push is disabled.
    pub fn manager(&self, page_id: &str) -> Option<ConnectionManager> {
        self.enable
            .then(|| ConnectionManager::new(self.channel(), page_id, self.reconnect.policy()))
    }
}

impl ReconnectConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.initial_ms == 0 {
            diag.error("push.reconnect.initial_ms", "must be greater than 0");
        }
        if self.max_ms < self.initial_ms {
            diag.error(
                "push.reconnect.max_ms",
                format!("must be at least initial_ms ({})", self.initial_ms),
            );
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            diag.error_with_hint(
                "push.reconnect.multiplier",
                format!("{} would shrink the delay", self.multiplier),
                "use a value >= 1.0, e.g. 2.0",
            );
        }
    }

    pub fn policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            initial: Duration::from_millis(self.initial_ms),
            max: Duration::from_millis(self.max_ms),
            multiplier: self.multiplier,
            max_attempts: self.max_attempts,
        }
    }
}
