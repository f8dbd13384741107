//! `[apply]` section configuration.
//!
//! ```toml
//! [apply]
//! missing_target = "skip"     # "skip" logs and continues; "fail" rejects the change-set
//! ```

use serde::{Deserialize, Serialize};

use crate::apply::MissingTargetPolicy;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplyConfig {
    pub missing_target: MissingTargetPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClientConfig, test_parse_config};

    #[test]
    fn test_apply_config() {
        let config = test_parse_config("[apply]\nmissing_target = \"fail\"");
        assert_eq!(config.apply.missing_target, MissingTargetPolicy::Fail);
        assert_eq!(test_parse_config("").apply.missing_target, MissingTargetPolicy::Skip);
    }

    #[test]
    fn test_apply_config_unknown_policy() {
        assert!(ClientConfig::parse("[apply]\nmissing_target = \"ignore\"").is_err());
    }
}
