//! Core configuration values.
//!
//! # Responsibility
//! - Carry the deployment-specific knobs of the profile lifecycle: the fixed
//!   initial password and the default group for provisioned accounts.

use serde::{Deserialize, Serialize};

/// Configuration handed to the profile lifecycle at construction.
///
/// Every newly provisioned account starts with the same `initial_password`
/// and joins `default_group`; the operator is expected to set both per
/// deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub initial_password: String,
    pub default_group: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            initial_password: "change-me-on-first-login".to_string(),
            default_group: "specialists".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CoreConfig;

    #[test]
    fn default_config_is_populated() {
        let config = CoreConfig::default();
        assert!(!config.initial_password.is_empty());
        assert!(!config.default_group.is_empty());
    }
}
