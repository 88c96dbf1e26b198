//! Server configuration
//!
//! Read once from the environment at startup.

use std::env;

const LOG_VAR: &str = "DBGEVAL_LOG";
const BY_REFERENCE_VAR: &str = "DBGEVAL_BY_REFERENCE";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `tracing-subscriber` filter directive
    pub log_filter: String,

    /// Wrap snapshots that don't say otherwise in a reference handle
    pub by_reference: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            log_filter: "info".to_string(),
            by_reference: true,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(filter) = lookup(LOG_VAR).filter(|f| !f.trim().is_empty()) {
            config.log_filter = filter;
        }
        if let Some(flag) = lookup(BY_REFERENCE_VAR) {
            config.by_reference = !matches!(flag.trim(), "0" | "false" | "no" | "off");
        }
        config
    }
}
