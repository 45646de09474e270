//! Read-only settings consumed by the engine.
//!
//! The gateway's configuration loading (files, CLI, environment) lives
//! outside this crate; the engine only needs namespaced lookups, keyed
//! `"<protocol>.<setting>"` for per-backend values.

use std::collections::HashMap;

/// Generic settings provider.
pub trait Settings: Send + Sync {
    /// String list for a key; empty when unset.
    fn string_list(&self, key: &str) -> Vec<String>;

    /// Boolean flag for a key; false when unset.
    fn flag(&self, key: &str) -> bool;
}

/// In-memory settings, used by embedders with static configuration and
/// throughout the test suite.
#[derive(Debug, Clone, Default)]
pub struct StaticSettings {
    lists: HashMap<String, Vec<String>>,
    flags: HashMap<String, bool>,
}

impl StaticSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_list(mut self, key: &str, values: &[&str]) -> Self {
        self.lists.insert(
            key.to_string(),
            values.iter().map(|v| v.to_string()).collect(),
        );
        self
    }

    pub fn with_flag(mut self, key: &str, value: bool) -> Self {
        self.flags.insert(key.to_string(), value);
        self
    }
}

impl Settings for StaticSettings {
    fn string_list(&self, key: &str) -> Vec<String> {
        self.lists.get(key).cloned().unwrap_or_default()
    }

    fn flag(&self, key: &str) -> bool {
        self.flags.get(key).copied().unwrap_or(false)
    }
}

/// Whether connecting to `server` is permitted. An empty `allowedservers`
/// list permits everything.
pub fn is_allowed_server(settings: &dyn Settings, server: &str) -> bool {
    let allowed = settings.string_list("allowedservers");
    allowed.is_empty() || allowed.iter().any(|s| s == server)
}
