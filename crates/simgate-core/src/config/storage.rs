//! Persistent client storage configuration.

use serde::{Deserialize, Serialize};

/// Selects and configures the persistent key-value backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend: `"memory"` (process lifetime only) or `"file"` (JSON file).
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Path of the JSON file used by the `file` backend.
    #[serde(default = "default_path")]
    pub path: String,
    /// Prefix for every storage key (`{prefix}_auth_token`, ...).
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            path: default_path(),
            key_prefix: default_key_prefix(),
        }
    }
}

fn default_provider() -> String {
    "file".to_string()
}

fn default_path() -> String {
    "data/session.json".to_string()
}

fn default_key_prefix() -> String {
    "sim".to_string()
}
