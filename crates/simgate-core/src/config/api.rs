//! Backend API endpoint configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for the REST endpoints the session engine talks to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL that `/auth/*` paths are appended to.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Upper bound for login, refresh, logout, validate and me requests.
    ///
    /// A hung request releases the single-flight refresh slot once this
    /// elapses.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl ApiConfig {
    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080/api/v1".to_string()
}

fn default_request_timeout() -> u64 {
    30
}
