//! Key-value manager that dispatches to the configured provider.

use std::sync::Arc;

use tracing::info;

use simgate_core::config::storage::StorageConfig;
use simgate_core::error::AppError;
use simgate_core::result::AppResult;
use simgate_core::traits::kv::KeyValueStore;

use crate::keys::StorageKeys;

/// Key-value manager that wraps the configured provider.
///
/// The provider is selected at construction time based on configuration.
#[derive(Debug, Clone)]
pub struct KvManager {
    inner: Arc<dyn KeyValueStore>,
    keys: StorageKeys,
}

impl KvManager {
    /// Create a new manager from configuration.
    pub fn new(config: &StorageConfig) -> AppResult<Self> {
        let inner: Arc<dyn KeyValueStore> = match config.provider.as_str() {
            #[cfg(feature = "file")]
            "file" => {
                info!(path = %config.path, "Initializing file key-value provider");
                Arc::new(crate::file::FileKvStore::open(&config.path)?)
            }
            #[cfg(feature = "memory")]
            "memory" => {
                info!("Initializing in-memory key-value provider");
                Arc::new(crate::memory::MemoryKvStore::new())
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown storage provider: '{other}'. Supported: memory, file"
                )));
            }
        };

        Ok(Self {
            inner,
            keys: StorageKeys::new(config.key_prefix.clone()),
        })
    }

    /// Create a manager from an existing provider (for testing).
    pub fn from_provider(provider: Arc<dyn KeyValueStore>, keys: StorageKeys) -> Self {
        Self {
            inner: provider,
            keys,
        }
    }

    /// Get a reference to the inner provider.
    pub fn provider(&self) -> &dyn KeyValueStore {
        self.inner.as_ref()
    }

    /// Shared handle to the inner provider.
    pub fn shared(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.inner)
    }

    /// Key names under the configured prefix.
    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }
}

impl KeyValueStore for KvManager {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        self.inner.remove(key)
    }

    fn exists(&self, key: &str) -> AppResult<bool> {
        self.inner.exists(key)
    }
}
