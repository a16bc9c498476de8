//! # simgate-store
//!
//! Persistent key-value providers backing the session engine. Supports two
//! modes:
//!
//! - **memory**: process-lifetime store using [dashmap](https://crates.io/crates/dashmap)
//! - **file**: JSON document on disk, rewritten atomically on every change
//!
//! The provider is selected at runtime based on configuration.

#[cfg(feature = "file")]
pub mod file;
pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;

pub use keys::StorageKeys;
pub use provider::KvManager;
