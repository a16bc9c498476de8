//! In-memory key-value provider.

pub mod store;

pub use store::MemoryKvStore;
