//! Seam traits defined in `simgate-core` and implemented by other crates.

pub mod api;
pub mod clock;
pub mod kv;

pub use api::AuthApi;
pub use clock::{Clock, ManualClock, SystemClock};
pub use kv::KeyValueStore;
