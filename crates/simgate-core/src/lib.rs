//! # simgate-core
//!
//! Core crate for the SIM session and access-control engine. Contains the
//! seam traits (persistent key-value store, auth API transport, clock),
//! configuration schemas, user and token types, auth events, and the
//! unified error system.
//!
//! This crate has **no** internal dependencies on other simgate crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
