//! # simgate-client
//!
//! [`HttpAuthApi`] speaks the `/auth/*` REST contract over reqwest with a
//! bounded request timeout, attaching bearer tokens supplied by the caller
//! and mapping HTTP failures onto [`simgate_core::ErrorKind`].

pub mod http;

pub use http::HttpAuthApi;
