//! Client-side bearer token decoding.
//!
//! Tokens are decoded for display and scheduling only; the signature is
//! never checked.

pub mod codec;
pub mod payload;

pub use codec::TokenCodec;
pub use payload::TokenPayload;
