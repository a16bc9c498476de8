//! Failed-login throttling.

pub mod login;

pub use login::{LoginThrottle, ThrottleState};
