//! # simgate-auth
//!
//! Session and access-control engine for the SIM administration client.
//!
//! ## Modules
//!
//! - `token` — unverified bearer token decoding and expiry arithmetic
//! - `session` — observable session state, persisted credentials, and the
//!   login/logout/restore lifecycle
//! - `throttle` — failed-login counting with a timed lockout
//! - `refresh` — single-flight token renewal on a one-shot timer
//! - `rbac` — role hierarchy resolution and permission checks
//! - `guard` — per-route navigation decisions

pub mod guard;
pub mod rbac;
pub mod refresh;
pub mod session;
pub mod throttle;
pub mod token;

pub use guard::{GuardDecision, Requirement, RouteGuard, RouteTable};
pub use rbac::{RbacEvaluator, RoleCatalog};
pub use refresh::RefreshScheduler;
pub use session::{AuthService, CredentialVault, SessionField, SessionStore};
pub use throttle::{LoginThrottle, ThrottleState};
pub use token::{TokenCodec, TokenPayload};
