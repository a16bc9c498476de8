//! Navigation gating.

pub mod route_guard;
pub mod routes;

pub use route_guard::{GuardDecision, Requirement, RouteGuard};
pub use routes::{RouteRequirement, RouteTable};
