//! Token renewal: a one-shot timer plus single-flight coordination.

pub mod flight;
pub mod scheduler;

pub use flight::{FlightState, RefreshTrigger};
pub use scheduler::RefreshScheduler;
