//! Session state, persisted credentials and the login/logout lifecycle.

pub mod manager;
pub mod state;
pub mod store;
pub mod vault;

pub use manager::{AuthService, SessionInfo};
pub use state::{SessionChange, SessionField, SessionState, SessionValue};
pub use store::{Listener, SessionStore, Subscription};
pub use vault::{CredentialVault, StoredCredentials};
