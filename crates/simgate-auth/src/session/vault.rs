//! Persisted credentials: tokens and the serialized user record.

use tracing::warn;

use simgate_core::result::AppResult;
use simgate_core::traits::KeyValueStore;
use simgate_core::types::{AuthTokens, UserRecord};
use simgate_store::KvManager;

/// What a previous process left behind.
#[derive(Debug, Clone, Default)]
pub struct StoredCredentials {
    /// Access token.
    pub token: Option<String>,
    /// Refresh token.
    pub refresh_token: Option<String>,
    /// User record.
    pub user: Option<UserRecord>,
}

/// Reads and writes the credential keys of the persistent store.
#[derive(Debug, Clone)]
pub struct CredentialVault {
    kv: KvManager,
}

impl CredentialVault {
    /// Wrap a key-value manager.
    pub fn new(kv: KvManager) -> Self {
        Self { kv }
    }

    /// Persist a fresh login.
    pub fn save_login(&self, tokens: &AuthTokens, user: &UserRecord) -> AppResult<()> {
        self.save_tokens(tokens)?;
        self.save_user(user)
    }

    /// Persist a renewed token pair.
    pub fn save_tokens(&self, tokens: &AuthTokens) -> AppResult<()> {
        let keys = self.kv.keys();
        self.kv.set(&keys.auth_token(), &tokens.token)?;
        self.kv.set(&keys.refresh_token(), &tokens.refresh_token)
    }

    /// Persist the user record as JSON.
    pub fn save_user(&self, user: &UserRecord) -> AppResult<()> {
        self.kv.set_json(&self.kv.keys().current_user(), user)
    }

    /// Load whatever is stored. An unreadable user record is dropped.
    pub fn load(&self) -> AppResult<StoredCredentials> {
        let keys = self.kv.keys();
        let user = match self.kv.get_json::<UserRecord>(&keys.current_user()) {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Stored user record is unreadable");
                None
            }
        };
        Ok(StoredCredentials {
            token: self.kv.get(&keys.auth_token())?,
            refresh_token: self.kv.get(&keys.refresh_token())?,
            user,
        })
    }

    /// Remove tokens and user. Failures are logged, not returned.
    pub fn clear(&self) {
        for key in self.kv.keys().credentials() {
            if let Err(e) = self.kv.remove(&key) {
                warn!(key = %key, error = %e, "Failed to remove stored credential");
            }
        }
    }
}
