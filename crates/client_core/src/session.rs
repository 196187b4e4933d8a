//! Session gate: holds at most one authenticated identity, persists it to an
//! injected storage backend, and restores it across restarts.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use shared::domain::{Identity, Role};
use thiserror::Error;
use tracing::{info, warn};

/// Storage key of the serialized identity record.
pub const SESSION_KEY: &str = "dp_auth";

const GUEST_EMAIL: &str = "guest@digipraman.gov";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("session storage failure: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Durable key-value backend behind the session gate.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<String>>;
    async fn write(&self, key: &str, value: &str) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
}

#[async_trait]
impl SessionStorage for storage::Storage {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        self.kv_read(key).await
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        self.kv_write(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.kv_delete(key).await
    }
}

/// Credential checker behind `login`. A production deployment swaps the mock
/// for a real provider returning [`SessionError::InvalidCredentials`] on
/// rejection; call sites stay unchanged.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authenticate(
        &self,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<Identity, SessionError>;
}

/// Accepts any credentials and the caller-selected role. Empty emails are
/// substituted with the guest address; the password is ignored entirely.
pub struct MockIdentityProvider;

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn authenticate(
        &self,
        email: &str,
        _password: &str,
        role: Role,
    ) -> Result<Identity, SessionError> {
        let email = if email.is_empty() { GUEST_EMAIL } else { email };
        Ok(Identity {
            email: email.to_string(),
            role,
        })
    }
}

pub struct SessionManager {
    storage: Arc<dyn SessionStorage>,
    provider: Arc<dyn IdentityProvider>,
    current: Option<Identity>,
}

impl SessionManager {
    pub fn new(storage: Arc<dyn SessionStorage>, provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            storage,
            provider,
            current: None,
        }
    }

    /// Loads the persisted identity, if any. A record that fails to parse is
    /// deleted and treated as a logged-out session, never as an error.
    pub async fn restore(&mut self) -> Result<Option<&Identity>, SessionError> {
        let Some(raw) = self.storage.read(SESSION_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<Identity>(&raw) {
            Ok(identity) => Ok(Some(self.current.insert(identity))),
            Err(err) => {
                warn!(error = %err, "discarding corrupt session record");
                self.storage.delete(SESSION_KEY).await?;
                self.current = None;
                Ok(None)
            }
        }
    }

    pub async fn login(
        &mut self,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<&Identity, SessionError> {
        let identity = self.provider.authenticate(email, password, role).await?;
        let raw = serde_json::to_string(&identity).map_err(anyhow::Error::from)?;
        self.storage.write(SESSION_KEY, &raw).await?;
        info!(email = %identity.email, role = %identity.role, "session established");
        Ok(self.current.insert(identity))
    }

    /// Clears the identity and its persisted record. Safe to call with no
    /// active session.
    pub async fn logout(&mut self) -> Result<(), SessionError> {
        if self.current.take().is_some() {
            info!("session cleared");
        }
        self.storage.delete(SESSION_KEY).await?;
        Ok(())
    }

    pub fn current(&self) -> Option<&Identity> {
        self.current.as_ref()
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
