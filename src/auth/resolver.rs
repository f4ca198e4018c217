//! Credential resolvers and token stores

use super::types::Credential;
use crate::error::{Error, Result};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Produces the current bearer credential on demand.
///
/// Implementations must not cache, perform network I/O, or panic; a failed
/// lookup is reported as `None`.
pub trait CredentialResolver: Send + Sync {
    fn resolve(&self) -> Option<Credential>;
}

/// Persistent storage the login flow writes tokens into
pub trait TokenStore: Send + Sync {
    /// Read the stored credential, if any
    fn load(&self) -> Result<Option<Credential>>;
}

// ============================================================================
// Resolvers
// ============================================================================

/// Always unauthenticated
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialResolver for NoCredentials {
    fn resolve(&self) -> Option<Credential> {
        None
    }
}

/// A fixed credential
#[derive(Debug, Clone)]
pub struct StaticCredential(Credential);

impl StaticCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Credential::new(token))
    }

    pub fn from_credential(credential: Credential) -> Self {
        Self(credential)
    }
}

impl CredentialResolver for StaticCredential {
    fn resolve(&self) -> Option<Credential> {
        Some(self.0.clone()).filter(Credential::is_usable)
    }
}

/// Read-through resolver over a [`TokenStore`]
#[derive(Debug, Clone)]
pub struct StoreResolver<S> {
    store: S,
}

impl<S: TokenStore> StoreResolver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: TokenStore> CredentialResolver for StoreResolver<S> {
    fn resolve(&self) -> Option<Credential> {
        match self.store.load() {
            Ok(Some(credential)) if credential.is_usable() => Some(credential),
            Ok(Some(credential)) => {
                debug!(expires_at = ?credential.expires_at, "stored credential unusable, ignoring");
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "credential lookup failed, continuing unauthenticated");
                None
            }
        }
    }
}

// ============================================================================
// Token Stores
// ============================================================================

/// In-process store shared with the login flow.
///
/// Clones share the same slot. This layer only reads it.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    slot: Arc<RwLock<Option<Credential>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        let store = Self::new();
        store.set(credential);
        store
    }

    /// Store a credential (login)
    pub fn set(&self, credential: Credential) {
        let mut slot = self.slot.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        *slot = Some(credential);
    }

    /// Remove the credential (logout)
    pub fn clear(&self) {
        let mut slot = self.slot.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        *slot = None;
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<Credential>> {
        let slot = self
            .slot
            .read()
            .map_err(|_| Error::token_store("memory token store lock poisoned"))?;
        Ok(slot.clone())
    }
}

/// Token persisted on disk.
///
/// The file holds either a JSON object `{"token": ..., "expires_at": ...}`
/// or a bare token on its first line. A missing file means no credential.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<Credential>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let trimmed = contents.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        if trimmed.starts_with('{') {
            return Ok(Some(serde_json::from_str(trimmed)?));
        }
        Ok(trimmed.lines().next().map(|line| Credential::new(line.trim())))
    }
}

/// Token taken from an environment variable
#[derive(Debug, Clone)]
pub struct EnvTokenStore {
    var: String,
}

impl EnvTokenStore {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl TokenStore for EnvTokenStore {
    fn load(&self) -> Result<Option<Credential>> {
        match std::env::var(&self.var) {
            Ok(value) if value.trim().is_empty() => Ok(None),
            Ok(value) => Ok(Some(Credential::new(value.trim()))),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(e) => Err(Error::token_store(format!("{}: {e}", self.var))),
        }
    }
}
