//! Persisted access/refresh token storage.
//!
//! The token pair lives under the fixed keys `access` and `refresh` in one of
//! three backends: a JSON file in the user's config dir (default), the OS
//! keychain via the `keyring` crate, or process memory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use keyring::Entry;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Keychain service name.
const SERVICE_NAME: &str = "com.paperwork.client";

/// Storage key for the access token.
pub const ACCESS_KEY: &str = "access";

/// Storage key for the refresh token.
pub const REFRESH_KEY: &str = "refresh";

#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("Keychain operation failed: {0}")]
    Keychain(String),
    #[error("Token file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Token file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl From<keyring::Error> for TokenStoreError {
    fn from(err: keyring::Error) -> Self {
        TokenStoreError::Keychain(err.to_string())
    }
}

/// Access/refresh token pair as returned by the login endpoints.
#[derive(Clone, PartialEq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair").finish_non_exhaustive()
    }
}

/// Key/value storage for the two token slots.
pub trait TokenBackend: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, TokenStoreError>;
    fn write(&self, key: &str, value: &str) -> Result<(), TokenStoreError>;
    /// Idempotent: removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), TokenStoreError>;
}

// ── Backends ──────────────────────────────────────────────────────────────────

/// Tokens held only for the lifetime of the process.
#[derive(Default)]
pub struct MemoryBackend {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>, TokenStoreError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), TokenStoreError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), TokenStoreError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(mut old) = values.remove(key) {
            old.zeroize();
        }
        Ok(())
    }
}

/// Tokens stored in the OS keychain, one entry per key.
pub struct KeychainBackend {
    service: String,
}

impl KeychainBackend {
    pub fn new() -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
        }
    }
}

impl Default for KeychainBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenBackend for KeychainBackend {
    fn read(&self, key: &str) -> Result<Option<String>, TokenStoreError> {
        let entry = Entry::new(&self.service, key)?;
        match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(TokenStoreError::from(e)),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), TokenStoreError> {
        let entry = Entry::new(&self.service, key)?;
        entry.set_password(value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), TokenStoreError> {
        let entry = Entry::new(&self.service, key)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(TokenStoreError::from(e)),
        }
    }
}

/// Tokens stored as a flat JSON object in a file.
pub struct FileBackend {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// `<config dir>/paperwork/tokens.json`, or `None` when the platform has
    /// no config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("paperwork").join("tokens.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<HashMap<String, String>, TokenStoreError> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(HashMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, values: &HashMap<String, String>) -> Result<(), TokenStoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_vec(values)?)?;
        Ok(())
    }
}

impl TokenBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>, TokenStoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.load()?.remove(key))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), TokenStoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut values = self.load()?;
        values.insert(key.to_string(), value.to_string());
        self.save(&values)
    }

    fn remove(&self, key: &str) -> Result<(), TokenStoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut values = self.load()?;
        if values.remove(key).is_some() {
            self.save(&values)?;
        }
        Ok(())
    }
}

// ── Token Store ───────────────────────────────────────────────────────────────

/// Access/refresh token pair over a storage backend.
///
/// No expiry is tracked here; a stale token is only discovered when the server
/// answers 401, at which point the client calls `clear()`.
pub struct TokenStore {
    backend: Box<dyn TokenBackend>,
}

impl TokenStore {
    pub fn new(backend: Box<dyn TokenBackend>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryBackend::new()))
    }

    /// Persist both tokens.
    pub fn set(&self, pair: &TokenPair) -> Result<(), TokenStoreError> {
        self.backend.write(ACCESS_KEY, &pair.access)?;
        self.backend.write(REFRESH_KEY, &pair.refresh)?;
        Ok(())
    }

    /// Current access token.
    ///
    /// A backend read failure is logged and treated as "no token", which
    /// sends the request unauthenticated and lets the server answer 401.
    pub fn get(&self) -> Option<String> {
        match self.backend.read(ACCESS_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                log::warn!("Failed to read access token: {}", e);
                None
            }
        }
    }

    pub fn refresh(&self) -> Option<String> {
        match self.backend.read(REFRESH_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                log::warn!("Failed to read refresh token: {}", e);
                None
            }
        }
    }

    /// Remove both tokens. Both removals are attempted even if the first fails.
    pub fn clear(&self) -> Result<(), TokenStoreError> {
        let access = self.backend.remove(ACCESS_KEY);
        let refresh = self.backend.remove(REFRESH_KEY);
        access.and(refresh)
    }
}
