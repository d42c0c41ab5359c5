//! Client configuration: API base URL, token storage and request timeouts.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::api::auth::{FileBackend, KeychainBackend, MemoryBackend, TokenBackend};

/// Base URL used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Timeout applied to every request unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Multipart uploads (new paperwork, new version).
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// File downloads.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// CSV report export.
pub const EXPORT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the token pair is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenStoreKind {
    #[default]
    File,
    Keychain,
    Memory,
}

impl FromStr for TokenStoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(TokenStoreKind::File),
            "keychain" => Ok(TokenStoreKind::Keychain),
            "memory" => Ok(TokenStoreKind::Memory),
            other => Err(format!(
                "unknown token store '{}' (expected file, keychain or memory)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root without trailing slash.
    pub base_url: String,
    pub default_timeout: Duration,
    pub token_store: TokenStoreKind,
    /// Token file location for `TokenStoreKind::File`.
    pub token_file: Option<PathBuf>,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            default_timeout: DEFAULT_TIMEOUT,
            token_store: TokenStoreKind::default(),
            token_file: FileBackend::default_path(),
        }
    }

    /// Read configuration from the environment.
    ///
    /// Base URL: `PAPERWORK_API_URL` > `VITE_API_URL` > `DEFAULT_API_URL`.
    /// Token store: `PAPERWORK_TOKEN_STORE` (`file`, `keychain`, `memory`).
    /// Token file: `PAPERWORK_TOKEN_FILE`.
    pub fn from_env() -> Result<Self, String> {
        let base_url = std::env::var("PAPERWORK_API_URL")
            .or_else(|_| std::env::var("VITE_API_URL"))
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let mut config = Self::new(&base_url);
        if let Ok(kind) = std::env::var("PAPERWORK_TOKEN_STORE") {
            config.token_store = kind.parse()?;
        }
        if let Ok(path) = std::env::var("PAPERWORK_TOKEN_FILE") {
            config.token_file = Some(PathBuf::from(path));
        }
        Ok(config)
    }

    /// Build the configured token backend.
    pub fn token_backend(&self) -> Result<Box<dyn TokenBackend>, String> {
        match self.token_store {
            TokenStoreKind::File => {
                let path = self
                    .token_file
                    .clone()
                    .ok_or("No config directory available for the token file")?;
                Ok(Box::new(FileBackend::new(path)))
            }
            TokenStoreKind::Keychain => Ok(Box::new(KeychainBackend::new())),
            TokenStoreKind::Memory => Ok(Box::new(MemoryBackend::new())),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = ClientConfig::new("https://pms.example.org/");
        assert_eq!(config.base_url, "https://pms.example.org");
        assert_eq!(config.default_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_token_store_kind_parse() {
        assert_eq!("file".parse::<TokenStoreKind>().unwrap(), TokenStoreKind::File);
        assert_eq!(" Keychain ".parse::<TokenStoreKind>().unwrap(), TokenStoreKind::Keychain);
        assert_eq!("memory".parse::<TokenStoreKind>().unwrap(), TokenStoreKind::Memory);
        assert!("cookie".parse::<TokenStoreKind>().is_err());
    }

    #[test]
    fn test_file_backend_requires_path() {
        let mut config = ClientConfig::default();
        config.token_file = None;
        assert!(config.token_backend().is_err());

        config.token_store = TokenStoreKind::Memory;
        assert!(config.token_backend().is_ok());
    }
}
