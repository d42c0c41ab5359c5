//! Client-side session state shared by every API call.
//!
//! Holds the response cache and the token store. One `ClientState` is built at
//! startup and handed to the `ApiClient`; tests build their own so they never
//! share cache entries or tokens.

use std::sync::Arc;

use crate::api::auth::{TokenPair, TokenStore, TokenStoreError};
use crate::api::cache::ResponseCache;

pub struct ClientState {
    /// Cached GET responses.
    pub cache: ResponseCache,

    /// Persisted access/refresh tokens.
    pub tokens: TokenStore,
}

impl ClientState {
    /// Build the state over the given token store with an empty cache.
    pub fn init(tokens: TokenStore) -> Arc<Self> {
        Arc::new(Self {
            cache: ResponseCache::new(),
            tokens,
        })
    }

    /// State with an in-memory token store.
    pub fn in_memory() -> Arc<Self> {
        Self::init(TokenStore::in_memory())
    }

    /// Store a freshly issued token pair.
    pub fn sign_in(&self, pair: &TokenPair) -> Result<(), TokenStoreError> {
        self.tokens.set(pair)
    }

    /// Explicit logout: forget the tokens. Cached responses stay until they
    /// go stale or a 401 purges them.
    pub fn sign_out(&self) -> Result<(), TokenStoreError> {
        self.tokens.clear()
    }

    /// Drop every cached response and both tokens.
    ///
    /// Called on any 401. The cache is cleared first so a token backend
    /// failure never leaves another principal's data servable.
    pub fn reset(&self) {
        self.cache.clear();
        if let Err(e) = self.tokens.clear() {
            log::warn!("Failed to clear stored tokens: {}", e);
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens.get().is_some()
    }
}
