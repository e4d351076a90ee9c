use std::sync::{PoisonError, RwLock};

use anyhow::Result;

/// Source of the bearer token attached to outgoing requests.
///
/// Implementations are consulted on every request, so a token changed
/// between two calls is picked up by the second one.
pub trait TokenProvider: Send + Sync {
    /// Current token, or `None` when nothing is stored
    fn current_token(&self) -> Result<Option<String>>;
}

/// Token held in memory. Used for `USERSTORE_TOKEN` and in tests.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Replace the stored token
    pub fn set(&self, token: impl Into<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.into());
    }

    pub fn clear(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl TokenProvider for MemoryTokenStore {
    fn current_token(&self) -> Result<Option<String>> {
        Ok(self.token.read().unwrap_or_else(PoisonError::into_inner).clone())
    }
}
