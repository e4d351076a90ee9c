use anyhow::{Context, Result};
use keyring::Entry;

use super::TokenProvider;

const SERVICE_NAME: &str = "userstore";

/// Keychain account the token is stored under
const DEFAULT_ACCOUNT: &str = "token";

/// Bearer token kept in the OS keychain
#[derive(Debug, Clone)]
pub struct KeyringTokenStore {
    account: String,
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new(DEFAULT_ACCOUNT)
    }
}

impl KeyringTokenStore {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(SERVICE_NAME, &self.account).context("Failed to create keyring entry")
    }

    /// Store the token in the OS keychain
    pub fn store(&self, token: &str) -> Result<()> {
        self.entry()?
            .set_password(token)
            .context("Failed to store token in keychain")?;
        Ok(())
    }

    /// Delete the stored token. Deleting a missing entry is not an error.
    pub fn clear(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}

impl TokenProvider for KeyringTokenStore {
    fn current_token(&self) -> Result<Option<String>> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve token from keychain"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore = "needs an OS keychain (run with --ignored)"]
    fn test_token_visible_to_fresh_store() {
        let account = format!("test-account-{}", std::process::id());
        KeyringTokenStore::new(account.as_str()).store("abc").unwrap();

        let reader = KeyringTokenStore::new(account.as_str());
        let token = reader.current_token();
        reader.clear().unwrap();

        assert_eq!(token.unwrap().as_deref(), Some("abc"));
        assert_eq!(reader.current_token().unwrap(), None);
    }
}
