use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::TokenProvider;

/// Token file name in the config directory
pub const TOKEN_FILE: &str = "tokens.json";

/// Key the bearer token is stored under
pub const TOKEN_KEY: &str = "token";

/// Persistent key/value file holding the bearer token.
///
/// The file is a flat JSON object. Only [`TOKEN_KEY`] is read; other keys
/// written by other tools are preserved on `store` and `clear`. The file is
/// re-read on every `current_token` call.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store rooted in `dir`, using the default file name
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(TOKEN_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_entries(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read token file: {}", self.path.display()))?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse token file: {}", self.path.display()))
    }

    fn save_entries(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write token file: {}", self.path.display()))?;
        Ok(())
    }

    /// Save a token to disk
    pub fn store(&self, token: &str) -> Result<()> {
        let mut entries = self.load_entries()?;
        entries.insert(TOKEN_KEY.to_string(), token.to_string());
        self.save_entries(&entries)
    }

    /// Remove the token, leaving any other keys in place
    pub fn clear(&self) -> Result<()> {
        let mut entries = self.load_entries()?;
        if entries.remove(TOKEN_KEY).is_some() {
            self.save_entries(&entries)?;
        }
        Ok(())
    }
}

impl TokenProvider for FileTokenStore {
    fn current_token(&self) -> Result<Option<String>> {
        Ok(self.load_entries()?.remove(TOKEN_KEY))
    }
}
