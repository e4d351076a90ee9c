//! Bearer token sources.
//!
//! This module provides:
//! - `TokenProvider`: the "get current token" capability the API client reads
//!   on every request
//! - `MemoryTokenStore`: an in-process token, settable at runtime
//! - `FileTokenStore`: a JSON key/value file holding the token under one key
//! - `KeyringTokenStore`: a token kept in the OS keychain via keyring
//!
//! Tokens are never cached, validated or refreshed here.

pub mod credentials;
pub mod session;
pub mod token;

pub use credentials::KeyringTokenStore;
pub use session::FileTokenStore;
pub use token::{MemoryTokenStore, TokenProvider};
