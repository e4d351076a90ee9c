//! Client-side user data access.
//!
//! - `api`: authenticated JSON requests with bounded retry
//! - `auth`: bearer token sources
//! - `cache`: in-memory cached values
//! - `config`: client configuration
//! - `models`: backend record types
//! - `store`: the shared `DataStore` holding cached users and the selection

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod models;
pub mod store;

pub use api::{ApiClient, ApiError, RequestOptions};
pub use auth::{FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenProvider};
pub use config::{Config, RetryPolicy, TokenSource};
pub use models::{ApiMessage, NewUser, User, UserId, UserUpdate};
pub use store::DataStore;
