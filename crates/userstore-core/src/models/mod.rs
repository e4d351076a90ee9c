//! Data models for backend entities.
//!
//! - `User`: a backend user record, with unknown fields kept as an opaque payload
//! - `NewUser`, `UserUpdate`: request bodies for the user mutation routes
//! - `ApiMessage`: the `{"message": ...}` acknowledgement the backend returns

pub mod user;

pub use user::{ApiMessage, NewUser, User, UserId, UserUpdate};
