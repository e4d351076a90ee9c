//! The shared user data store.
//!
//! `DataStore` owns an `ApiClient`, the last fetched user list and the
//! currently selected user. Construct it once, wrap it in an `Arc`, and hand
//! clones of that handle to everything that needs user data.

pub mod data_store;

pub use data_store::DataStore;
