//! REST API client module for the user backend.
//!
//! This module provides the `ApiClient` for authenticated JSON requests.
//! Each request carries `Authorization: Bearer <token>` read from a
//! `TokenProvider` at send time, and failed attempts are retried according
//! to the configured `RetryPolicy`.

pub mod client;
pub mod error;

pub use client::{ApiClient, RequestOptions};
pub use error::ApiError;
