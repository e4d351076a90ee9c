//! API client for the user backend.
//!
//! This module provides the `ApiClient` struct for making authenticated,
//! retried JSON requests and the typed user endpoints built on top of it.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, Method, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::auth::TokenProvider;
use crate::config::{Config, RetryPolicy, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::models::{ApiMessage, NewUser, User, UserId, UserUpdate};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Users collection, relative to the base URL
const USERS_ENDPOINT: &str = "users";

const JSON_CONTENT_TYPE: &str = "application/json";

/// Method, body and extra headers for one logical request.
///
/// `Authorization` and `Content-Type` entries in `headers` are always
/// replaced before the request goes out.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<serde_json::Value>,
    pub headers: header::HeaderMap,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::new(Method::GET)
    }
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            body: None,
            headers: header::HeaderMap::new(),
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    pub fn post<B: Serialize>(body: &B) -> Result<Self> {
        Self::new(Method::POST).with_body(body)
    }

    pub fn put<B: Serialize>(body: &B) -> Result<Self> {
        Self::new(Method::PUT).with_body(body)
    }

    pub fn with_body<B: Serialize>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_value(body).context("Failed to serialize request body")?);
        Ok(self)
    }

    pub fn with_header(mut self, name: header::HeaderName, value: &str) -> Result<Self> {
        self.headers.insert(name, header::HeaderValue::from_str(value)?);
        Ok(self)
    }
}

/// Authenticated client for the user backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    tokens: Arc<dyn TokenProvider>,
    retry: RetryPolicy,
}

impl ApiClient {
    /// Create a client with the default timeout and retry policy
    pub fn new(base_url: Url, tokens: Arc<dyn TokenProvider>) -> Result<Self> {
        Self::build(
            base_url,
            tokens,
            RetryPolicy::default(),
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Create a client from loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::build(
            config.base_url()?,
            config.token_provider()?,
            config.retry_policy(),
            config.request_timeout(),
        )
    }

    fn build(
        base_url: Url,
        tokens: Arc<dyn TokenProvider>,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            tokens,
            retry,
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Absolute URLs pass through; anything else is joined onto the base URL
    fn resolve_url(&self, path: &str) -> Result<Url> {
        if let Ok(url) = Url::parse(path) {
            return Ok(url);
        }
        self.base_url
            .join(path.trim_start_matches('/'))
            .with_context(|| format!("Invalid request path: {}", path))
    }

    /// Caller headers with the bearer token and JSON content type forced in.
    /// The token is read now, not when the client was built.
    fn request_headers(&self, options: &RequestOptions) -> Result<header::HeaderMap> {
        let mut headers = options.headers.clone();
        match self.tokens.current_token().context("Failed to read bearer token")? {
            Some(token) => {
                headers.insert(
                    header::AUTHORIZATION,
                    header::HeaderValue::from_str(&format!("Bearer {}", token))?,
                );
            }
            None => {
                debug!("No bearer token available, sending request without one");
                headers.remove(header::AUTHORIZATION);
            }
        }
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static(JSON_CONTENT_TYPE),
        );
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// One attempt: send, check status, parse the JSON body
    async fn send_once<T: DeserializeOwned>(&self, url: &Url, options: &RequestOptions) -> Result<T> {
        let mut request = self
            .client
            .request(options.method.clone(), url.clone())
            .headers(self.request_headers(options)?);
        if let Some(ref body) = options.body {
            request = request.body(serde_json::to_vec(body)?);
        }

        let response = request
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send {} request to {}", options.method, url))?;

        let response = Self::check_response(response).await?;
        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    /// Send an authenticated JSON request, retrying failed attempts.
    ///
    /// Every attempt re-reads the token. A non-2xx status, a transport error
    /// or an unparseable body fails the attempt; after `max_attempts`
    /// failures the last attempt's error is returned.
    pub async fn authorized_request<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T> {
        let url = self.resolve_url(path)?;
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            debug!(method = %options.method, url = %url, attempt, "Sending request");
            match self.send_once(&url, &options).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < max_attempts => {
                    warn!(
                        url = %url,
                        attempt,
                        max_attempts,
                        delay_ms = self.retry.retry_delay.as_millis() as u64,
                        error = %e,
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(self.retry.retry_delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(e.context(format!(
                        "{} {} failed after {} attempt(s)",
                        options.method, url, attempt
                    )));
                }
            }
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.authorized_request(path, RequestOptions::get()).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        self.authorized_request(path, RequestOptions::post(body)?).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        self.authorized_request(path, RequestOptions::put(body)?).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.authorized_request(path, RequestOptions::delete()).await
    }

    // ===== User Endpoints =====

    /// Fetch every user, in backend order
    pub async fn fetch_users(&self) -> Result<Vec<User>> {
        self.get(USERS_ENDPOINT).await
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<ApiMessage> {
        self.post(USERS_ENDPOINT, user).await
    }

    pub async fn update_user(&self, id: UserId, update: &UserUpdate) -> Result<ApiMessage> {
        self.put(&Self::user_path(id), update).await
    }

    pub async fn delete_user(&self, id: UserId) -> Result<ApiMessage> {
        self.delete(&Self::user_path(id)).await
    }

    fn user_path(id: UserId) -> String {
        format!("{}/{}", USERS_ENDPOINT, id)
    }
}
