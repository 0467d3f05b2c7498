//! Transport seam between the session core and the network.
//!
//! Every backend call goes through the [`Transport`] trait so the refresh
//! and logout coordinators can be exercised against an in-memory fake.
//! [`HttpTransport`] is the production implementation: a `reqwest` client
//! with a cookie store, which is what carries the ambient refresh
//! credential the server sets at login.
//!
//! A network-level failure (no response, timeout) is an `Err`; any HTTP
//! response, success or not, is `Ok` so the request pipeline can inspect
//! the status itself.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client, Method, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;

use super::ApiError;

/// An outgoing request, before authentication is applied.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    /// Full `Authorization` header value, if the caller set one explicitly.
    /// The request pipeline fills this from the session store when absent.
    pub authorization: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            authorization: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Option<Value>) -> Self {
        let mut request = Self::new(Method::POST, path);
        request.body = body;
        request
    }

    pub fn put(path: impl Into<String>, body: Option<Value>) -> Self {
        let mut request = Self::new(Method::PUT, path);
        request.body = body;
        request
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a bearer token, overwriting any previous authorization.
    pub fn bearer(mut self, token: &str) -> Self {
        self.authorization = Some(format!("Bearer {}", token));
        self
    }
}

/// A completed HTTP exchange. The body is parsed leniently: non-JSON
/// payloads are kept as a string value rather than dropped.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// Production transport backed by reqwest.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            // The refresh credential is an HttpOnly cookie; the jar sends it
            // automatically on /auth/refresh-token and /auth/logout.
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.client.request(request.method.clone(), &url);

        if let Some(ref authorization) = request.authorization {
            builder = builder.header(header::AUTHORIZATION, authorization);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        debug!(%status, url = %url, "Response received");
        Ok(ApiResponse { status, body })
    }
}
