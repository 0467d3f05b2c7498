//! Authenticated request pipeline.
//!
//! A process-wide "private client" through which every protected call
//! flows. Two stages run in a fixed order, independent of any UI
//! lifetime: attach the current bearer token, then recover a single
//! authentication failure through the refresh protocol.
//!
//! A request that fails auth a second time after its one retry is
//! terminal: its caller gets [`ApiError::Unauthorized`] and the request
//! is never requeued, which is what breaks the retry loop when a freshly
//! refreshed token is still rejected.

use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::auth::{RefreshCoordinator, SessionStore};

use super::{ApiError, ApiRequest, ApiResponse, Transport};

/// A protected request plus its retry budget.
struct PendingRequest {
    request: ApiRequest,
    /// Flips to true at most once, before the request is replayed.
    retried: bool,
}

impl PendingRequest {
    fn new(request: ApiRequest) -> Self {
        Self {
            request,
            retried: false,
        }
    }

    fn mark_retried(&mut self) {
        self.retried = true;
    }
}

fn is_auth_failure(response: &ApiResponse) -> bool {
    // The backend signals an expired/invalid/missing credential with
    // either code; both take the refresh path.
    matches!(response.status.as_u16(), 401 | 403)
}

#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    store: SessionStore,
    refresh: RefreshCoordinator,
}

impl ApiClient {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        store: SessionStore,
        refresh: RefreshCoordinator,
    ) -> Self {
        Self {
            transport,
            store,
            refresh,
        }
    }

    /// Send a request through the private pipeline.
    ///
    /// The bearer token is re-read from the store on every attempt, so a
    /// replay after refresh automatically carries the new token. Network
    /// errors surface directly and never trigger a refresh.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut pending = PendingRequest::new(request);
        loop {
            let mut request = pending.request.clone();
            if request.authorization.is_none() {
                if let Some(token) = self.store.token() {
                    request = request.bearer(token.secret());
                }
            }

            let response = self.transport.execute(request).await?;
            if !is_auth_failure(&response) {
                return Ok(response);
            }

            if pending.retried {
                debug!(path = %pending.request.path, "Auth failure on replayed request, giving up");
                return Err(ApiError::Unauthorized);
            }
            pending.mark_retried();

            debug!(path = %pending.request.path, "Auth failure, refreshing session");
            self.refresh.refresh().await?;
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(ApiRequest::get(path)).await?;
        Self::parse(response)
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = Self::to_body(body)?;
        let response = self.send(ApiRequest::post(path, Some(body))).await?;
        Self::parse(response)
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = Self::to_body(body)?;
        let response = self.send(ApiRequest::put(path, Some(body))).await?;
        Self::parse(response)
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let response = self.send(ApiRequest::delete(path)).await?;
        if response.is_success() {
            Ok(())
        } else {
            Err(ApiError::from_status(
                response.status,
                &response.body.to_string(),
            ))
        }
    }

    fn to_body<B: Serialize>(body: &B) -> Result<Value, ApiError> {
        serde_json::to_value(body).map_err(|error| ApiError::InvalidRequest(error.to_string()))
    }

    /// Non-success statuses that reach this point are not auth failures;
    /// they pass through the taxonomy untouched.
    fn parse<T: DeserializeOwned>(response: ApiResponse) -> Result<T, ApiError> {
        if !response.is_success() {
            return Err(ApiError::from_status(
                response.status,
                &response.body.to_string(),
            ));
        }
        serde_json::from_value(response.body)
            .map_err(|error| ApiError::InvalidResponse(error.to_string()))
    }

    /// Escape hatch for callers that need a method the typed helpers do
    /// not cover.
    pub async fn request(&self, method: Method, path: &str) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::new(method, path)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_unserializable_body_is_a_request_error() {
        // Tuple map keys cannot become JSON object keys.
        let mut body = HashMap::new();
        body.insert((1u8, 2u8), "x");

        let err = ApiClient::to_body(&body).expect_err("tuple keys cannot serialize");
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }
}

