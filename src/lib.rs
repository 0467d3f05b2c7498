//! tourdesk-client - session and API core for the Tourdesk admin frontend.
//!
//! This crate owns the one hard problem of the admin client: keeping an
//! authenticated session alive against a backend that hands out
//! short-lived access tokens and rotates the refresh credential on every
//! use. It bootstraps a session from the ambient cookie at startup,
//! attaches bearer tokens to outgoing calls, transparently recovers from
//! token expiry with an at-most-one-in-flight refresh that queues and
//! replays concurrent failures, and tears the session down on logout.
//!
//! Page-level concerns (routing, forms, tables) live in the frontend and
//! consume this core through two seams: the [`ApiClient`] request
//! pipeline and the [`SessionStore`] the UI reads and subscribes to.

pub mod api;
pub mod auth;
pub mod config;

use std::sync::Arc;

use anyhow::Result;

pub use api::{ApiClient, ApiError, ApiRequest, ApiResponse, HttpTransport, Transport};
pub use auth::{
    AccessToken, AuthClient, RefreshError, Session, SessionState, SessionStore, User,
};
pub use config::ClientConfig;

/// The assembled client: one store, one auth surface, one pipeline.
/// Constructed once at process start; all parts are cheap to clone and
/// share the same underlying state.
pub struct Client {
    store: SessionStore,
    auth: AuthClient,
    api: ApiClient,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(&config)?);
        Ok(Self::with_transport(transport))
    }

    /// Assemble against an injected transport. This is the seam the tests
    /// use to drive the session machinery against an in-memory fake.
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        let store = SessionStore::new();
        let logout = auth::LogoutCoordinator::new(Arc::clone(&transport), store.clone());
        let refresh = auth::RefreshCoordinator::new(
            Arc::clone(&transport),
            store.clone(),
            logout.clone(),
        );
        let auth = AuthClient::new(Arc::clone(&transport), store.clone(), logout);
        let api = ApiClient::new(transport, store.clone(), refresh);
        Self { store, auth, api }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }
}
