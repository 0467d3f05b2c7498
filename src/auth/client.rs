//! Authentication surface: interactive login, silent bootstrap, logout.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::api::{ApiError, ApiRequest, Transport};

use super::logout::LogoutCoordinator;
use super::session::{SessionPayload, User};
use super::store::SessionStore;

#[derive(Clone)]
pub struct AuthClient {
    transport: Arc<dyn Transport>,
    store: SessionStore,
    logout: LogoutCoordinator,
    bootstrapped: Arc<OnceCell<()>>,
}

impl AuthClient {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        store: SessionStore,
        logout: LogoutCoordinator,
    ) -> Self {
        Self {
            transport,
            store,
            logout,
            bootstrapped: Arc::new(OnceCell::new()),
        }
    }

    /// Silently establish a session from the ambient credential.
    ///
    /// Runs once per process; later calls await the first run and return.
    /// Resolves to an authenticated or anonymous store, never to an
    /// error: an absent or expired credential is the normal first-visit
    /// path. The store reads `Loading` until this settles.
    pub async fn bootstrap(&self) {
        self.bootstrapped
            .get_or_init(|| async {
                self.store.set_loading();
                match self.try_bootstrap().await {
                    Ok(user) => info!(user = %user.name, "Session bootstrapped"),
                    Err(error) => {
                        debug!(error = %error, "Bootstrap resolved anonymous");
                        self.store.clear();
                    }
                }
            })
            .await;
    }

    async fn try_bootstrap(&self) -> Result<User, ApiError> {
        let request = ApiRequest::post("/auth/refresh-token", None);
        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(ApiError::from_status(
                response.status,
                &response.body.to_string(),
            ));
        }
        let payload: SessionPayload = serde_json::from_value(response.body)
            .map_err(|error| ApiError::InvalidResponse(error.to_string()))?;
        let session = payload.into_session();
        let user = session.user.clone();
        self.store.write(session);
        Ok(user)
    }

    /// Authenticate with email and password.
    ///
    /// On success the session lands in the store and the server has set
    /// the ambient refresh credential on the transport's cookie jar.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let request = ApiRequest::post("/auth/login", Some(body));
        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(ApiError::from_status(
                response.status,
                &response.body.to_string(),
            ));
        }
        let payload: SessionPayload = serde_json::from_value(response.body)
            .map_err(|error| ApiError::InvalidResponse(error.to_string()))?;
        let session = payload.into_session();
        let user = session.user.clone();
        self.store.write(session);
        info!(user = %user.name, "Logged in");
        Ok(user)
    }

    /// Tear down the session. See [`LogoutCoordinator::logout`].
    pub async fn logout(&self) {
        self.logout.logout().await;
    }
}
