//! Session teardown.

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::{ApiRequest, Transport};

use super::store::SessionStore;

/// Clears the local session, then tells the server to invalidate the
/// ambient credential. The local clear is unconditional: it happens even
/// when the server call fails, so logout is always effective client-side.
#[derive(Clone)]
pub struct LogoutCoordinator {
    transport: Arc<dyn Transport>,
    store: SessionStore,
}

impl LogoutCoordinator {
    pub(crate) fn new(transport: Arc<dyn Transport>, store: SessionStore) -> Self {
        Self { transport, store }
    }

    /// Idempotent: when already anonymous only the server notification runs.
    pub async fn logout(&self) {
        if self.store.read().is_authenticated() {
            info!("Logging out, clearing session");
        }
        self.store.clear();

        // Best-effort invalidation of the server-side refresh credential.
        // Failure is logged, not retried, and never blocks the logout.
        let request = ApiRequest::post("/auth/logout", None);
        match self.transport.execute(request).await {
            Ok(response) if response.is_success() => {}
            Ok(response) => {
                warn!(status = %response.status, "Server rejected logout notification");
            }
            Err(error) => {
                warn!(error = %error, "Logout notification failed");
            }
        }
    }
}
