//! Single-flight token refresh.
//!
//! The backend rotates the ambient refresh credential on every use, so two
//! overlapping refresh calls can invalidate each other and log the user
//! out spuriously. This coordinator guarantees at most one refresh call is
//! in flight: the first caller to find the machine idle spawns the one
//! settling task that issues the network call; every caller (that first
//! one included) parks on a oneshot waiter and receives the shared
//! outcome once the call settles. Because the call lives in its own
//! task, a caller cancelled mid-wait cannot abandon the in-flight state.
//!
//! State machine: `idle -> in-flight -> idle`. There is no
//! `in-flight -> in-flight` edge; concurrent triggers enqueue instead of
//! issuing a second call.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, warn};

use crate::api::{ApiError, ApiRequest, Transport};

use super::logout::LogoutCoordinator;
use super::session::{AccessToken, SessionPayload};
use super::store::SessionStore;

/// Why a refresh settled as failed. Clone-able so one outcome can fan out
/// to every queued waiter.
#[derive(Debug, Clone, Error)]
pub enum RefreshError {
    #[error("refresh rejected - ambient credential absent, invalid, or expired")]
    Rejected,

    #[error("network error during refresh: {0}")]
    Network(String),

    #[error("invalid refresh response: {0}")]
    Invalid(String),
}

impl From<RefreshError> for ApiError {
    fn from(error: RefreshError) -> Self {
        match error {
            RefreshError::Rejected => ApiError::Unauthorized,
            other => ApiError::RefreshFailed(other.to_string()),
        }
    }
}

type RefreshOutcome = Result<AccessToken, RefreshError>;

#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    /// Non-empty only while a refresh is in flight.
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

#[derive(Clone)]
pub struct RefreshCoordinator {
    transport: Arc<dyn Transport>,
    store: SessionStore,
    logout: LogoutCoordinator,
    state: Arc<Mutex<RefreshState>>,
}

impl RefreshCoordinator {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        store: SessionStore,
        logout: LogoutCoordinator,
    ) -> Self {
        Self {
            transport,
            store,
            logout,
            state: Arc::new(Mutex::new(RefreshState::default())),
        }
    }

    /// Obtain a fresh access token, collapsing concurrent callers into a
    /// single refresh call. On success the new session is already in the
    /// store when this returns, so callers can replay immediately. On
    /// failure the session has been torn down via [`LogoutCoordinator`].
    pub async fn refresh(&self) -> Result<AccessToken, RefreshError> {
        let (tx, rx) = oneshot::channel();
        let leader = {
            let mut state = self.state.lock().await;
            state.waiters.push(tx);
            if state.in_flight {
                false
            } else {
                state.in_flight = true;
                true
            }
        };

        if leader {
            // The call runs in its own task: the caller that won the
            // leader election may itself be cancelled (timeout, select,
            // task abort), and an abandoned in-flight state would leave
            // every waiter queued behind a refresh that never settles.
            let coordinator = self.clone();
            tokio::spawn(async move { coordinator.run_refresh().await });
        }

        match rx.await {
            Ok(outcome) => outcome,
            // Settling task gone; only possible during runtime shutdown.
            Err(_) => Err(RefreshError::Network("refresh abandoned".to_string())),
        }
    }

    /// Drive one refresh call to settlement and fan the outcome out.
    async fn run_refresh(&self) {
        // Capture the epoch before suspending so a logout requested
        // while this call is outstanding wins over its result.
        let epoch = self.store.epoch();
        let outcome = self.execute_refresh(epoch).await;

        let waiters = {
            let mut state = self.state.lock().await;
            state.in_flight = false;
            std::mem::take(&mut state.waiters)
        };
        debug!(
            waiters = waiters.len(),
            ok = outcome.is_ok(),
            "Refresh settled"
        );
        for waiter in waiters {
            // A waiter whose caller went away is fine to skip.
            let _ = waiter.send(outcome.clone());
        }

        if outcome.is_err() {
            self.logout.logout().await;
        }
    }

    async fn execute_refresh(&self, epoch: u64) -> RefreshOutcome {
        // Unauthenticated call; the transport carries the ambient credential.
        let request = ApiRequest::post("/auth/refresh-token", None);
        let response = match self.transport.execute(request).await {
            Ok(response) => response,
            Err(error) => {
                warn!(error = %error, "Refresh call failed");
                return Err(RefreshError::Network(error.to_string()));
            }
        };

        if !response.is_success() {
            debug!(status = %response.status, "Refresh rejected by server");
            return Err(RefreshError::Rejected);
        }

        let payload: SessionPayload = serde_json::from_value(response.body)
            .map_err(|error| RefreshError::Invalid(error.to_string()))?;
        let session = payload.into_session();
        let token = session.access_token.clone();

        if !self.store.write_if_fresh(session, epoch) {
            // A logout (or newer login) landed while the call was out; do
            // not resurrect the cleared session. Waiters still get the
            // token and their replays settle against the server's view.
            debug!("Discarding refresh result, session epoch moved");
        }
        Ok(token)
    }
}
