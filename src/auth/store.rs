//! In-memory session store, the single source of truth for session state.
//!
//! All mutation funnels through `write`/`clear` so atomicity and ordering
//! are enforced in one place. The store never touches the network or
//! durable storage. UI code reads and subscribes; it never writes.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;

use super::session::{AccessToken, Session, SessionState};

struct Shared {
    state: SessionState,
    /// Bumped on every authoritative write. A writer that suspended across
    /// a network call uses [`SessionStore::write_if_fresh`] with the epoch
    /// it captured, so a logout or newer login that landed in the meantime
    /// is not overwritten.
    epoch: u64,
}

/// Clone-able handle to the shared session state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<Shared>>,
    notify: watch::Sender<SessionState>,
}

impl SessionStore {
    pub fn new() -> Self {
        let initial = SessionState::Loading;
        let (notify, _) = watch::channel(initial.clone());
        Self {
            inner: Arc::new(Mutex::new(Shared {
                state: initial,
                epoch: 0,
            })),
            notify,
        }
    }

    pub fn read(&self) -> SessionState {
        self.lock().state.clone()
    }

    /// Current access token, if a session is held.
    pub fn token(&self) -> Option<AccessToken> {
        self.lock()
            .state
            .session()
            .map(|session| session.access_token.clone())
    }

    pub fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    pub fn write(&self, session: Session) {
        let mut shared = self.lock();
        shared.epoch += 1;
        shared.state = SessionState::Authenticated(session);
        self.notify.send_replace(shared.state.clone());
    }

    /// Write the session only if no authoritative write landed since
    /// `epoch` was captured. Returns false when the write was discarded.
    pub fn write_if_fresh(&self, session: Session, epoch: u64) -> bool {
        let mut shared = self.lock();
        if shared.epoch != epoch {
            return false;
        }
        shared.epoch += 1;
        shared.state = SessionState::Authenticated(session);
        self.notify.send_replace(shared.state.clone());
        true
    }

    /// Reset to anonymous. The epoch moves even when the state is already
    /// anonymous: a logout request is authoritative and must invalidate
    /// any refresh that is still in flight, whatever the state was when
    /// that refresh captured its epoch. Only the duplicate notification
    /// is suppressed, so subscribers see a single transition.
    pub fn clear(&self) {
        let mut shared = self.lock();
        shared.epoch += 1;
        if shared.state == SessionState::Anonymous {
            return;
        }
        shared.state = SessionState::Anonymous;
        self.notify.send_replace(shared.state.clone());
    }

    /// Entered while bootstrap is outstanding.
    pub(crate) fn set_loading(&self) {
        let mut shared = self.lock();
        shared.epoch += 1;
        if shared.state == SessionState::Loading {
            return;
        }
        shared.state = SessionState::Loading;
        self.notify.send_replace(shared.state.clone());
    }

    /// Observe state changes. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.notify.subscribe()
    }

    // A poisoned lock means a writer panicked between two plain field
    // assignments; the state is still consistent, so keep going.
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
