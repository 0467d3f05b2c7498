//! Session lifecycle: store, bootstrap, refresh, logout.
//!
//! This module provides:
//! - `SessionStore`: in-memory single source of truth the UI observes
//! - `AuthClient`: login, silent bootstrap, and logout surface
//! - `RefreshCoordinator`: single-flight token refresh with queued replay
//! - `LogoutCoordinator`: unconditional client-side session teardown
//!
//! Sessions live only in memory; tokens are never written to durable
//! storage.

pub mod client;
pub mod logout;
pub mod refresh;
pub mod session;
pub mod store;

pub use client::AuthClient;
pub use logout::LogoutCoordinator;
pub use refresh::{RefreshCoordinator, RefreshError};
pub use session::{AccessToken, Session, SessionState, User};
pub use store::SessionStore;
