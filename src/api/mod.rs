//! Transport seam and authenticated request pipeline.
//!
//! This module provides the `Transport` abstraction over the network,
//! the production `HttpTransport` backed by reqwest, and the `ApiClient`
//! pipeline that attaches bearer tokens and drives the refresh-and-retry
//! protocol on authentication failures.

pub mod client;
pub mod error;
pub mod transport;

pub use client::ApiClient;
pub use error::ApiError;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
