//! REST API client module for the Staycache backend.
//!
//! This module provides the retry-capable [`ApiClient`] and the
//! [`Transport`] seam it sends through, along with the crate-wide
//! [`ApiError`] taxonomy.
//!
//! Authenticated endpoints use a JWT bearer token obtained through the
//! login endpoint.

pub mod client;
pub mod error;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ApiClient, ApiRequest, ApiResponse, ReqwestTransport, Transport};
pub use error::{extract_server_message, ApiError};
