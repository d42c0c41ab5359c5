//! API client module for the paperwork service.
//!
//! Provides the HTTP client with auth header injection and response caching,
//! token storage, and one module of typed operations per API area.

pub mod accounts;
pub mod admin;
pub mod auth;
pub mod cache;
pub mod client;
pub mod error;
pub mod notifications;
pub mod paperworks;
pub mod reports;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ApiClient, ApiResponse, RequestBody, RequestOptions};
pub use error::ApiError;
