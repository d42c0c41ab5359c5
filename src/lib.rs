//! Client library for the paperwork management service.
//!
//! - [`api`]: HTTP client with bearer injection, a five-minute response cache
//!   and typed operations for accounts, administration, paperworks, reports
//!   and notifications
//! - [`viewer`]: fetch-and-render state machine for submitted files
//! - [`routes`]: role gating for the application's screens

pub mod api;
pub mod config;
pub mod routes;
pub mod state;
pub mod viewer;
