//! # Folio Backend Library
//!
//! This crate contains the plumbing for the hosted backend-as-a-service the
//! Folio domain layer runs against: auth, tabular REST storage, object
//! storage, and serverless functions. It knows the wire protocol and
//! nothing about portfolios or tasks.
//!
//! ## Module Organization
//!
//! - `config`: Environment-driven backend configuration
//! - `client`: Shared HTTP client, key modes, session state
//! - `query`: Filter/order/limit query building over tables
//! - `auth`: Auth provider endpoints and session types
//! - `storage`: Object upload, removal, signed URLs
//! - `functions`: Serverless-function invocation
//! - `error`: Common error type

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod functions;
pub mod query;
pub mod storage;

/// Current version of the Folio backend library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
