//! HTTP middleware for request processing and protection.
//!
//! Provides the edge redirect, authentication, rate limiting, and observability middleware.

pub mod auth;
pub mod edge_redirect;
pub mod rate_limit;
pub mod tracing;
