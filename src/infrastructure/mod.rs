//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for data persistence and caching.
//!
//! # Modules
//!
//! - [`cache`] - Key-value cache (Redis, in-memory and no-op backends)
//! - [`metrics`] - Prometheus recorder for the `metrics` counters
//! - [`persistence`] - PostgreSQL repository implementations

pub mod cache;
pub mod metrics;
pub mod persistence;
