//! Domain layer containing business entities and collaborator contracts.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Durable-store trait definitions
//! - [`visit_event`] - Visit telemetry event and its fire-and-forget sender
//!
//! # Visit Processing Flow
//!
//! 1. The edge redirect middleware decides to redirect
//! 2. A [`visit_event::VisitEvent`] is offered to a bounded channel (never awaited)
//! 3. [`crate::application::services::visit_logger::run_visit_worker`] drains the channel
//! 4. The visit is persisted via [`repositories::VisitRepository`]

pub mod entities;
pub mod repositories;
pub mod visit_event;
