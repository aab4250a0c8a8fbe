//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Own authorization and validation decisions; repositories own SQL.
//!
//! # Invariants
//! - Services hold no state between calls beyond their repository handles.
//! - Callers pass identity keys explicitly; there is no ambient session.

pub mod authorization;
pub mod content_service;
pub mod graph_service;
pub mod identity_service;
pub mod sequence_allocator;
