//! Domain model for identities, content, and the follow graph.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep validation that needs no storage next to the records it guards.
//!
//! # Invariants
//! - Identities are addressed by a stable `IdentityKey`, never by display name.
//! - No entity in this model is ever deleted.

pub mod article;
pub mod identity;
