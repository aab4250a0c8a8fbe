//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repositories refuse connections that are not fully migrated.
//! - Multi-row mutations run inside one `IMMEDIATE` transaction.

pub mod article_repo;
pub mod error;
pub mod follow_repo;
pub mod identity_repo;
mod schema;
pub mod sequence_repo;
