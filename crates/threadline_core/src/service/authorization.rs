//! Authorization resolver.
//!
//! # Responsibility
//! - Bridge display names to stable identity keys for ownership checks.
//! - Reject requests that carry no verified identity.
//!
//! # Invariants
//! - Every method is a pure read.

use crate::error::{CoreError, CoreResult};
use crate::model::identity::{IdentityKey, VerifiedIdentity};
use crate::repo::identity_repo::IdentityRepository;

/// Read-only name ↔ key resolver.
pub struct AuthorizationResolver<R: IdentityRepository> {
    repo: R,
}

impl<R: IdentityRepository> AuthorizationResolver<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns the identity key registered under `display_name`.
    pub fn resolve(&self, display_name: &str) -> CoreResult<Option<IdentityKey>> {
        let trimmed = display_name.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        Ok(self.repo.find_key_by_display_name(trimmed)?)
    }

    /// Returns the current display name of `key`, for presentation.
    pub fn display_name(&self, key: IdentityKey) -> CoreResult<Option<String>> {
        Ok(self.repo.find_display_name(key)?)
    }
}

/// Unwraps the identity attached by the authentication service.
pub fn require_identity(identity: Option<&VerifiedIdentity>) -> CoreResult<&VerifiedIdentity> {
    identity.ok_or(CoreError::Unauthenticated)
}
