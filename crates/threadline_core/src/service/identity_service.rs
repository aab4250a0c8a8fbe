//! Identity registration use-case service.
//!
//! # Responsibility
//! - Validate registration input and create identity + profile atomically.
//! - Provide read access to identities and profiles.
//!
//! # Invariants
//! - Display names are unique; a taken name is a validation error.
//! - Credential hashing happens outside core; the hash is stored verbatim.

use crate::error::{CoreError, CoreResult};
use crate::model::identity::{Identity, IdentityKey, ProfileDetail, RegistrationRequest};
use crate::repo::identity_repo::IdentityRepository;
use log::{info, warn};

/// Identity service facade over repository implementations.
pub struct IdentityService<R: IdentityRepository> {
    repo: R,
}

impl<R: IdentityRepository> IdentityService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a new identity and its profile.
    pub fn register(&self, request: &RegistrationRequest) -> CoreResult<Identity> {
        if let Err(err) = request.validate() {
            warn!("event=identity_register module=identity status=rejected reason=validation");
            return Err(err.into());
        }

        match self.repo.create_identity(request) {
            Ok(identity) => {
                info!(
                    "event=identity_register module=identity status=ok key={}",
                    identity.key
                );
                Ok(identity)
            }
            Err(err) => {
                let err = CoreError::from(err);
                warn!(
                    "event=identity_register module=identity status=error kind={}",
                    err.kind().as_str()
                );
                Err(err)
            }
        }
    }

    pub fn get_identity(&self, key: IdentityKey) -> CoreResult<Option<Identity>> {
        Ok(self.repo.get_identity(key)?)
    }

    pub fn get_profile(&self, key: IdentityKey) -> CoreResult<Option<ProfileDetail>> {
        Ok(self.repo.get_profile(key)?)
    }
}
