//! Social graph use-case service.
//!
//! # Responsibility
//! - Resolve follow targets by display name and mutate the follower's set.
//! - Return the follower's updated following set as display names.
//!
//! # Invariants
//! - Repeating `follow` is a silent success; the set is unchanged.
//! - `unfollow` of an identity not currently followed is a validation error.
//! - An identity can never follow itself.

use crate::error::{CoreError, CoreResult};
use crate::model::identity::IdentityKey;
use crate::repo::follow_repo::FollowRepository;
use crate::repo::identity_repo::IdentityRepository;
use crate::service::authorization::AuthorizationResolver;
use log::info;

/// Follow-graph service facade.
pub struct GraphService<F: FollowRepository, I: IdentityRepository> {
    follows: F,
    resolver: AuthorizationResolver<I>,
}

impl<F: FollowRepository, I: IdentityRepository> GraphService<F, I> {
    pub fn new(follows: F, resolver: AuthorizationResolver<I>) -> Self {
        Self { follows, resolver }
    }

    /// Display names followed by `identity_key`, sorted ascending.
    pub fn get_following(&self, identity_key: IdentityKey) -> CoreResult<Vec<String>> {
        self.ensure_identity_exists(identity_key)?;
        Ok(self.follows.list_following_names(identity_key)?)
    }

    /// Display names followed by the identity registered as `display_name`.
    pub fn get_following_by_name(&self, display_name: &str) -> CoreResult<Vec<String>> {
        let key = self
            .resolver
            .resolve(display_name)?
            .ok_or_else(|| CoreError::NotFound(format!("identity `{}`", display_name.trim())))?;
        Ok(self.follows.list_following_names(key)?)
    }

    /// Adds `target_name` to the follower's set; already-following is a no-op.
    pub fn follow(&self, follower_key: IdentityKey, target_name: &str) -> CoreResult<Vec<String>> {
        self.ensure_identity_exists(follower_key)?;
        let target_key = self.resolve_target(target_name)?;
        if target_key == follower_key {
            return Err(CoreError::Validation(
                "an identity cannot follow itself".to_string(),
            ));
        }

        let added = self.follows.add_follow(follower_key, target_key)?;
        info!(
            "event=graph_follow module=graph status=ok changed={}",
            added
        );
        Ok(self.follows.list_following_names(follower_key)?)
    }

    /// Removes `target_name` from the follower's set.
    pub fn unfollow(
        &self,
        follower_key: IdentityKey,
        target_name: &str,
    ) -> CoreResult<Vec<String>> {
        self.ensure_identity_exists(follower_key)?;
        let target_key = self.resolve_target(target_name)?;

        if !self.follows.remove_follow(follower_key, target_key)? {
            return Err(CoreError::Validation("not following".to_string()));
        }
        info!("event=graph_unfollow module=graph status=ok changed=true");
        Ok(self.follows.list_following_names(follower_key)?)
    }

    fn resolve_target(&self, target_name: &str) -> CoreResult<IdentityKey> {
        if target_name.trim().is_empty() {
            return Err(CoreError::Validation(
                "target display name is required".to_string(),
            ));
        }
        self.resolver
            .resolve(target_name)?
            .ok_or_else(|| CoreError::NotFound(format!("identity `{}`", target_name.trim())))
    }

    fn ensure_identity_exists(&self, key: IdentityKey) -> CoreResult<()> {
        if self.resolver.display_name(key)?.is_none() {
            return Err(CoreError::NotFound(format!("identity {key}")));
        }
        Ok(())
    }
}
