//! Core domain logic for Threadline.
//! This crate is the single source of truth for content numbering,
//! authorship checks, and the follow graph.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::CoreConfig;
pub use error::{CoreError, CoreResult, ErrorKind};
pub use logging::{default_log_level, init_logging, init_logging_from_env, logging_status};
pub use model::article::{
    Article, ArticleFilter, ArticleSequence, Comment, CommentRef, CommentSequence,
};
pub use model::identity::{
    Identity, IdentityKey, ProfileDetail, RegistrationRequest, VerifiedIdentity,
};
pub use repo::article_repo::{ArticleRepository, SqliteArticleRepository};
pub use repo::error::{RepoError, RepoResult};
pub use repo::follow_repo::{FollowRepository, SqliteFollowRepository};
pub use repo::identity_repo::{IdentityRepository, SqliteIdentityRepository};
pub use repo::sequence_repo::{SequenceRepository, SqliteSequenceRepository};
pub use service::authorization::{require_identity, AuthorizationResolver};
pub use service::content_service::ContentService;
pub use service::graph_service::GraphService;
pub use service::identity_service::IdentityService;
pub use service::sequence_allocator::{SequenceAllocator, ARTICLE_COUNTER};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
