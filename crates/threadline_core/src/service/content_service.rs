//! Article and comment use-case service.
//!
//! # Responsibility
//! - Create articles numbered by the `article` counter.
//! - List articles by sequence, author, or all.
//! - Apply owner-checked edits to article text and comments.
//!
//! # Invariants
//! - Only the article's author may edit it or its comments.
//! - A comment body may only be replaced by the comment's author.
//! - New comment sequence = max(existing) + 1, decided inside the same
//!   transaction that writes it.
//! - Edits retry on write conflict at most `CoreConfig::edit_attempts()` times.

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult, ErrorKind};
use crate::model::article::{
    Article, ArticleEdit, ArticleFilter, ArticleSequence, CommentRef, NewArticle,
};
use crate::model::identity::{IdentityKey, VerifiedIdentity};
use crate::repo::article_repo::ArticleRepository;
use crate::repo::identity_repo::IdentityRepository;
use crate::service::authorization::AuthorizationResolver;
use crate::service::sequence_allocator::{
    record_allocation, validate_counter_name, ARTICLE_COUNTER,
};
use log::{error, info, warn};
use std::thread;
use std::time::{Duration, Instant};

const EDIT_RETRY_BASE_DELAY: Duration = Duration::from_millis(10);

/// Content service facade over article storage.
///
/// Article numbers come from the `article` counter of the sequence
/// allocator. The increment runs inside the article insert transaction, so
/// the counter name is checked and the allocation logged here rather than
/// through [`SequenceAllocator`](crate::service::sequence_allocator::SequenceAllocator).
pub struct ContentService<A: ArticleRepository, I: IdentityRepository> {
    articles: A,
    resolver: AuthorizationResolver<I>,
    config: CoreConfig,
}

impl<A: ArticleRepository, I: IdentityRepository> ContentService<A, I> {
    pub fn new(articles: A, resolver: AuthorizationResolver<I>, config: CoreConfig) -> Self {
        Self {
            articles,
            resolver,
            config,
        }
    }

    /// Creates an article authored by `author` with an empty comment list.
    pub fn create_article(
        &self,
        author: &VerifiedIdentity,
        text: &str,
        image: Option<&str>,
    ) -> CoreResult<Article> {
        if text.is_empty() {
            return Err(CoreError::Validation(
                "text content is required for the article".to_string(),
            ));
        }
        if self.resolver.display_name(author.key)?.is_none() {
            return Err(CoreError::Forbidden(format!(
                "identity {} is not registered",
                author.key
            )));
        }

        let draft = NewArticle {
            author_key: author.key,
            text: text.to_string(),
            image: image
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
        };

        let counter = validate_counter_name(ARTICLE_COUNTER)?;
        let started_at = Instant::now();
        match self.articles.create_article(&draft, counter) {
            Ok(article) => {
                record_allocation(counter, article.sequence);
                info!(
                    "event=article_create module=content status=ok seq={} duration_ms={}",
                    article.sequence,
                    started_at.elapsed().as_millis()
                );
                Ok(article)
            }
            Err(err) => {
                error!(
                    "event=article_create module=content status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err.into())
            }
        }
    }

    /// Lists articles matching `filter`, ordered by sequence.
    pub fn list_articles(&self, filter: &ArticleFilter) -> CoreResult<Vec<Article>> {
        Ok(self.articles.list_articles(filter)?)
    }

    /// Gets one article by sequence.
    pub fn get_article(&self, sequence: ArticleSequence) -> CoreResult<Option<Article>> {
        Ok(self.articles.get_article(sequence)?)
    }

    /// Edits article text, appends a comment, or replaces a comment body.
    ///
    /// - `comment_ref = None`: replace the article text.
    /// - `Some(CommentRef::New)`: append a comment authored by `editor_key`.
    /// - `Some(CommentRef::Existing(n))`: replace comment `n`'s body.
    ///
    /// # Errors
    /// - `Validation` when `new_text` is empty.
    /// - `NotFound` when the article or referenced comment is absent.
    /// - `Forbidden` when `editor_key` does not own the article or comment.
    /// - `Conflict` when every attempt lost a concurrent write race.
    pub fn edit_article_or_comment(
        &self,
        article_sequence: ArticleSequence,
        editor_key: IdentityKey,
        comment_ref: Option<CommentRef>,
        new_text: &str,
    ) -> CoreResult<Article> {
        if new_text.is_empty() {
            return Err(CoreError::Validation("text content is required".to_string()));
        }

        let attempts = self.config.edit_attempts();
        for attempt in 1..=attempts {
            let outcome = self.articles.edit_article(
                article_sequence,
                |article| -> CoreResult<ArticleEdit> {
                    self.ensure_article_owner(article, editor_key)?;
                    plan_edit(article, editor_key, comment_ref, new_text)
                },
            );

            match outcome {
                Ok(Some(article)) => {
                    info!(
                        "event=article_edit module=content status=ok seq={} target={} attempt={}",
                        article_sequence,
                        edit_target_label(comment_ref),
                        attempt
                    );
                    return Ok(article);
                }
                Ok(None) => {
                    return Err(CoreError::NotFound(format!(
                        "article {article_sequence}"
                    )));
                }
                Err(err) if err.kind() == ErrorKind::Conflict => {
                    warn!(
                        "event=article_edit module=content status=retry seq={} attempt={} max_attempts={}",
                        article_sequence, attempt, attempts
                    );
                    if attempt < attempts {
                        thread::sleep(retry_delay(attempt));
                    }
                }
                Err(err) => return Err(err),
            }
        }

        error!(
            "event=article_edit module=content status=error seq={} error_code=retries_exhausted attempts={}",
            article_sequence, attempts
        );
        Err(CoreError::Conflict(format!(
            "article {article_sequence} edit still conflicting after {attempts} attempts"
        )))
    }

    fn ensure_article_owner(&self, article: &Article, editor_key: IdentityKey) -> CoreResult<()> {
        let author_registered = self.resolver.display_name(article.author_key)?.is_some();
        if !author_registered || article.author_key != editor_key {
            return Err(CoreError::Forbidden(format!(
                "article {} belongs to another identity",
                article.sequence
            )));
        }
        Ok(())
    }
}

/// Decides the single-document mutation for one edit request.
///
/// Ownership of the article itself is checked by the caller.
fn plan_edit(
    article: &Article,
    editor_key: IdentityKey,
    comment_ref: Option<CommentRef>,
    new_text: &str,
) -> CoreResult<ArticleEdit> {
    match comment_ref {
        None => Ok(ArticleEdit::ReplaceText(new_text.to_string())),
        Some(CommentRef::New) => Ok(ArticleEdit::AppendComment {
            sequence: article.next_comment_sequence(),
            author_key: editor_key,
            body: new_text.to_string(),
        }),
        Some(CommentRef::Existing(sequence)) => {
            let comment = article.comment(sequence).ok_or_else(|| {
                CoreError::NotFound(format!(
                    "comment {sequence} on article {}",
                    article.sequence
                ))
            })?;
            if comment.author_key != editor_key {
                return Err(CoreError::Forbidden(format!(
                    "comment {sequence} belongs to another identity"
                )));
            }
            Ok(ArticleEdit::ReplaceComment {
                sequence,
                body: new_text.to_string(),
            })
        }
    }
}

/// Pause before the next edit attempt; grows linearly with `attempt`.
fn retry_delay(attempt: u32) -> Duration {
    EDIT_RETRY_BASE_DELAY * attempt
}

fn edit_target_label(comment_ref: Option<CommentRef>) -> &'static str {
    match comment_ref {
        None => "text",
        Some(CommentRef::New) => "comment_append",
        Some(CommentRef::Existing(_)) => "comment_replace",
    }
}
