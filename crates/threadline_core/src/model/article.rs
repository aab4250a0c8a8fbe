//! Article and comment domain model.
//!
//! # Responsibility
//! - Define the two-level content hierarchy (articles owning comments).
//! - Define the lookup and edit-target vocabulary shared by repo and service.
//!
//! # Invariants
//! - `Article::sequence` is globally unique and strictly increasing.
//! - `Comment::sequence` is unique within its owning article only.
//! - Authors are stored as identity keys; display names are resolved on read.

use crate::model::identity::IdentityKey;
use serde::{Deserialize, Serialize};

/// Globally unique article number allocated from the `article` counter.
pub type ArticleSequence = i64;

/// Per-article comment number.
pub type CommentSequence = i64;

/// Sentinel accepted by [`CommentRef::parse`] to request a new comment.
pub const NEW_COMMENT_SENTINEL: &str = "new";

/// Top-level content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    #[serde(rename = "id")]
    pub sequence: ArticleSequence,
    /// Author display name, resolved at read time.
    pub author: String,
    pub author_key: IdentityKey,
    pub text: String,
    pub image: Option<String>,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Ordered by `sequence` ascending.
    pub comments: Vec<Comment>,
    /// Optimistic-concurrency guard; bumped by every edit.
    #[serde(skip)]
    pub revision: i64,
}

impl Article {
    /// Returns the comment with the given within-article sequence.
    pub fn comment(&self, sequence: CommentSequence) -> Option<&Comment> {
        self.comments
            .iter()
            .find(|comment| comment.sequence == sequence)
    }

    /// Next free comment sequence: `max(existing) + 1`, or 1 when empty.
    pub fn next_comment_sequence(&self) -> CommentSequence {
        self.comments
            .iter()
            .map(|comment| comment.sequence)
            .max()
            .unwrap_or(0)
            + 1
    }
}

/// Reply scoped to exactly one article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "id")]
    pub sequence: CommentSequence,
    /// Author display name, resolved at read time.
    pub author: String,
    pub author_key: IdentityKey,
    pub body: String,
    /// Epoch milliseconds.
    pub created_at: i64,
}

/// Input for a new article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArticle {
    pub author_key: IdentityKey,
    pub text: String,
    pub image: Option<String>,
}

/// Which articles a listing returns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ArticleFilter {
    #[default]
    All,
    BySequence(ArticleSequence),
    ByAuthor(String),
}

impl ArticleFilter {
    /// Interprets a single free-form lookup value.
    ///
    /// Integer-parsable input is a sequence lookup; anything else is an
    /// author display-name lookup. A display name made only of digits can
    /// therefore never be looked up through this parser; use
    /// [`ArticleFilter::ByAuthor`] directly for those.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Self::All,
            Some(value) => match value.parse::<ArticleSequence>() {
                Ok(sequence) => Self::BySequence(sequence),
                Err(_) => Self::ByAuthor(value.to_string()),
            },
        }
    }
}

/// Target of an edit below the article text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentRef {
    /// Append a new comment.
    New,
    /// Replace the body of an existing comment.
    Existing(CommentSequence),
}

impl CommentRef {
    /// Parses `"new"` (or the legacy `-1`) and comment sequences.
    ///
    /// Returns `None` for anything else.
    pub fn parse(raw: &str) -> Option<Self> {
        let value = raw.trim();
        if value.eq_ignore_ascii_case(NEW_COMMENT_SENTINEL) {
            return Some(Self::New);
        }
        match value.parse::<CommentSequence>() {
            Ok(-1) => Some(Self::New),
            Ok(sequence) if sequence > 0 => Some(Self::Existing(sequence)),
            _ => None,
        }
    }
}

/// Single-document mutation planned against one article revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleEdit {
    ReplaceText(String),
    AppendComment {
        sequence: CommentSequence,
        author_key: IdentityKey,
        body: String,
    },
    ReplaceComment {
        sequence: CommentSequence,
        body: String,
    },
}
