//! Article/comment repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist articles with their allocated sequence in one transaction.
//! - Apply one planned edit per article revision as a single atomic unit.
//! - Keep SQL details and ordering behavior inside repository boundary.
//!
//! # Invariants
//! - An article row never exists without its allocated sequence.
//! - Every edit bumps `revision` guarded by the revision it was planned on.
//! - `(article_seq, comment_seq)` is unique; a losing concurrent append
//!   surfaces as `RepoError::WriteConflict`, never as a duplicate.
//! - Listing order is `seq ASC`; comments are ordered by `comment_seq ASC`.

use crate::model::article::{
    Article, ArticleEdit, ArticleFilter, ArticleSequence, Comment, NewArticle,
};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::schema::{ensure_connection_ready, parse_uuid};
use crate::repo::sequence_repo::increment_and_fetch;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

const ARTICLE_SELECT_SQL: &str = "SELECT
    a.seq AS seq,
    a.author_key AS author_key,
    i.display_name AS author,
    a.text AS text,
    a.image AS image,
    a.created_at AS created_at,
    a.revision AS revision
FROM articles a
INNER JOIN identities i ON i.identity_key = a.author_key";

/// Repository interface for the article/comment hierarchy.
pub trait ArticleRepository {
    /// Allocates the next value of `counter` and inserts the article with it.
    fn create_article(&self, article: &NewArticle, counter: &str) -> RepoResult<Article>;
    /// Loads one article with its comments.
    fn get_article(&self, sequence: ArticleSequence) -> RepoResult<Option<Article>>;
    /// Lists articles matching `filter`.
    fn list_articles(&self, filter: &ArticleFilter) -> RepoResult<Vec<Article>>;
    /// Runs one read-plan-write cycle on an article.
    ///
    /// `plan` sees the current article and decides the edit; its error aborts
    /// the cycle without writing. Returns `Ok(None)` when the article does
    /// not exist.
    fn edit_article<F, E>(&self, sequence: ArticleSequence, plan: F) -> Result<Option<Article>, E>
    where
        F: FnOnce(&Article) -> Result<ArticleEdit, E>,
        E: From<RepoError>;
}

/// SQLite-backed article repository.
pub struct SqliteArticleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteArticleRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &["identities", "articles", "comments", "sequence_counters"],
        )?;
        Ok(Self { conn })
    }
}

impl ArticleRepository for SqliteArticleRepository<'_> {
    fn create_article(&self, article: &NewArticle, counter: &str) -> RepoResult<Article> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let sequence = increment_and_fetch(&tx, counter)?;
        tx.execute(
            "INSERT INTO articles (seq, author_key, text, image, revision)
             VALUES (?1, ?2, ?3, ?4, 0);",
            params![
                sequence,
                article.author_key.to_string(),
                article.text.as_str(),
                article.image.as_deref(),
            ],
        )?;

        let created = load_article(&tx, sequence)?.ok_or_else(|| {
            RepoError::InvalidData(format!("article {sequence} missing after insert"))
        })?;
        tx.commit()?;
        Ok(created)
    }

    fn get_article(&self, sequence: ArticleSequence) -> RepoResult<Option<Article>> {
        load_article(self.conn, sequence)
    }

    fn list_articles(&self, filter: &ArticleFilter) -> RepoResult<Vec<Article>> {
        let mut sql = format!("{ARTICLE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        match filter {
            ArticleFilter::All => {}
            ArticleFilter::BySequence(sequence) => {
                sql.push_str(" AND a.seq = ?");
                bind_values.push(Value::Integer(*sequence));
            }
            ArticleFilter::ByAuthor(display_name) => {
                sql.push_str(" AND i.display_name = ?");
                bind_values.push(Value::Text(display_name.clone()));
            }
        }
        sql.push_str(" ORDER BY a.seq ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut articles = Vec::new();
        while let Some(row) = rows.next()? {
            let mut article = parse_article_row(row)?;
            article.comments = load_comments(self.conn, article.sequence)?;
            articles.push(article);
        }

        Ok(articles)
    }

    fn edit_article<F, E>(&self, sequence: ArticleSequence, plan: F) -> Result<Option<Article>, E>
    where
        F: FnOnce(&Article) -> Result<ArticleEdit, E>,
        E: From<RepoError>,
    {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(|err| classify_write_error(sequence, err.into()))?;
        let Some(current) = load_article(&tx, sequence)? else {
            return Ok(None);
        };

        let edit = plan(&current)?;
        apply_edit(&tx, &current, &edit).map_err(|err| classify_write_error(sequence, err))?;

        let updated = load_article(&tx, sequence)?.ok_or_else(|| {
            RepoError::InvalidData(format!("article {sequence} missing after edit"))
        })?;
        tx.commit()
            .map_err(|err| classify_write_error(sequence, err.into()))?;
        Ok(Some(updated))
    }
}

fn apply_edit(conn: &Connection, current: &Article, edit: &ArticleEdit) -> RepoResult<()> {
    let bumped = conn.execute(
        "UPDATE articles
         SET revision = revision + 1
         WHERE seq = ?1
           AND revision = ?2;",
        params![current.sequence, current.revision],
    )?;
    if bumped == 0 {
        return Err(RepoError::WriteConflict(current.sequence));
    }

    match edit {
        ArticleEdit::ReplaceText(text) => {
            conn.execute(
                "UPDATE articles SET text = ?2 WHERE seq = ?1;",
                params![current.sequence, text.as_str()],
            )?;
        }
        ArticleEdit::AppendComment {
            sequence,
            author_key,
            body,
        } => {
            conn.execute(
                "INSERT INTO comments (article_seq, comment_seq, author_key, body)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    current.sequence,
                    sequence,
                    author_key.to_string(),
                    body.as_str()
                ],
            )?;
        }
        ArticleEdit::ReplaceComment { sequence, body } => {
            let changed = conn.execute(
                "UPDATE comments
                 SET body = ?3
                 WHERE article_seq = ?1
                   AND comment_seq = ?2;",
                params![current.sequence, sequence, body.as_str()],
            )?;
            if changed == 0 {
                return Err(RepoError::WriteConflict(current.sequence));
            }
        }
    }

    Ok(())
}

/// Maps lock contention and uniqueness races to a retryable conflict.
fn classify_write_error(sequence: ArticleSequence, err: RepoError) -> RepoError {
    match err {
        RepoError::Db(db) if db.is_busy() || db.is_unique_violation() => {
            RepoError::WriteConflict(sequence)
        }
        other => other,
    }
}

fn load_article(conn: &Connection, sequence: ArticleSequence) -> RepoResult<Option<Article>> {
    let mut stmt = conn.prepare(&format!("{ARTICLE_SELECT_SQL} WHERE a.seq = ?1;"))?;
    let mut rows = stmt.query([sequence])?;
    if let Some(row) = rows.next()? {
        let mut article = parse_article_row(row)?;
        article.comments = load_comments(conn, sequence)?;
        return Ok(Some(article));
    }
    Ok(None)
}

fn load_comments(conn: &Connection, sequence: ArticleSequence) -> RepoResult<Vec<Comment>> {
    let mut stmt = conn.prepare(
        "SELECT
            c.comment_seq AS comment_seq,
            c.author_key AS author_key,
            i.display_name AS author,
            c.body AS body,
            c.created_at AS created_at
         FROM comments c
         INNER JOIN identities i ON i.identity_key = c.author_key
         WHERE c.article_seq = ?1
         ORDER BY c.comment_seq ASC;",
    )?;
    let mut rows = stmt.query([sequence])?;
    let mut comments = Vec::new();
    while let Some(row) = rows.next()? {
        let author_key: String = row.get("author_key")?;
        comments.push(Comment {
            sequence: row.get("comment_seq")?,
            author: row.get("author")?,
            author_key: parse_uuid(&author_key, "comments.author_key")?,
            body: row.get("body")?,
            created_at: row.get("created_at")?,
        });
    }
    Ok(comments)
}

fn parse_article_row(row: &Row<'_>) -> RepoResult<Article> {
    let author_key: String = row.get("author_key")?;
    Ok(Article {
        sequence: row.get("seq")?,
        author: row.get("author")?,
        author_key: parse_uuid(&author_key, "articles.author_key")?,
        text: row.get("text")?,
        image: row.get("image")?,
        created_at: row.get("created_at")?,
        comments: Vec::new(),
        revision: row.get("revision")?,
    })
}
