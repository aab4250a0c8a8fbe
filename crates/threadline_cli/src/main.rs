//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `threadline_core` linkage and open (or create) a store.
//! - Print a deterministic summary for quick local sanity checks.
//!
//! Usage: `threadline [DB_PATH]`, falling back to `THREADLINE_DB_PATH`.
//! Logging is enabled when `THREADLINE_LOG_DIR` is set.

use log::error;
use std::process::ExitCode;
use threadline_core::db::migrations::current_user_version;
use threadline_core::db::open_db_with_config;
use threadline_core::{
    ArticleFilter, AuthorizationResolver, ContentService, CoreConfig, CoreError, SequenceAllocator,
    SqliteArticleRepository, SqliteIdentityRepository, SqliteSequenceRepository, ARTICLE_COUNTER,
};

const DB_PATH_ENV: &str = "THREADLINE_DB_PATH";

fn main() -> ExitCode {
    println!("threadline_core ping={}", threadline_core::ping());
    println!("threadline_core version={}", threadline_core::core_version());

    if let Err(err) = threadline_core::init_logging_from_env() {
        eprintln!("logging disabled: {err}");
    }

    let Some(db_path) = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(DB_PATH_ENV).ok())
    else {
        return ExitCode::SUCCESS;
    };

    match summarize(&db_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(
                "event=cli_summary module=cli status=error kind={}",
                err.kind().as_str()
            );
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn summarize(db_path: &str) -> Result<(), CoreError> {
    let config = CoreConfig::from_env()?;
    let conn = open_db_with_config(db_path, &config)?;

    let allocator = SequenceAllocator::new(SqliteSequenceRepository::try_new(&conn)?);
    let content = ContentService::new(
        SqliteArticleRepository::try_new(&conn)?,
        AuthorizationResolver::new(SqliteIdentityRepository::try_new(&conn)?),
        config,
    );

    let articles = content.list_articles(&ArticleFilter::All)?;
    let comments: usize = articles.iter().map(|article| article.comments.len()).sum();

    println!("schema_version={}", current_user_version(&conn)?);
    println!("articles={} comments={}", articles.len(), comments);
    println!(
        "article_counter={}",
        allocator.current(ARTICLE_COUNTER)?.unwrap_or(0)
    );
    Ok(())
}
