use std::collections::BTreeSet;
use rusqlite::Connection;
use std::path::Path;
use std::thread;
use std::time::Duration;
use threadline_core::db::{open_db, open_db_with_config};
use threadline_core::{
    AuthorizationResolver, CommentRef, ContentService, CoreConfig, ErrorKind, IdentityService,
    RegistrationRequest, SqliteArticleRepository, SqliteIdentityRepository, VerifiedIdentity,
};

const THREADS: usize = 6;
const PER_THREAD: usize = 10;

fn with_content_service<T>(
    path: &Path,
    f: impl FnOnce(&ContentService<SqliteArticleRepository<'_>, SqliteIdentityRepository<'_>>) -> T,
) -> T {
    let conn = open_db(path).unwrap();
    let service = ContentService::new(
        SqliteArticleRepository::try_new(&conn).unwrap(),
        AuthorizationResolver::new(SqliteIdentityRepository::try_new(&conn).unwrap()),
        CoreConfig::default().with_max_edit_attempts(20),
    );
    f(&service)
}

fn register_bob(path: &Path) -> VerifiedIdentity {
    let conn = open_db(path).unwrap();
    let identity = IdentityService::new(SqliteIdentityRepository::try_new(&conn).unwrap())
        .register(&RegistrationRequest {
            display_name: "bob".to_string(),
            credential_hash: "hash".to_string(),
            email: "bob@example.com".to_string(),
            phone: "1234567890".to_string(),
            zipcode: "77005".to_string(),
            date_of_birth: "2000-01-01".to_string(),
        })
        .unwrap();
    VerifiedIdentity {
        key: identity.key,
        display_name: identity.display_name,
    }
}

#[test]
fn concurrent_comment_appends_get_distinct_sequences() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("comments.db");
    let bob = register_bob(&path);
    let article = with_content_service(&path, |service| {
        service.create_article(&bob, "busy thread", None).unwrap()
    });

    let handles: Vec<_> = (0..THREADS)
        .map(|worker| {
            let path = path.clone();
            let key = bob.key;
            let sequence = article.sequence;
            thread::spawn(move || {
                with_content_service(&path, |service| {
                    for round in 0..PER_THREAD {
                        service
                            .edit_article_or_comment(
                                sequence,
                                key,
                                Some(CommentRef::New),
                                &format!("worker {worker} round {round}"),
                            )
                            .unwrap();
                    }
                })
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stored = with_content_service(&path, |service| {
        service.get_article(article.sequence).unwrap().unwrap()
    });
    let sequences: BTreeSet<_> = stored.comments.iter().map(|c| c.sequence).collect();
    let expected: BTreeSet<_> = (1..=(THREADS * PER_THREAD) as i64).collect();

    assert_eq!(stored.comments.len(), THREADS * PER_THREAD);
    assert_eq!(sequences, expected);
    assert_eq!(stored.text, "busy thread");
}

#[test]
fn concurrent_article_creation_gets_distinct_sequences() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("articles.db");
    let bob = register_bob(&path);

    let handles: Vec<_> = (0..THREADS)
        .map(|worker| {
            let path = path.clone();
            let bob = bob.clone();
            thread::spawn(move || {
                with_content_service(&path, |service| {
                    (0..PER_THREAD)
                        .map(|round| {
                            service
                                .create_article(&bob, &format!("{worker}-{round}"), None)
                                .unwrap()
                                .sequence
                        })
                        .collect::<Vec<_>>()
                })
            })
        })
        .collect();

    let mut all = BTreeSet::new();
    for handle in handles {
        for sequence in handle.join().unwrap() {
            assert!(all.insert(sequence), "sequence {sequence} issued twice");
        }
    }
    let expected: BTreeSet<_> = (1..=(THREADS * PER_THREAD) as i64).collect();
    assert_eq!(all, expected);
}

#[test]
fn edit_reports_conflict_when_write_lock_is_never_released() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("locked.db");
    let bob = register_bob(&path);
    let article = with_content_service(&path, |service| {
        service.create_article(&bob, "stable", None).unwrap()
    });

    let config = CoreConfig::default()
        .with_busy_timeout(Duration::ZERO)
        .with_max_edit_attempts(2);
    let conn = open_db_with_config(&path, &config).unwrap();
    let service = ContentService::new(
        SqliteArticleRepository::try_new(&conn).unwrap(),
        AuthorizationResolver::new(SqliteIdentityRepository::try_new(&conn).unwrap()),
        config,
    );

    let writer = Connection::open(&path).unwrap();
    writer.execute_batch("BEGIN IMMEDIATE;").unwrap();

    let err = service
        .edit_article_or_comment(article.sequence, bob.key, None, "changed")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.http_status(), 500);
    assert!(err.to_string().contains("after 2 attempts"));

    let err = service
        .edit_article_or_comment(article.sequence, bob.key, Some(CommentRef::New), "hi")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    writer.execute_batch("ROLLBACK;").unwrap();

    let stored = service.get_article(article.sequence).unwrap().unwrap();
    assert_eq!(stored.text, "stable");
    assert!(stored.comments.is_empty());
    assert_eq!(stored.revision, article.revision);
}
