//! Identity/profile repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist an identity and its profile as one unit.
//! - Provide display-name ↔ key lookups for authorization and presentation.
//!
//! # Invariants
//! - `identities` and `profiles` rows are written in the same transaction.
//! - Lookups are pure reads.

use crate::model::identity::{
    Identity, IdentityKey, ProfileDetail, RegistrationRequest, DEFAULT_AVATAR, DEFAULT_HEADLINE,
};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::schema::{ensure_connection_ready, parse_uuid};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

/// Repository interface for identities and their profiles.
pub trait IdentityRepository {
    /// Inserts identity + profile atomically and returns the stored identity.
    fn create_identity(&self, request: &RegistrationRequest) -> RepoResult<Identity>;
    /// Maps a display name to its identity key.
    fn find_key_by_display_name(&self, display_name: &str) -> RepoResult<Option<IdentityKey>>;
    /// Maps an identity key to its current display name.
    fn find_display_name(&self, key: IdentityKey) -> RepoResult<Option<String>>;
    /// Loads one identity including its following set.
    fn get_identity(&self, key: IdentityKey) -> RepoResult<Option<Identity>>;
    /// Loads the profile owned by `key`.
    fn get_profile(&self, key: IdentityKey) -> RepoResult<Option<ProfileDetail>>;
}

/// SQLite-backed identity repository.
pub struct SqliteIdentityRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteIdentityRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["identities", "profiles", "follows"])?;
        Ok(Self { conn })
    }
}

impl IdentityRepository for SqliteIdentityRepository<'_> {
    fn create_identity(&self, request: &RegistrationRequest) -> RepoResult<Identity> {
        let key = Uuid::new_v4();
        let display_name = request.normalized_display_name();
        let email = request.email.trim();

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if exists(&tx, "SELECT 1 FROM identities WHERE display_name = ?1", display_name)? {
            return Err(RepoError::DuplicateDisplayName(display_name.to_string()));
        }
        if exists(&tx, "SELECT 1 FROM profiles WHERE email = ?1", email)? {
            return Err(RepoError::DuplicateEmail(email.to_string()));
        }

        tx.execute(
            "INSERT INTO identities (identity_key, display_name, credential_hash)
             VALUES (?1, ?2, ?3);",
            params![key.to_string(), display_name, request.credential_hash.as_str()],
        )?;
        tx.execute(
            "INSERT INTO profiles (
                identity_key,
                email,
                phone,
                zipcode,
                date_of_birth,
                headline,
                avatar
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                key.to_string(),
                email,
                request.phone.trim(),
                request.zipcode.trim(),
                request.date_of_birth.trim(),
                DEFAULT_HEADLINE,
                DEFAULT_AVATAR,
            ],
        )?;

        let identity = load_identity(&tx, key)?.ok_or_else(|| {
            RepoError::InvalidData(format!("identity {key} missing after insert"))
        })?;
        tx.commit()?;
        Ok(identity)
    }

    fn find_key_by_display_name(&self, display_name: &str) -> RepoResult<Option<IdentityKey>> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT identity_key FROM identities WHERE display_name = ?1;",
                [display_name],
                |row| row.get(0),
            )
            .optional()?;

        value
            .map(|text| parse_uuid(&text, "identities.identity_key"))
            .transpose()
    }

    fn find_display_name(&self, key: IdentityKey) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT display_name FROM identities WHERE identity_key = ?1;",
                [key.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn get_identity(&self, key: IdentityKey) -> RepoResult<Option<Identity>> {
        load_identity(self.conn, key)
    }

    fn get_profile(&self, key: IdentityKey) -> RepoResult<Option<ProfileDetail>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                identity_key,
                email,
                phone,
                zipcode,
                date_of_birth,
                headline,
                avatar
             FROM profiles
             WHERE identity_key = ?1;",
        )?;
        let mut rows = stmt.query([key.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_profile_row(row)?));
        }
        Ok(None)
    }
}

fn load_identity(conn: &Connection, key: IdentityKey) -> RepoResult<Option<Identity>> {
    let mut stmt = conn.prepare(
        "SELECT
            identity_key,
            display_name,
            credential_hash,
            created_at
         FROM identities
         WHERE identity_key = ?1;",
    )?;
    let mut rows = stmt.query([key.to_string()])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };

    let key_text: String = row.get("identity_key")?;
    let key = parse_uuid(&key_text, "identities.identity_key")?;
    Ok(Some(Identity {
        key,
        display_name: row.get("display_name")?,
        credential_hash: row.get("credential_hash")?,
        created_at: row.get("created_at")?,
        following: load_following_keys(conn, &key_text)?,
    }))
}

fn load_following_keys(conn: &Connection, follower_key: &str) -> RepoResult<Vec<IdentityKey>> {
    let mut stmt = conn.prepare(
        "SELECT followee_key
         FROM follows
         WHERE follower_key = ?1
         ORDER BY followee_key ASC;",
    )?;
    let mut rows = stmt.query([follower_key])?;
    let mut keys = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        keys.push(parse_uuid(&value, "follows.followee_key")?);
    }
    Ok(keys)
}

fn parse_profile_row(row: &Row<'_>) -> RepoResult<ProfileDetail> {
    let key_text: String = row.get("identity_key")?;
    Ok(ProfileDetail {
        identity_key: parse_uuid(&key_text, "profiles.identity_key")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        zipcode: row.get("zipcode")?,
        date_of_birth: row.get("date_of_birth")?,
        headline: row.get("headline")?,
        avatar: row.get("avatar")?,
    })
}

fn exists(conn: &Connection, sql: &str, value: &str) -> RepoResult<bool> {
    let found = conn
        .query_row(sql, [value], |_| Ok(()))
        .optional()?
        .is_some();
    Ok(found)
}
