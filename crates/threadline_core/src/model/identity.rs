//! Identity and profile domain model.
//!
//! # Responsibility
//! - Define registered participants and their one-to-one profile detail.
//! - Validate registration input before anything reaches storage.
//!
//! # Invariants
//! - `key` is stable and never reused for another identity.
//! - `display_name` is unique across all identities.
//! - Exactly one `ProfileDetail` exists per `Identity`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identity key used for ownership and graph edges.
pub type IdentityKey = Uuid;

/// Headline assigned to every new profile.
pub const DEFAULT_HEADLINE: &str = "This is the default headline.";
/// Avatar assigned to every new profile.
pub const DEFAULT_AVATAR: &str =
    "https://upload.wikimedia.org/wikipedia/en/thumb/4/4e/DWLeebron.jpg/220px-DWLeebron.jpg";

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$").expect("valid email regex")
});
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{10,15}$").expect("valid phone regex"));
static ZIPCODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{5}(-\d{4})?$").expect("valid zipcode regex"));
static DOB_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));

/// A registered participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub key: IdentityKey,
    pub display_name: String,
    /// Opaque hash produced by the authentication service.
    #[serde(skip_serializing)]
    pub credential_hash: String,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Keys this identity follows, sorted ascending.
    pub following: Vec<IdentityKey>,
}

/// Profile fields owned one-to-one by an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDetail {
    pub identity_key: IdentityKey,
    pub email: String,
    pub phone: String,
    pub zipcode: String,
    /// `YYYY-MM-DD`.
    pub date_of_birth: String,
    pub headline: String,
    pub avatar: String,
}

/// Identity attached to a request by the authentication service.
///
/// Core operations never look this up themselves; absence of a value means
/// the caller is unauthenticated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    pub key: IdentityKey,
    pub display_name: String,
}

/// Input for creating an identity together with its profile.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegistrationRequest {
    pub display_name: String,
    pub credential_hash: String,
    pub email: String,
    pub phone: String,
    pub zipcode: String,
    pub date_of_birth: String,
}

/// Registration input rejected before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationValidationError {
    MissingField(&'static str),
    InvalidEmail(String),
    InvalidPhone,
    InvalidZipcode(String),
    InvalidDateOfBirth(String),
}

impl Display for RegistrationValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing required field `{field}`"),
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
            Self::InvalidPhone => write!(f, "phone number must have 10-15 digits"),
            Self::InvalidZipcode(value) => write!(f, "invalid zipcode `{value}`"),
            Self::InvalidDateOfBirth(value) => {
                write!(f, "date of birth must be YYYY-MM-DD, got `{value}`")
            }
        }
    }
}

impl Error for RegistrationValidationError {}

impl RegistrationRequest {
    /// Checks required fields and profile formats.
    ///
    /// Display name surrounding whitespace is not significant; callers should
    /// persist [`RegistrationRequest::normalized_display_name`].
    pub fn validate(&self) -> Result<(), RegistrationValidationError> {
        let required = [
            ("display_name", self.display_name.as_str()),
            ("credential_hash", self.credential_hash.as_str()),
            ("email", self.email.as_str()),
            ("phone", self.phone.as_str()),
            ("zipcode", self.zipcode.as_str()),
            ("date_of_birth", self.date_of_birth.as_str()),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(RegistrationValidationError::MissingField(field));
            }
        }

        if !EMAIL_RE.is_match(self.email.trim()) {
            return Err(RegistrationValidationError::InvalidEmail(
                self.email.trim().to_string(),
            ));
        }
        if !PHONE_RE.is_match(self.phone.trim()) {
            return Err(RegistrationValidationError::InvalidPhone);
        }
        if !ZIPCODE_RE.is_match(self.zipcode.trim()) {
            return Err(RegistrationValidationError::InvalidZipcode(
                self.zipcode.trim().to_string(),
            ));
        }
        if !DOB_RE.is_match(self.date_of_birth.trim()) {
            return Err(RegistrationValidationError::InvalidDateOfBirth(
                self.date_of_birth.trim().to_string(),
            ));
        }

        Ok(())
    }

    pub fn normalized_display_name(&self) -> &str {
        self.display_name.trim()
    }
}
