//! Specialist profile model.
//!
//! # Responsibility
//! - Define the `Person` record and its field-level validation rules.
//!
//! # Invariants
//! - `person_id` is stable and never reused.
//! - A persisted, non-deleted `Person` references exactly one account; the
//!   account's username/email mirror `login`/`email` after every save.

use crate::model::photo::PhotoAttachment;
use crate::model::{require_max_chars, require_non_empty, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a specialist profile.
pub type PersonId = Uuid;

/// Non-owning reference into the authentication directory.
pub type AccountId = Uuid;

pub const FULL_NAME_MAX_CHARS: usize = 50;
pub const LOGIN_MAX_CHARS: usize = 20;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));
static BIRTH_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid birth date regex"));

/// Everything the site knows about one psychologist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub person_id: PersonId,
    pub full_name: String,
    /// Unique login name; mirrored into the linked account's username.
    pub login: String,
    /// ISO `YYYY-MM-DD`.
    pub birth_date: String,
    /// Mirrored into the linked account's email.
    pub email: String,
    pub info: String,
    pub bio: String,
    pub photo: PhotoAttachment,
    /// Set by the save lifecycle; `None` only before the first save.
    pub account_id: Option<AccountId>,
}

impl Person {
    /// Creates a new profile with a generated stable ID and no account yet.
    pub fn new(
        full_name: impl Into<String>,
        login: impl Into<String>,
        birth_date: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self::with_id(Uuid::new_v4(), full_name, login, birth_date, email)
    }

    /// Creates a profile with a caller-provided stable ID.
    pub fn with_id(
        person_id: PersonId,
        full_name: impl Into<String>,
        login: impl Into<String>,
        birth_date: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            person_id,
            full_name: full_name.into(),
            login: login.into(),
            birth_date: birth_date.into(),
            email: email.into(),
            info: String::new(),
            bio: String::new(),
            photo: PhotoAttachment::none(),
            account_id: None,
        }
    }

    /// Checks field-level rules. Called on every repository write path.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty(&self.full_name, "person", "full_name")?;
        require_max_chars(&self.full_name, "person", "full_name", FULL_NAME_MAX_CHARS)?;
        require_non_empty(&self.login, "person", "login")?;
        require_max_chars(&self.login, "person", "login", LOGIN_MAX_CHARS)?;
        if self.login.chars().any(char::is_whitespace) {
            return Err(ValidationError::InvalidLogin(self.login.clone()));
        }
        if !EMAIL_RE.is_match(&self.email) {
            return Err(ValidationError::InvalidEmail(self.email.clone()));
        }
        if !BIRTH_DATE_RE.is_match(&self.birth_date) {
            return Err(ValidationError::InvalidBirthDate(self.birth_date.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Person;
    use crate::model::ValidationError;

    fn valid_person() -> Person {
        Person::new("Jane Doe", "jdoe", "1985-04-12", "jdoe@example.com")
    }

    #[test]
    fn valid_person_passes_validation() {
        valid_person().validate().unwrap();
    }

    #[test]
    fn login_with_whitespace_is_rejected() {
        let mut person = valid_person();
        person.login = "j doe".to_string();
        assert!(matches!(
            person.validate().unwrap_err(),
            ValidationError::InvalidLogin(_)
        ));
    }

    #[test]
    fn overlong_login_is_rejected() {
        let mut person = valid_person();
        person.login = "x".repeat(21);
        assert!(matches!(
            person.validate().unwrap_err(),
            ValidationError::TooLong { field: "login", .. }
        ));
    }

    #[test]
    fn malformed_email_is_rejected() {
        let mut person = valid_person();
        person.email = "not-an-email".to_string();
        assert!(matches!(
            person.validate().unwrap_err(),
            ValidationError::InvalidEmail(_)
        ));
    }

    #[test]
    fn malformed_birth_date_is_rejected() {
        let mut person = valid_person();
        person.birth_date = "12.04.1985".to_string();
        assert!(matches!(
            person.validate().unwrap_err(),
            ValidationError::InvalidBirthDate(_)
        ));
    }
}
