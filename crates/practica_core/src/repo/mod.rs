//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes enforce model `validate()` before SQL mutations.
//! - Repository APIs return semantic errors (`NotFound`, `LoginTaken`) in
//!   addition to DB transport errors.

use crate::db::DbError;
use crate::model::photo::PhotoAttachment;
use crate::model::ValidationError;
use rusqlite::Row;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use uuid::Uuid;

pub mod account_repo;
pub mod content_repo;
pub mod person_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    NotFound { entity: &'static str, id: Uuid },
    /// Another profile already uses this login name.
    LoginTaken(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::LoginTaken(login) => write!(f, "login `{login}` is already taken"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// True when `err` is a UNIQUE constraint failure on the given column, e.g.
/// `people.login`.
pub(crate) fn is_unique_violation(err: &rusqlite::Error, constraint: &str) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, Some(message)) => {
            failure.code == rusqlite::ErrorCode::ConstraintViolation
                && message.contains(constraint)
        }
        _ => false,
    }
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn parse_flag(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}

/// Reads the shared `photo_*` column block present on every photo-bearing
/// table.
pub(crate) fn parse_photo_columns(row: &Row<'_>) -> Result<PhotoAttachment, rusqlite::Error> {
    Ok(PhotoAttachment {
        source_path: row
            .get::<_, Option<String>>("photo_path")?
            .map(PathBuf::from),
        alt: row.get("photo_alt")?,
        width: row.get("photo_width")?,
        height: row.get("photo_height")?,
        payload: row.get("photo_payload")?,
        ext: row.get("photo_ext")?,
    })
}

pub(crate) fn photo_path_param(photo: &PhotoAttachment) -> Option<String> {
    photo
        .source_path
        .as_ref()
        .map(|path| path.to_string_lossy().into_owned())
}
