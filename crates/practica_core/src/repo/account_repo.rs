//! Authentication directory contract and SQLite implementation.
//!
//! # Responsibility
//! - Expose the narrow account contract the profile lifecycle depends on.
//! - Keep directory SQL (`accounts`, `account_groups`) behind the trait.
//!
//! # Invariants
//! - Usernames are unique within the directory.
//! - Group membership rows never outlive their account (FK cascade).

use crate::db::{self, DbError};
use crate::model::person::AccountId;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type AccountResult<T> = Result<T, AccountError>;

/// Failure raised by directory operations.
#[derive(Debug)]
pub enum AccountError {
    Db(DbError),
    NotFound(AccountId),
    UsernameTaken(String),
    InvalidData(String),
}

impl Display for AccountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(account_id) => write!(f, "account not found: {account_id}"),
            Self::UsernameTaken(username) => {
                write!(f, "username `{username}` is already taken")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted account data: {message}"),
        }
    }
}

impl Error for AccountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for AccountError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for AccountError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Read model for one directory account. The password is write-only and never
/// leaves the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub account_id: AccountId,
    pub username: String,
    pub email: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    /// Sorted group names.
    pub groups: Vec<String>,
}

/// Input for provisioning a new account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    pub is_staff: bool,
    pub groups: Vec<String>,
}

/// The authentication subsystem as seen by the profile lifecycle.
pub trait AccountDirectory {
    fn create_account(&self, account: &NewAccount) -> AccountResult<AccountId>;
    fn update_account(
        &self,
        account_id: AccountId,
        username: &str,
        email: &str,
    ) -> AccountResult<()>;
    fn delete_account(&self, account_id: AccountId) -> AccountResult<()>;
    /// True for superuser-equivalent accounts, which are exempt from cascade
    /// deletion.
    fn is_privileged(&self, account_id: AccountId) -> AccountResult<bool>;
    fn get_account(&self, account_id: AccountId) -> AccountResult<Option<AccountRecord>>;
}

/// SQLite-backed directory implementation.
pub struct SqliteAccountDirectory<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAccountDirectory<'conn> {
    /// Constructs a directory from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> AccountResult<Self> {
        db::ensure_schema_ready(
            conn,
            &[
                (
                    "accounts",
                    &[
                        "account_id",
                        "username",
                        "email",
                        "password",
                        "is_staff",
                        "is_superuser",
                    ],
                ),
                ("account_groups", &["account_id", "group_name"]),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl AccountDirectory for SqliteAccountDirectory<'_> {
    fn create_account(&self, account: &NewAccount) -> AccountResult<AccountId> {
        let account_id = Uuid::new_v4();

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let inserted = tx.execute(
            "INSERT INTO accounts (
                account_id,
                username,
                email,
                password,
                is_staff,
                is_superuser
            ) VALUES (?1, ?2, ?3, ?4, ?5, 0);",
            params![
                account_id.to_string(),
                account.username.as_str(),
                account.email.as_str(),
                account.password.as_str(),
                account.is_staff,
            ],
        );
        if let Err(err) = inserted {
            if super::is_unique_violation(&err, "accounts.username") {
                return Err(AccountError::UsernameTaken(account.username.clone()));
            }
            return Err(err.into());
        }

        for group in &account.groups {
            tx.execute(
                "INSERT OR IGNORE INTO account_groups (account_id, group_name)
                 VALUES (?1, ?2);",
                params![account_id.to_string(), group.as_str()],
            )?;
        }
        tx.commit()?;

        Ok(account_id)
    }

    fn update_account(
        &self,
        account_id: AccountId,
        username: &str,
        email: &str,
    ) -> AccountResult<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE accounts
                 SET
                    username = ?2,
                    email = ?3,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE account_id = ?1;",
                params![account_id.to_string(), username, email],
            )
            .map_err(|err| {
                if super::is_unique_violation(&err, "accounts.username") {
                    AccountError::UsernameTaken(username.to_string())
                } else {
                    err.into()
                }
            })?;

        if changed == 0 {
            return Err(AccountError::NotFound(account_id));
        }
        Ok(())
    }

    fn delete_account(&self, account_id: AccountId) -> AccountResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM accounts WHERE account_id = ?1;",
            [account_id.to_string()],
        )?;
        if changed == 0 {
            return Err(AccountError::NotFound(account_id));
        }
        Ok(())
    }

    fn is_privileged(&self, account_id: AccountId) -> AccountResult<bool> {
        let flag: Option<i64> = self
            .conn
            .query_row(
                "SELECT is_superuser FROM accounts WHERE account_id = ?1;",
                [account_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        match flag {
            Some(value) => parse_account_flag(value, "accounts.is_superuser"),
            None => Err(AccountError::NotFound(account_id)),
        }
    }

    fn get_account(&self, account_id: AccountId) -> AccountResult<Option<AccountRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT account_id, username, email, is_staff, is_superuser
                 FROM accounts
                 WHERE account_id = ?1;",
                [account_id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((id_text, username, email, staff_raw, superuser_raw)) = row else {
            return Ok(None);
        };

        let account_id = Uuid::parse_str(&id_text).map_err(|_| {
            AccountError::InvalidData(format!("invalid uuid `{id_text}` in accounts.account_id"))
        })?;

        let mut stmt = self.conn.prepare(
            "SELECT group_name
             FROM account_groups
             WHERE account_id = ?1
             ORDER BY group_name ASC;",
        )?;
        let mut rows = stmt.query([account_id.to_string()])?;
        let mut groups = Vec::new();
        while let Some(row) = rows.next()? {
            groups.push(row.get::<_, String>(0)?);
        }

        Ok(Some(AccountRecord {
            account_id,
            username,
            email,
            is_staff: parse_account_flag(staff_raw, "accounts.is_staff")?,
            is_superuser: parse_account_flag(superuser_raw, "accounts.is_superuser")?,
            groups,
        }))
    }
}

/// Marks an account as superuser-equivalent. Exposed for administrative
/// tooling and tests; the profile lifecycle never escalates privileges.
pub fn set_privileged(
    conn: &Connection,
    account_id: AccountId,
    privileged: bool,
) -> AccountResult<()> {
    let changed = conn.execute(
        "UPDATE accounts
         SET is_superuser = ?2, updated_at = (strftime('%s', 'now') * 1000)
         WHERE account_id = ?1;",
        params![account_id.to_string(), privileged],
    )?;
    if changed == 0 {
        return Err(AccountError::NotFound(account_id));
    }
    Ok(())
}

fn parse_account_flag(value: i64, column: &'static str) -> AccountResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(AccountError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}
