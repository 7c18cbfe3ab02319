//! Specialist profile repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `people` table.
//! - Surface login uniqueness violations as semantic errors.
//!
//! # Invariants
//! - Write paths call `Person::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::model::person::{AccountId, Person, PersonId};
use crate::repo::{
    is_unique_violation, parse_photo_columns, parse_uuid, photo_path_param, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};

const PERSON_SELECT_SQL: &str = "SELECT
    person_id,
    full_name,
    login,
    birth_date,
    email,
    info,
    bio,
    photo_path,
    photo_alt,
    photo_width,
    photo_height,
    photo_payload,
    photo_ext,
    account_id
FROM people";

/// List read model: one row per specialist with dependent-record counts, the
/// way the admin overview presents them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonSummary {
    pub person_id: PersonId,
    pub full_name: String,
    pub login: String,
    pub email: String,
    pub achievement_count: i64,
    pub help_item_count: i64,
}

/// Repository interface for specialist profiles.
pub trait PersonRepository {
    fn create_person(&self, person: &Person) -> RepoResult<PersonId>;
    fn update_person(&self, person: &Person) -> RepoResult<()>;
    fn get_person(&self, person_id: PersonId) -> RepoResult<Option<Person>>;
    fn get_person_by_login(&self, login: &str) -> RepoResult<Option<Person>>;
    /// Summaries ordered by full name, with achievement/help counts.
    fn list_people(&self) -> RepoResult<Vec<PersonSummary>>;
    /// Hard delete; dependent content rows go with the profile (FK cascade).
    fn delete_person(&self, person_id: PersonId) -> RepoResult<()>;
}

/// SQLite-backed profile repository.
pub struct SqlitePersonRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePersonRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        crate::db::ensure_schema_ready(
            conn,
            &[(
                "people",
                &[
                    "person_id",
                    "full_name",
                    "login",
                    "birth_date",
                    "email",
                    "info",
                    "bio",
                    "photo_path",
                    "photo_alt",
                    "photo_width",
                    "photo_height",
                    "photo_payload",
                    "photo_ext",
                    "account_id",
                ],
            )],
        )?;
        Ok(Self { conn })
    }
}

impl PersonRepository for SqlitePersonRepository<'_> {
    fn create_person(&self, person: &Person) -> RepoResult<PersonId> {
        person.validate()?;

        let result = self.conn.execute(
            "INSERT INTO people (
                person_id,
                full_name,
                login,
                birth_date,
                email,
                info,
                bio,
                photo_path,
                photo_alt,
                photo_width,
                photo_height,
                photo_payload,
                photo_ext,
                account_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14);",
            params![
                person.person_id.to_string(),
                person.full_name.as_str(),
                person.login.as_str(),
                person.birth_date.as_str(),
                person.email.as_str(),
                person.info.as_str(),
                person.bio.as_str(),
                photo_path_param(&person.photo),
                person.photo.alt.as_str(),
                person.photo.width,
                person.photo.height,
                person.photo.payload.as_slice(),
                person.photo.ext.as_deref(),
                person.account_id.map(|id| id.to_string()),
            ],
        );

        match result {
            Ok(_) => Ok(person.person_id),
            Err(err) if is_unique_violation(&err, "people.login") => {
                Err(RepoError::LoginTaken(person.login.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn update_person(&self, person: &Person) -> RepoResult<()> {
        person.validate()?;

        let result = self.conn.execute(
            "UPDATE people
             SET
                full_name = ?2,
                login = ?3,
                birth_date = ?4,
                email = ?5,
                info = ?6,
                bio = ?7,
                photo_path = ?8,
                photo_alt = ?9,
                photo_width = ?10,
                photo_height = ?11,
                photo_payload = ?12,
                photo_ext = ?13,
                account_id = ?14,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE person_id = ?1;",
            params![
                person.person_id.to_string(),
                person.full_name.as_str(),
                person.login.as_str(),
                person.birth_date.as_str(),
                person.email.as_str(),
                person.info.as_str(),
                person.bio.as_str(),
                photo_path_param(&person.photo),
                person.photo.alt.as_str(),
                person.photo.width,
                person.photo.height,
                person.photo.payload.as_slice(),
                person.photo.ext.as_deref(),
                person.account_id.map(|id| id.to_string()),
            ],
        );

        match result {
            Ok(0) => Err(RepoError::NotFound {
                entity: "person",
                id: person.person_id,
            }),
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err, "people.login") => {
                Err(RepoError::LoginTaken(person.login.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn get_person(&self, person_id: PersonId) -> RepoResult<Option<Person>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSON_SELECT_SQL} WHERE person_id = ?1;"))?;
        let mut rows = stmt.query([person_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_person_row(row)?));
        }
        Ok(None)
    }

    fn get_person_by_login(&self, login: &str) -> RepoResult<Option<Person>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSON_SELECT_SQL} WHERE login = ?1;"))?;
        let mut rows = stmt.query([login])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_person_row(row)?));
        }
        Ok(None)
    }

    fn list_people(&self) -> RepoResult<Vec<PersonSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                p.person_id,
                p.full_name,
                p.login,
                p.email,
                (SELECT COUNT(*) FROM achievements a WHERE a.expert_id = p.person_id)
                    AS achievement_count,
                (SELECT COUNT(*) FROM help h WHERE h.expert_id = p.person_id)
                    AS help_item_count
             FROM people p
             ORDER BY p.full_name ASC, p.person_id ASC;",
        )?;

        let mut rows = stmt.query([])?;
        let mut people = Vec::new();
        while let Some(row) = rows.next()? {
            let id_text: String = row.get("person_id")?;
            people.push(PersonSummary {
                person_id: parse_uuid(&id_text, "people.person_id")?,
                full_name: row.get("full_name")?,
                login: row.get("login")?,
                email: row.get("email")?,
                achievement_count: row.get("achievement_count")?,
                help_item_count: row.get("help_item_count")?,
            });
        }
        Ok(people)
    }

    fn delete_person(&self, person_id: PersonId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM people WHERE person_id = ?1;",
            [person_id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "person",
                id: person_id,
            });
        }
        Ok(())
    }
}

fn parse_person_row(row: &Row<'_>) -> RepoResult<Person> {
    let id_text: String = row.get("person_id")?;
    let person_id = parse_uuid(&id_text, "people.person_id")?;

    let account_id: Option<AccountId> = row
        .get::<_, Option<String>>("account_id")?
        .map(|value| parse_uuid(&value, "people.account_id"))
        .transpose()?;

    Ok(Person {
        person_id,
        full_name: row.get("full_name")?,
        login: row.get("login")?,
        birth_date: row.get("birth_date")?,
        email: row.get("email")?,
        info: row.get("info")?,
        bio: row.get("bio")?,
        photo: parse_photo_columns(row)?,
        account_id,
    })
}
