//! Account-linked profile lifecycle.
//!
//! # Responsibility
//! - Keep every persisted `Person` coupled 1:1 to a directory account:
//!   provision on first save, mirror login/email on later saves.
//! - Own the delete policy: privileged accounts refuse the cascade.
//!
//! # Invariants
//! - Account mutation happens before the profile write; a failed profile
//!   write triggers a compensating rollback of the account change.
//! - Privileged-delete refusal is an explicit outcome, not an error.
//! - Photo normalization runs on every save.

use crate::config::CoreConfig;
use crate::media::{normalize_photo, PhotoError};
use crate::model::person::{AccountId, Person, PersonId};
use crate::model::ValidationError;
use crate::repo::account_repo::{AccountDirectory, AccountError, NewAccount};
use crate::repo::person_repo::{PersonRepository, PersonSummary};
use crate::repo::RepoError;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result of a profile delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Profile and linked account are gone.
    Deleted,
    /// The linked account is privileged; nothing was removed.
    RefusedPrivileged,
    /// No profile with that id exists.
    NotFound,
}

/// Service error for profile use-cases.
#[derive(Debug)]
pub enum PersonServiceError {
    Validation(ValidationError),
    Photo(PhotoError),
    Repo(RepoError),
    Account(AccountError),
}

impl Display for PersonServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Photo(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Account(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PersonServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Photo(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Account(err) => Some(err),
        }
    }
}

impl From<PhotoError> for PersonServiceError {
    fn from(value: PhotoError) -> Self {
        Self::Photo(value)
    }
}

impl From<RepoError> for PersonServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<AccountError> for PersonServiceError {
    fn from(value: AccountError) -> Self {
        Self::Account(value)
    }
}

/// Profile lifecycle facade over a profile repository and the authentication
/// directory.
pub struct PersonService<P: PersonRepository, A: AccountDirectory> {
    people: P,
    accounts: A,
    config: CoreConfig,
}

impl<P: PersonRepository, A: AccountDirectory> PersonService<P, A> {
    pub fn new(people: P, accounts: A, config: CoreConfig) -> Self {
        Self {
            people,
            accounts,
            config,
        }
    }

    /// Creates or updates a profile together with its directory account.
    ///
    /// # Contract
    /// - Without an account reference: provisions a staff account (login as
    ///   username, configured initial password and default group) and
    ///   attaches it before the profile insert.
    /// - With an account reference: pushes the profile's login/email into
    ///   the account before the profile write.
    /// - On a failed profile write the account change is rolled back
    ///   best-effort and the original error is returned.
    pub fn save_person(&self, person: &mut Person) -> Result<(), PersonServiceError> {
        person.validate().map_err(PersonServiceError::Validation)?;
        normalize_photo(&mut person.photo)?;

        match person.account_id {
            Some(account_id) => self.save_with_existing_account(person, account_id),
            None => self.save_with_new_account(person),
        }
    }

    fn save_with_existing_account(
        &self,
        person: &Person,
        account_id: AccountId,
    ) -> Result<(), PersonServiceError> {
        let previous = self
            .accounts
            .get_account(account_id)?
            .ok_or(PersonServiceError::Account(AccountError::NotFound(
                account_id,
            )))?;

        self.accounts
            .update_account(account_id, &person.login, &person.email)?;

        let written = if self.people.get_person(person.person_id)?.is_some() {
            self.people.update_person(person)
        } else {
            self.people.create_person(person).map(|_| ())
        };

        if let Err(err) = written {
            match self
                .accounts
                .update_account(account_id, &previous.username, &previous.email)
            {
                Ok(()) => warn!(
                    "event=account_rollback module=person status=ok account={account_id}"
                ),
                Err(rollback_err) => error!(
                    "event=account_rollback module=person status=error account={account_id} error={rollback_err}"
                ),
            }
            return Err(err.into());
        }

        info!(
            "event=person_save module=person status=ok mode=update person={} account={account_id}",
            person.person_id
        );
        Ok(())
    }

    fn save_with_new_account(&self, person: &mut Person) -> Result<(), PersonServiceError> {
        let account_id = self.accounts.create_account(&NewAccount {
            username: person.login.clone(),
            email: person.email.clone(),
            password: self.config.initial_password.clone(),
            is_staff: true,
            groups: vec![self.config.default_group.clone()],
        })?;
        person.account_id = Some(account_id);

        if let Err(err) = self.people.create_person(person) {
            person.account_id = None;
            match self.accounts.delete_account(account_id) {
                Ok(()) => warn!(
                    "event=account_rollback module=person status=ok account={account_id}"
                ),
                Err(rollback_err) => error!(
                    "event=account_rollback module=person status=error error_code=orphaned_account account={account_id} error={rollback_err}"
                ),
            }
            return Err(err.into());
        }

        info!(
            "event=person_save module=person status=ok mode=create person={} account={account_id}",
            person.person_id
        );
        Ok(())
    }

    /// Deletes a profile and its linked account.
    ///
    /// # Contract
    /// - Privileged accounts refuse the delete; both records stay intact and
    ///   a diagnostic is logged.
    /// - The account is removed first, then the profile; the two operations
    ///   are not atomic and a failure in between leaves an orphaned profile
    ///   (logged, not recovered).
    /// - A dangling account reference does not block the profile delete.
    pub fn delete_person(&self, person_id: PersonId) -> Result<DeleteOutcome, PersonServiceError> {
        let Some(person) = self.people.get_person(person_id)? else {
            return Ok(DeleteOutcome::NotFound);
        };

        let Some(account_id) = person.account_id else {
            self.people.delete_person(person_id)?;
            warn!("event=person_delete module=person status=ok person={person_id} account=none");
            return Ok(DeleteOutcome::Deleted);
        };

        match self.accounts.is_privileged(account_id) {
            Ok(true) => {
                warn!(
                    "event=person_delete module=person status=refused reason=privileged person={person_id} account={account_id}"
                );
                return Ok(DeleteOutcome::RefusedPrivileged);
            }
            Ok(false) => {
                self.accounts.delete_account(account_id)?;
            }
            Err(AccountError::NotFound(_)) => {
                warn!(
                    "event=person_delete module=person status=dangling_ref person={person_id} account={account_id}"
                );
            }
            Err(err) => return Err(err.into()),
        }

        if let Err(err) = self.people.delete_person(person_id) {
            error!(
                "event=person_delete module=person status=error error_code=orphaned_profile person={person_id} account={account_id} error={err}"
            );
            return Err(err.into());
        }

        info!(
            "event=person_delete module=person status=ok person={person_id} account={account_id}"
        );
        Ok(DeleteOutcome::Deleted)
    }

    /// Deletes several profiles, reporting one outcome per id so the caller
    /// can surface refusals individually.
    pub fn delete_people(
        &self,
        person_ids: &[PersonId],
    ) -> Result<Vec<(PersonId, DeleteOutcome)>, PersonServiceError> {
        let mut outcomes = Vec::with_capacity(person_ids.len());
        for person_id in person_ids {
            outcomes.push((*person_id, self.delete_person(*person_id)?));
        }
        Ok(outcomes)
    }

    pub fn get_person(&self, person_id: PersonId) -> Result<Option<Person>, PersonServiceError> {
        Ok(self.people.get_person(person_id)?)
    }

    pub fn get_person_by_login(
        &self,
        login: &str,
    ) -> Result<Option<Person>, PersonServiceError> {
        Ok(self.people.get_person_by_login(login)?)
    }

    pub fn list_people(&self) -> Result<Vec<PersonSummary>, PersonServiceError> {
        Ok(self.people.list_people()?)
    }
}
