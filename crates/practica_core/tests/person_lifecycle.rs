use practica_core::db::open_db_in_memory;
use practica_core::repo::account_repo::set_privileged;
use practica_core::{
    AccountDirectory, AccountError, CoreConfig, DeleteOutcome, Person, PersonService,
    PersonServiceError, RepoError, SqliteAccountDirectory, SqlitePersonRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

fn service<'a>(
    conn: &'a Connection,
) -> PersonService<SqlitePersonRepository<'a>, SqliteAccountDirectory<'a>> {
    let people = SqlitePersonRepository::try_new(conn).unwrap();
    let accounts = SqliteAccountDirectory::try_new(conn).unwrap();
    PersonService::new(people, accounts, CoreConfig::default())
}

fn sample_person(login: &str) -> Person {
    Person::new("Jane Doe", login, "1985-04-12", format!("{login}@example.com"))
}

#[test]
fn first_save_provisions_a_staff_account() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let mut person = sample_person("jdoe");
    assert_eq!(person.account_id, None);
    service.save_person(&mut person).unwrap();

    let account_id = person.account_id.expect("account should be attached");
    let directory = SqliteAccountDirectory::try_new(&conn).unwrap();
    let account = directory.get_account(account_id).unwrap().unwrap();
    assert_eq!(account.username, "jdoe");
    assert_eq!(account.email, "jdoe@example.com");
    assert!(account.is_staff);
    assert!(!account.is_superuser);
    assert_eq!(account.groups, vec!["specialists".to_string()]);

    let loaded = service.get_person(person.person_id).unwrap().unwrap();
    assert_eq!(loaded.account_id, Some(account_id));
}

#[test]
fn later_saves_mirror_login_and_email_into_the_account() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let mut person = sample_person("jdoe");
    service.save_person(&mut person).unwrap();
    let account_id = person.account_id.unwrap();

    person.login = "janedoe".to_string();
    person.email = "jane@practice.example".to_string();
    service.save_person(&mut person).unwrap();

    let directory = SqliteAccountDirectory::try_new(&conn).unwrap();
    let account = directory.get_account(account_id).unwrap().unwrap();
    assert_eq!(account.username, "janedoe");
    assert_eq!(account.email, "jane@practice.example");

    let loaded = service.get_person_by_login("janedoe").unwrap().unwrap();
    assert_eq!(loaded.person_id, person.person_id);
}

#[test]
fn duplicate_login_on_first_save_is_a_typed_failure() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let mut first = sample_person("jdoe");
    service.save_person(&mut first).unwrap();

    let mut second = sample_person("jdoe");
    let err = service.save_person(&mut second).unwrap_err();
    assert!(matches!(
        err,
        PersonServiceError::Account(AccountError::UsernameTaken(_))
    ));
    assert_eq!(second.account_id, None);
}

#[test]
fn failed_profile_insert_rolls_back_the_provisioned_account() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let mut first = sample_person("jdoe");
    service.save_person(&mut first).unwrap();

    // Same stable id, fresh login: the directory accepts the new account but
    // the profile insert collides on the primary key.
    let mut clashing = Person::with_id(
        first.person_id,
        "John Roe",
        "jroe",
        "1990-01-01",
        "jroe@example.com",
    );
    let err = service.save_person(&mut clashing).unwrap_err();
    assert!(matches!(err, PersonServiceError::Repo(_)));
    assert_eq!(clashing.account_id, None);

    let provisioned: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM accounts WHERE username = 'jroe';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(provisioned, 0, "rolled-back account must not survive");
}

#[test]
fn failed_profile_update_restores_previous_account_identity() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let mut anna = sample_person("anna");
    service.save_person(&mut anna).unwrap();
    let mut boris = sample_person("boris");
    service.save_person(&mut boris).unwrap();

    // Leave anna's profile dangling so only `people.login` still holds the
    // name `anna`.
    let directory = SqliteAccountDirectory::try_new(&conn).unwrap();
    directory.delete_account(anna.account_id.unwrap()).unwrap();

    boris.login = "anna".to_string();
    boris.email = "anna@example.com".to_string();
    let err = service.save_person(&mut boris).unwrap_err();
    assert!(matches!(err, PersonServiceError::Repo(RepoError::LoginTaken(_))));

    let account = directory
        .get_account(boris.account_id.unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(account.username, "boris");
    assert_eq!(account.email, "boris@example.com");
}

#[test]
fn deleting_a_person_removes_profile_and_account() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let mut person = sample_person("jdoe");
    service.save_person(&mut person).unwrap();
    let account_id = person.account_id.unwrap();

    let outcome = service.delete_person(person.person_id).unwrap();
    assert_eq!(outcome, DeleteOutcome::Deleted);

    assert!(service.get_person(person.person_id).unwrap().is_none());
    let directory = SqliteAccountDirectory::try_new(&conn).unwrap();
    assert!(directory.get_account(account_id).unwrap().is_none());
}

#[test]
fn deleting_a_privileged_person_is_refused_and_leaves_both_records() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let mut person = sample_person("chief");
    service.save_person(&mut person).unwrap();
    let account_id = person.account_id.unwrap();
    set_privileged(&conn, account_id, true).unwrap();

    let outcome = service.delete_person(person.person_id).unwrap();
    assert_eq!(outcome, DeleteOutcome::RefusedPrivileged);

    assert!(service.get_person(person.person_id).unwrap().is_some());
    let directory = SqliteAccountDirectory::try_new(&conn).unwrap();
    assert!(directory.get_account(account_id).unwrap().is_some());
}

#[test]
fn deleting_an_unknown_person_reports_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let outcome = service.delete_person(Uuid::new_v4()).unwrap();
    assert_eq!(outcome, DeleteOutcome::NotFound);
}

#[test]
fn dangling_account_reference_does_not_block_the_profile_delete() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let mut person = sample_person("jdoe");
    service.save_person(&mut person).unwrap();

    let directory = SqliteAccountDirectory::try_new(&conn).unwrap();
    directory.delete_account(person.account_id.unwrap()).unwrap();

    let outcome = service.delete_person(person.person_id).unwrap();
    assert_eq!(outcome, DeleteOutcome::Deleted);
    assert!(service.get_person(person.person_id).unwrap().is_none());
}

#[test]
fn bulk_delete_reports_one_outcome_per_id() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let mut regular = sample_person("regular");
    service.save_person(&mut regular).unwrap();
    let mut chief = sample_person("chief");
    service.save_person(&mut chief).unwrap();
    set_privileged(&conn, chief.account_id.unwrap(), true).unwrap();
    let missing = Uuid::new_v4();

    let outcomes = service
        .delete_people(&[regular.person_id, chief.person_id, missing])
        .unwrap();

    assert_eq!(
        outcomes,
        vec![
            (regular.person_id, DeleteOutcome::Deleted),
            (chief.person_id, DeleteOutcome::RefusedPrivileged),
            (missing, DeleteOutcome::NotFound),
        ]
    );
}

#[test]
fn list_people_aggregates_dependent_counts() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let mut person = sample_person("jdoe");
    service.save_person(&mut person).unwrap();

    conn.execute(
        "INSERT INTO achievements (achievement_id, priority, expert_id)
         VALUES (?1, 1, ?2);",
        [Uuid::new_v4().to_string(), person.person_id.to_string()],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO help (help_item_id, name, expert_id)
         VALUES (?1, 'family therapy', ?2);",
        [Uuid::new_v4().to_string(), person.person_id.to_string()],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO help (help_item_id, name, expert_id)
         VALUES (?1, 'group sessions', ?2);",
        [Uuid::new_v4().to_string(), person.person_id.to_string()],
    )
    .unwrap();

    let summaries = service.list_people().unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].login, "jdoe");
    assert_eq!(summaries[0].achievement_count, 1);
    assert_eq!(summaries[0].help_item_count, 2);
}

#[test]
fn repositories_reject_uninitialized_connections() {
    let conn = Connection::open_in_memory().unwrap();

    assert!(SqlitePersonRepository::try_new(&conn).is_err());
    assert!(SqliteAccountDirectory::try_new(&conn).is_err());
}
