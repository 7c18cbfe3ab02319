use image::{Rgba, RgbaImage};
use practica_core::db::open_db_in_memory;
use practica_core::{
    Achievement, ContentService, ContentServiceError, CoreConfig, Person, PersonId,
    PersonRepository, PersonService, SqliteAccountDirectory, SqliteContentRepository,
    SqlitePersonRepository,
};
use std::path::{Path, PathBuf};

fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    let pixels = RgbaImage::from_pixel(width, height, Rgba([40, 90, 140, 255]));
    pixels.save(&path).unwrap();
    path
}

#[test]
fn saving_an_achievement_with_a_png_derives_payload_and_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let png = write_png(dir.path(), "certificate.png", 100, 50);

    let conn = open_db_in_memory().unwrap();
    let expert_id = insert_expert(&conn);
    let service = ContentService::new(SqliteContentRepository::try_new(&conn).unwrap());

    let mut achievement = Achievement::new(expert_id);
    achievement.photo.source_path = Some(png);
    service.save_achievement(&mut achievement).unwrap();

    assert!(!achievement.photo.payload.is_empty());
    assert_eq!(achievement.photo.ext.as_deref(), Some("PNG"));
    assert_eq!(achievement.photo.width, Some(100));
    assert_eq!(achievement.photo.height, Some(50));
    assert_eq!(achievement.photo.alt, "certificate.png");

    let stored = service
        .get_achievement(achievement.achievement_id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.photo.payload, achievement.photo.payload);
    assert_eq!(stored.photo.ext.as_deref(), Some("PNG"));
}

#[test]
fn explicit_alt_text_is_not_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let png = write_png(dir.path(), "certificate.png", 10, 10);

    let conn = open_db_in_memory().unwrap();
    let expert_id = insert_expert(&conn);
    let service = ContentService::new(SqliteContentRepository::try_new(&conn).unwrap());

    let mut achievement = Achievement::new(expert_id);
    achievement.photo.source_path = Some(png);
    achievement.photo.alt = "gestalt therapy diploma".to_string();
    service.save_achievement(&mut achievement).unwrap();

    assert_eq!(achievement.photo.alt, "gestalt therapy diploma");
}

#[test]
fn saving_without_a_photo_clears_any_previous_payload() {
    let dir = tempfile::tempdir().unwrap();
    let png = write_png(dir.path(), "certificate.png", 20, 20);

    let conn = open_db_in_memory().unwrap();
    let expert_id = insert_expert(&conn);
    let service = ContentService::new(SqliteContentRepository::try_new(&conn).unwrap());

    let mut achievement = Achievement::new(expert_id);
    achievement.photo.source_path = Some(png);
    service.save_achievement(&mut achievement).unwrap();
    assert!(!achievement.photo.payload.is_empty());

    achievement.photo.source_path = None;
    service.save_achievement(&mut achievement).unwrap();

    let stored = service
        .get_achievement(achievement.achievement_id)
        .unwrap()
        .unwrap();
    assert!(stored.photo.payload.is_empty());
    assert_eq!(stored.photo.ext, None);
    assert_eq!(stored.photo.width, None);
    assert_eq!(stored.photo.height, None);
}

#[test]
fn repeated_saves_re_derive_the_payload() {
    let dir = tempfile::tempdir().unwrap();
    let png = write_png(dir.path(), "certificate.png", 30, 30);

    let conn = open_db_in_memory().unwrap();
    let expert_id = insert_expert(&conn);
    let service = ContentService::new(SqliteContentRepository::try_new(&conn).unwrap());

    let mut achievement = Achievement::new(expert_id);
    achievement.photo.source_path = Some(png);
    service.save_achievement(&mut achievement).unwrap();
    let first_payload = achievement.photo.payload.clone();

    service.save_achievement(&mut achievement).unwrap();
    assert_eq!(achievement.photo.payload, first_payload);
    assert_eq!(achievement.photo.width, Some(30));
}

#[test]
fn an_unreadable_image_fails_the_save_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let fake = dir.path().join("broken.png");
    std::fs::write(&fake, b"this is not image data").unwrap();

    let conn = open_db_in_memory().unwrap();
    let expert_id = insert_expert(&conn);
    let service = ContentService::new(SqliteContentRepository::try_new(&conn).unwrap());

    let mut achievement = Achievement::new(expert_id);
    achievement.photo.source_path = Some(fake);
    let err = service.save_achievement(&mut achievement).unwrap_err();
    assert!(matches!(err, ContentServiceError::Photo(_)));

    assert!(service
        .get_achievement(achievement.achievement_id)
        .unwrap()
        .is_none());
}

#[test]
fn person_profiles_normalize_their_photo_on_save() {
    let dir = tempfile::tempdir().unwrap();
    let png = write_png(dir.path(), "portrait.png", 64, 64);

    let conn = open_db_in_memory().unwrap();
    let people = SqlitePersonRepository::try_new(&conn).unwrap();
    let accounts = SqliteAccountDirectory::try_new(&conn).unwrap();
    let service = PersonService::new(people, accounts, CoreConfig::default());

    let mut person = Person::new("Jane Doe", "jdoe", "1985-04-12", "jdoe@example.com");
    person.photo.source_path = Some(png);
    service.save_person(&mut person).unwrap();

    let loaded = service.get_person(person.person_id).unwrap().unwrap();
    assert!(!loaded.photo.payload.is_empty());
    assert_eq!(loaded.photo.ext.as_deref(), Some("PNG"));
    assert_eq!(loaded.photo.alt, "portrait.png");
}

fn insert_expert(conn: &rusqlite::Connection) -> PersonId {
    let person = Person::new("Expert Person", "expert", "1980-01-01", "expert@example.com");
    let people = SqlitePersonRepository::try_new(conn).unwrap();
    people.create_person(&person).unwrap();
    person.person_id
}
