//! Content repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide persistence APIs for events, articles, announcements, help
//!   items, achievements and article photo reports.
//! - Keep SQL details and default ordering behavior inside the repository.
//!
//! # Invariants
//! - Listing order is deterministic per entity: articles by release date
//!   ascending, announcements by `main` flag then event start, achievements
//!   by priority descending.
//! - Write paths call model `validate()` where the entity defines one.

use crate::model::content::{
    Achievement, AchievementId, Announcement, AnnouncementId, Article, ArticleId,
    ArticlePhotoReport, Event, EventId, EventKind, HelpItem, HelpItemId, PhotoReportId,
};
use crate::model::person::PersonId;
use crate::repo::{
    parse_flag, parse_photo_columns, parse_uuid, photo_path_param, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

/// Repository interface for the content entities.
pub trait ContentRepository {
    // Events
    fn create_event(&self, event: &Event) -> RepoResult<EventId>;
    fn update_event(&self, event: &Event) -> RepoResult<()>;
    fn get_event(&self, event_id: EventId) -> RepoResult<Option<Event>>;
    fn list_events(&self) -> RepoResult<Vec<Event>>;
    fn delete_event(&self, event_id: EventId) -> RepoResult<()>;

    // Articles
    fn create_article(&self, article: &Article) -> RepoResult<ArticleId>;
    fn update_article(&self, article: &Article) -> RepoResult<()>;
    fn get_article(&self, article_id: ArticleId) -> RepoResult<Option<Article>>;
    fn list_articles(&self) -> RepoResult<Vec<Article>>;
    fn delete_article(&self, article_id: ArticleId) -> RepoResult<()>;

    // Announcements
    fn create_announcement(&self, announcement: &Announcement) -> RepoResult<AnnouncementId>;
    fn update_announcement(&self, announcement: &Announcement) -> RepoResult<()>;
    fn get_announcement(&self, announcement_id: AnnouncementId)
        -> RepoResult<Option<Announcement>>;
    fn list_announcements(&self) -> RepoResult<Vec<Announcement>>;
    fn delete_announcement(&self, announcement_id: AnnouncementId) -> RepoResult<()>;

    // Help items
    fn create_help_item(&self, item: &HelpItem) -> RepoResult<HelpItemId>;
    fn update_help_item(&self, item: &HelpItem) -> RepoResult<()>;
    fn get_help_item(&self, help_item_id: HelpItemId) -> RepoResult<Option<HelpItem>>;
    fn list_help_items(&self) -> RepoResult<Vec<HelpItem>>;
    fn delete_help_item(&self, help_item_id: HelpItemId) -> RepoResult<()>;

    // Achievements
    fn create_achievement(&self, achievement: &Achievement) -> RepoResult<AchievementId>;
    fn update_achievement(&self, achievement: &Achievement) -> RepoResult<()>;
    fn get_achievement(&self, achievement_id: AchievementId) -> RepoResult<Option<Achievement>>;
    fn list_achievements_for_expert(&self, expert_id: PersonId) -> RepoResult<Vec<Achievement>>;
    fn delete_achievement(&self, achievement_id: AchievementId) -> RepoResult<()>;

    // Article photo reports
    fn create_photo_report(&self, report: &ArticlePhotoReport) -> RepoResult<PhotoReportId>;
    fn update_photo_report(&self, report: &ArticlePhotoReport) -> RepoResult<()>;
    fn get_photo_report(
        &self,
        photo_report_id: PhotoReportId,
    ) -> RepoResult<Option<ArticlePhotoReport>>;
    fn list_photo_reports_for_article(
        &self,
        article_id: ArticleId,
    ) -> RepoResult<Vec<ArticlePhotoReport>>;
    fn delete_photo_report(&self, photo_report_id: PhotoReportId) -> RepoResult<()>;
}

/// SQLite-backed content repository.
pub struct SqliteContentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteContentRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        crate::db::ensure_schema_ready(
            conn,
            &[
                ("events", &["event_id", "name", "start_date", "kind"]),
                ("articles", &["article_id", "name", "release_date", "author_id"]),
                ("announcements", &["announcement_id", "name", "event_id", "main"]),
                ("help", &["help_item_id", "name", "expert_id"]),
                ("achievements", &["achievement_id", "priority", "expert_id"]),
                ("photos", &["photo_report_id", "article_id"]),
            ],
        )?;
        Ok(Self { conn })
    }

    fn delete_by_id(
        &self,
        sql: &str,
        id: Uuid,
        entity: &'static str,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(sql, [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity, id });
        }
        Ok(())
    }
}

impl ContentRepository for SqliteContentRepository<'_> {
    fn create_event(&self, event: &Event) -> RepoResult<EventId> {
        event.validate()?;

        self.conn.execute(
            "INSERT INTO events (
                event_id,
                name,
                content,
                start_date,
                duration,
                kind,
                photo_path,
                photo_alt,
                photo_width,
                photo_height,
                photo_payload,
                photo_ext
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);",
            params![
                event.event_id.to_string(),
                event.name.as_str(),
                event.content.as_deref(),
                event.start_date,
                event.duration.as_deref(),
                event.kind.as_db_str(),
                photo_path_param(&event.photo),
                event.photo.alt.as_str(),
                event.photo.width,
                event.photo.height,
                event.photo.payload.as_slice(),
                event.photo.ext.as_deref(),
            ],
        )?;
        Ok(event.event_id)
    }

    fn update_event(&self, event: &Event) -> RepoResult<()> {
        event.validate()?;

        let changed = self.conn.execute(
            "UPDATE events
             SET
                name = ?2,
                content = ?3,
                start_date = ?4,
                duration = ?5,
                kind = ?6,
                photo_path = ?7,
                photo_alt = ?8,
                photo_width = ?9,
                photo_height = ?10,
                photo_payload = ?11,
                photo_ext = ?12,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE event_id = ?1;",
            params![
                event.event_id.to_string(),
                event.name.as_str(),
                event.content.as_deref(),
                event.start_date,
                event.duration.as_deref(),
                event.kind.as_db_str(),
                photo_path_param(&event.photo),
                event.photo.alt.as_str(),
                event.photo.width,
                event.photo.height,
                event.photo.payload.as_slice(),
                event.photo.ext.as_deref(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "event",
                id: event.event_id,
            });
        }
        Ok(())
    }

    fn get_event(&self, event_id: EventId) -> RepoResult<Option<Event>> {
        let mut stmt = self.conn.prepare(&format!(
            "{EVENT_SELECT_SQL} WHERE event_id = ?1;"
        ))?;
        let mut rows = stmt.query([event_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_event_row(row)?));
        }
        Ok(None)
    }

    fn list_events(&self) -> RepoResult<Vec<Event>> {
        let mut stmt = self.conn.prepare(&format!(
            "{EVENT_SELECT_SQL} ORDER BY start_date ASC, event_id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            events.push(parse_event_row(row)?);
        }
        Ok(events)
    }

    fn delete_event(&self, event_id: EventId) -> RepoResult<()> {
        self.delete_by_id("DELETE FROM events WHERE event_id = ?1;", event_id, "event")
    }

    fn create_article(&self, article: &Article) -> RepoResult<ArticleId> {
        article.validate()?;

        // release_date comes from the column default at insert time.
        self.conn.execute(
            "INSERT INTO articles (article_id, name, content, content_min, author_id)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                article.article_id.to_string(),
                article.name.as_str(),
                article.content.as_str(),
                article.content_min.as_str(),
                article.author_id.to_string(),
            ],
        )?;
        Ok(article.article_id)
    }

    fn update_article(&self, article: &Article) -> RepoResult<()> {
        article.validate()?;

        let changed = self.conn.execute(
            "UPDATE articles
             SET name = ?2, content = ?3, content_min = ?4, author_id = ?5
             WHERE article_id = ?1;",
            params![
                article.article_id.to_string(),
                article.name.as_str(),
                article.content.as_str(),
                article.content_min.as_str(),
                article.author_id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "article",
                id: article.article_id,
            });
        }
        Ok(())
    }

    fn get_article(&self, article_id: ArticleId) -> RepoResult<Option<Article>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ARTICLE_SELECT_SQL} WHERE article_id = ?1;"
        ))?;
        let mut rows = stmt.query([article_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_article_row(row)?));
        }
        Ok(None)
    }

    fn list_articles(&self) -> RepoResult<Vec<Article>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ARTICLE_SELECT_SQL} ORDER BY release_date ASC, article_id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut articles = Vec::new();
        while let Some(row) = rows.next()? {
            articles.push(parse_article_row(row)?);
        }
        Ok(articles)
    }

    fn delete_article(&self, article_id: ArticleId) -> RepoResult<()> {
        self.delete_by_id(
            "DELETE FROM articles WHERE article_id = ?1;",
            article_id,
            "article",
        )
    }

    fn create_announcement(&self, announcement: &Announcement) -> RepoResult<AnnouncementId> {
        announcement.validate()?;

        self.conn.execute(
            "INSERT INTO announcements (announcement_id, name, content, event_id, main)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                announcement.announcement_id.to_string(),
                announcement.name.as_str(),
                announcement.content.as_str(),
                announcement.event_id.to_string(),
                announcement.main,
            ],
        )?;
        Ok(announcement.announcement_id)
    }

    fn update_announcement(&self, announcement: &Announcement) -> RepoResult<()> {
        announcement.validate()?;

        let changed = self.conn.execute(
            "UPDATE announcements
             SET name = ?2, content = ?3, event_id = ?4, main = ?5
             WHERE announcement_id = ?1;",
            params![
                announcement.announcement_id.to_string(),
                announcement.name.as_str(),
                announcement.content.as_str(),
                announcement.event_id.to_string(),
                announcement.main,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "announcement",
                id: announcement.announcement_id,
            });
        }
        Ok(())
    }

    fn get_announcement(
        &self,
        announcement_id: AnnouncementId,
    ) -> RepoResult<Option<Announcement>> {
        let mut stmt = self.conn.prepare(
            "SELECT announcement_id, name, content, event_id, main
             FROM announcements
             WHERE announcement_id = ?1;",
        )?;
        let mut rows = stmt.query([announcement_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_announcement_row(row)?));
        }
        Ok(None)
    }

    fn list_announcements(&self) -> RepoResult<Vec<Announcement>> {
        // Pinned announcements first, then by the start of the referenced
        // event.
        let mut stmt = self.conn.prepare(
            "SELECT a.announcement_id, a.name, a.content, a.event_id, a.main
             FROM announcements a
             INNER JOIN events e ON e.event_id = a.event_id
             ORDER BY a.main DESC, e.start_date ASC, a.announcement_id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut announcements = Vec::new();
        while let Some(row) = rows.next()? {
            announcements.push(parse_announcement_row(row)?);
        }
        Ok(announcements)
    }

    fn delete_announcement(&self, announcement_id: AnnouncementId) -> RepoResult<()> {
        self.delete_by_id(
            "DELETE FROM announcements WHERE announcement_id = ?1;",
            announcement_id,
            "announcement",
        )
    }

    fn create_help_item(&self, item: &HelpItem) -> RepoResult<HelpItemId> {
        item.validate()?;

        self.conn.execute(
            "INSERT INTO help (help_item_id, name, description, expert_id)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                item.help_item_id.to_string(),
                item.name.as_str(),
                item.description.as_deref(),
                item.expert_id.to_string(),
            ],
        )?;
        Ok(item.help_item_id)
    }

    fn update_help_item(&self, item: &HelpItem) -> RepoResult<()> {
        item.validate()?;

        let changed = self.conn.execute(
            "UPDATE help
             SET name = ?2, description = ?3, expert_id = ?4
             WHERE help_item_id = ?1;",
            params![
                item.help_item_id.to_string(),
                item.name.as_str(),
                item.description.as_deref(),
                item.expert_id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "help item",
                id: item.help_item_id,
            });
        }
        Ok(())
    }

    fn get_help_item(&self, help_item_id: HelpItemId) -> RepoResult<Option<HelpItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT help_item_id, name, description, expert_id
             FROM help
             WHERE help_item_id = ?1;",
        )?;
        let mut rows = stmt.query([help_item_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_help_item_row(row)?));
        }
        Ok(None)
    }

    fn list_help_items(&self) -> RepoResult<Vec<HelpItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT help_item_id, name, description, expert_id
             FROM help
             ORDER BY name ASC, help_item_id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_help_item_row(row)?);
        }
        Ok(items)
    }

    fn delete_help_item(&self, help_item_id: HelpItemId) -> RepoResult<()> {
        self.delete_by_id(
            "DELETE FROM help WHERE help_item_id = ?1;",
            help_item_id,
            "help item",
        )
    }

    fn create_achievement(&self, achievement: &Achievement) -> RepoResult<AchievementId> {
        self.conn.execute(
            "INSERT INTO achievements (
                achievement_id,
                priority,
                expert_id,
                photo_path,
                photo_alt,
                photo_width,
                photo_height,
                photo_payload,
                photo_ext
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                achievement.achievement_id.to_string(),
                achievement.priority,
                achievement.expert_id.to_string(),
                photo_path_param(&achievement.photo),
                achievement.photo.alt.as_str(),
                achievement.photo.width,
                achievement.photo.height,
                achievement.photo.payload.as_slice(),
                achievement.photo.ext.as_deref(),
            ],
        )?;
        Ok(achievement.achievement_id)
    }

    fn update_achievement(&self, achievement: &Achievement) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE achievements
             SET
                priority = ?2,
                expert_id = ?3,
                photo_path = ?4,
                photo_alt = ?5,
                photo_width = ?6,
                photo_height = ?7,
                photo_payload = ?8,
                photo_ext = ?9
             WHERE achievement_id = ?1;",
            params![
                achievement.achievement_id.to_string(),
                achievement.priority,
                achievement.expert_id.to_string(),
                photo_path_param(&achievement.photo),
                achievement.photo.alt.as_str(),
                achievement.photo.width,
                achievement.photo.height,
                achievement.photo.payload.as_slice(),
                achievement.photo.ext.as_deref(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "achievement",
                id: achievement.achievement_id,
            });
        }
        Ok(())
    }

    fn get_achievement(&self, achievement_id: AchievementId) -> RepoResult<Option<Achievement>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ACHIEVEMENT_SELECT_SQL} WHERE achievement_id = ?1;"
        ))?;
        let mut rows = stmt.query([achievement_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_achievement_row(row)?));
        }
        Ok(None)
    }

    fn list_achievements_for_expert(&self, expert_id: PersonId) -> RepoResult<Vec<Achievement>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ACHIEVEMENT_SELECT_SQL}
             WHERE expert_id = ?1
             ORDER BY priority DESC, achievement_id ASC;"
        ))?;
        let mut rows = stmt.query([expert_id.to_string()])?;
        let mut achievements = Vec::new();
        while let Some(row) = rows.next()? {
            achievements.push(parse_achievement_row(row)?);
        }
        Ok(achievements)
    }

    fn delete_achievement(&self, achievement_id: AchievementId) -> RepoResult<()> {
        self.delete_by_id(
            "DELETE FROM achievements WHERE achievement_id = ?1;",
            achievement_id,
            "achievement",
        )
    }

    fn create_photo_report(&self, report: &ArticlePhotoReport) -> RepoResult<PhotoReportId> {
        self.conn.execute(
            "INSERT INTO photos (
                photo_report_id,
                article_id,
                photo_path,
                photo_alt,
                photo_width,
                photo_height,
                photo_payload,
                photo_ext
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                report.photo_report_id.to_string(),
                report.article_id.to_string(),
                photo_path_param(&report.photo),
                report.photo.alt.as_str(),
                report.photo.width,
                report.photo.height,
                report.photo.payload.as_slice(),
                report.photo.ext.as_deref(),
            ],
        )?;
        Ok(report.photo_report_id)
    }

    fn update_photo_report(&self, report: &ArticlePhotoReport) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE photos
             SET
                article_id = ?2,
                photo_path = ?3,
                photo_alt = ?4,
                photo_width = ?5,
                photo_height = ?6,
                photo_payload = ?7,
                photo_ext = ?8
             WHERE photo_report_id = ?1;",
            params![
                report.photo_report_id.to_string(),
                report.article_id.to_string(),
                photo_path_param(&report.photo),
                report.photo.alt.as_str(),
                report.photo.width,
                report.photo.height,
                report.photo.payload.as_slice(),
                report.photo.ext.as_deref(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "photo report",
                id: report.photo_report_id,
            });
        }
        Ok(())
    }

    fn get_photo_report(
        &self,
        photo_report_id: PhotoReportId,
    ) -> RepoResult<Option<ArticlePhotoReport>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PHOTO_REPORT_SELECT_SQL} WHERE photo_report_id = ?1;"
        ))?;
        let mut rows = stmt.query([photo_report_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_photo_report_row(row)?));
        }
        Ok(None)
    }

    fn list_photo_reports_for_article(
        &self,
        article_id: ArticleId,
    ) -> RepoResult<Vec<ArticlePhotoReport>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PHOTO_REPORT_SELECT_SQL}
             WHERE article_id = ?1
             ORDER BY photo_report_id ASC;"
        ))?;
        let mut rows = stmt.query([article_id.to_string()])?;
        let mut reports = Vec::new();
        while let Some(row) = rows.next()? {
            reports.push(parse_photo_report_row(row)?);
        }
        Ok(reports)
    }

    fn delete_photo_report(&self, photo_report_id: PhotoReportId) -> RepoResult<()> {
        self.delete_by_id(
            "DELETE FROM photos WHERE photo_report_id = ?1;",
            photo_report_id,
            "photo report",
        )
    }
}

const EVENT_SELECT_SQL: &str = "SELECT
    event_id,
    name,
    content,
    start_date,
    duration,
    kind,
    photo_path,
    photo_alt,
    photo_width,
    photo_height,
    photo_payload,
    photo_ext
FROM events";

const ARTICLE_SELECT_SQL: &str = "SELECT
    article_id,
    name,
    content,
    content_min,
    release_date,
    author_id
FROM articles";

const ACHIEVEMENT_SELECT_SQL: &str = "SELECT
    achievement_id,
    priority,
    expert_id,
    photo_path,
    photo_alt,
    photo_width,
    photo_height,
    photo_payload,
    photo_ext
FROM achievements";

const PHOTO_REPORT_SELECT_SQL: &str = "SELECT
    photo_report_id,
    article_id,
    photo_path,
    photo_alt,
    photo_width,
    photo_height,
    photo_payload,
    photo_ext
FROM photos";

fn parse_event_row(row: &Row<'_>) -> RepoResult<Event> {
    let id_text: String = row.get("event_id")?;
    let kind_text: String = row.get("kind")?;
    let kind = EventKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid event kind `{kind_text}` in events.kind"))
    })?;

    Ok(Event {
        event_id: parse_uuid(&id_text, "events.event_id")?,
        name: row.get("name")?,
        content: row.get("content")?,
        start_date: row.get("start_date")?,
        duration: row.get("duration")?,
        kind,
        photo: parse_photo_columns(row)?,
    })
}

fn parse_article_row(row: &Row<'_>) -> RepoResult<Article> {
    let id_text: String = row.get("article_id")?;
    let author_text: String = row.get("author_id")?;

    Ok(Article {
        article_id: parse_uuid(&id_text, "articles.article_id")?,
        name: row.get("name")?,
        content: row.get("content")?,
        content_min: row.get("content_min")?,
        release_date: row.get("release_date")?,
        author_id: parse_uuid(&author_text, "articles.author_id")?,
    })
}

fn parse_announcement_row(row: &Row<'_>) -> RepoResult<Announcement> {
    let id_text: String = row.get("announcement_id")?;
    let event_text: String = row.get("event_id")?;

    Ok(Announcement {
        announcement_id: parse_uuid(&id_text, "announcements.announcement_id")?,
        name: row.get("name")?,
        content: row.get("content")?,
        event_id: parse_uuid(&event_text, "announcements.event_id")?,
        main: parse_flag(row.get("main")?, "announcements.main")?,
    })
}

fn parse_help_item_row(row: &Row<'_>) -> RepoResult<HelpItem> {
    let id_text: String = row.get("help_item_id")?;
    let expert_text: String = row.get("expert_id")?;

    Ok(HelpItem {
        help_item_id: parse_uuid(&id_text, "help.help_item_id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        expert_id: parse_uuid(&expert_text, "help.expert_id")?,
    })
}

fn parse_achievement_row(row: &Row<'_>) -> RepoResult<Achievement> {
    let id_text: String = row.get("achievement_id")?;
    let expert_text: String = row.get("expert_id")?;

    Ok(Achievement {
        achievement_id: parse_uuid(&id_text, "achievements.achievement_id")?,
        priority: row.get("priority")?,
        expert_id: parse_uuid(&expert_text, "achievements.expert_id")?,
        photo: parse_photo_columns(row)?,
    })
}

fn parse_photo_report_row(row: &Row<'_>) -> RepoResult<ArticlePhotoReport> {
    let id_text: String = row.get("photo_report_id")?;
    let article_text: String = row.get("article_id")?;

    Ok(ArticlePhotoReport {
        photo_report_id: parse_uuid(&id_text, "photos.photo_report_id")?,
        article_id: parse_uuid(&article_text, "photos.article_id")?,
        photo: parse_photo_columns(row)?,
    })
}
