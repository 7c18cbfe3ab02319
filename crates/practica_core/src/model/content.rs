//! Content entities: events, articles, announcements, help items,
//! achievements and article photo reports.
//!
//! # Responsibility
//! - Define the records managed through the administrative surface.
//!
//! # Invariants
//! - Records referencing a `Person`, `Event` or `Article` are removed by FK
//!   cascade when the referenced row is deleted.

use crate::model::person::PersonId;
use crate::model::photo::PhotoAttachment;
use crate::model::{require_max_chars, require_non_empty, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type EventId = Uuid;
pub type ArticleId = Uuid;
pub type AnnouncementId = Uuid;
pub type HelpItemId = Uuid;
pub type AchievementId = Uuid;
pub type PhotoReportId = Uuid;

pub const NAME_MAX_CHARS: usize = 50;
pub const TEASER_MAX_CHARS: usize = 300;
pub const SHORT_TEXT_MAX_CHARS: usize = 200;

/// Audience category for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Training open to everyone.
    Common,
    /// Training for professionals.
    Professional,
    /// Personal growth programs.
    Personal,
    /// Foundational psychology education.
    University,
}

impl EventKind {
    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Professional => "prof",
            Self::Personal => "personal",
            Self::University => "university",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "common" => Some(Self::Common),
            "prof" => Some(Self::Professional),
            "personal" => Some(Self::Personal),
            "university" => Some(Self::University),
            _ => None,
        }
    }
}

/// A single training or program run by the practice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: EventId,
    pub name: String,
    pub content: Option<String>,
    /// Start of the event in epoch milliseconds.
    pub start_date: i64,
    /// Free-text duration, e.g. "2 days".
    pub duration: Option<String>,
    pub kind: EventKind,
    pub photo: PhotoAttachment,
}

impl Event {
    pub fn new(name: impl Into<String>, start_date: i64) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            name: name.into(),
            content: None,
            start_date,
            duration: None,
            kind: EventKind::Common,
            photo: PhotoAttachment::none(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty(&self.name, "event", "name")?;
        require_max_chars(&self.name, "event", "name", NAME_MAX_CHARS)?;
        if let Some(content) = &self.content {
            require_max_chars(content, "event", "content", SHORT_TEXT_MAX_CHARS)?;
        }
        Ok(())
    }
}

/// A published article by one of the specialists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub article_id: ArticleId,
    pub name: String,
    pub content: String,
    /// Short teaser shown in listings.
    pub content_min: String,
    /// Epoch milliseconds; assigned by storage at first insert.
    pub release_date: i64,
    pub author_id: PersonId,
}

impl Article {
    pub fn new(
        name: impl Into<String>,
        content: impl Into<String>,
        content_min: impl Into<String>,
        author_id: PersonId,
    ) -> Self {
        Self {
            article_id: Uuid::new_v4(),
            name: name.into(),
            content: content.into(),
            content_min: content_min.into(),
            release_date: 0,
            author_id,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty(&self.name, "article", "name")?;
        require_max_chars(&self.name, "article", "name", NAME_MAX_CHARS)?;
        require_max_chars(&self.content_min, "article", "content_min", TEASER_MAX_CHARS)?;
        Ok(())
    }
}

/// Front-page announcement pointing at an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub announcement_id: AnnouncementId,
    pub name: String,
    pub content: String,
    pub event_id: EventId,
    /// Pinned to the top of listings when set.
    pub main: bool,
}

impl Announcement {
    pub fn new(name: impl Into<String>, event_id: EventId) -> Self {
        Self {
            announcement_id: Uuid::new_v4(),
            name: name.into(),
            content: String::new(),
            event_id,
            main: false,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty(&self.name, "announcement", "name")?;
        require_max_chars(&self.name, "announcement", "name", NAME_MAX_CHARS)?;
        require_max_chars(
            &self.content,
            "announcement",
            "content",
            SHORT_TEXT_MAX_CHARS,
        )?;
        Ok(())
    }
}

/// One kind of help the practice offers, attributed to an expert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelpItem {
    pub help_item_id: HelpItemId,
    pub name: String,
    pub description: Option<String>,
    pub expert_id: PersonId,
}

impl HelpItem {
    pub fn new(name: impl Into<String>, expert_id: PersonId) -> Self {
        Self {
            help_item_id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            expert_id,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty(&self.name, "help item", "name")?;
        require_max_chars(&self.name, "help item", "name", NAME_MAX_CHARS)?;
        if let Some(description) = &self.description {
            require_max_chars(description, "help item", "description", SHORT_TEXT_MAX_CHARS)?;
        }
        Ok(())
    }
}

/// Certificate or other proof of competence. The photo's alt text doubles as
/// the display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub achievement_id: AchievementId,
    /// Higher priority sorts first in listings.
    pub priority: i64,
    pub expert_id: PersonId,
    pub photo: PhotoAttachment,
}

impl Achievement {
    pub fn new(expert_id: PersonId) -> Self {
        Self {
            achievement_id: Uuid::new_v4(),
            priority: 2,
            expert_id,
            photo: PhotoAttachment::none(),
        }
    }
}

/// Photo attached to an article's report gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticlePhotoReport {
    pub photo_report_id: PhotoReportId,
    pub article_id: ArticleId,
    pub photo: PhotoAttachment,
}

impl ArticlePhotoReport {
    pub fn new(article_id: ArticleId) -> Self {
        Self {
            photo_report_id: Uuid::new_v4(),
            article_id,
            photo: PhotoAttachment::none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Announcement, Event, EventKind};
    use crate::model::ValidationError;
    use uuid::Uuid;

    #[test]
    fn event_kind_db_mapping_roundtrips() {
        for kind in [
            EventKind::Common,
            EventKind::Professional,
            EventKind::Personal,
            EventKind::University,
        ] {
            assert_eq!(EventKind::parse(kind.as_db_str()), Some(kind));
        }
        assert_eq!(EventKind::parse("weekend"), None);
    }

    #[test]
    fn event_requires_a_name() {
        let event = Event::new("   ", 0);
        assert!(matches!(
            event.validate().unwrap_err(),
            ValidationError::EmptyField { field: "name", .. }
        ));
    }

    #[test]
    fn announcement_content_is_capped() {
        let mut announcement = Announcement::new("open day", Uuid::new_v4());
        announcement.content = "x".repeat(201);
        assert!(matches!(
            announcement.validate().unwrap_err(),
            ValidationError::TooLong {
                field: "content",
                ..
            }
        ));
    }
}
