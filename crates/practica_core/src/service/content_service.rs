//! Content use-case service.
//!
//! # Responsibility
//! - Provide save/get/list/delete entry points for the content entities.
//! - Run photo normalization before every photo-bearing save.
//!
//! # Invariants
//! - Save semantics are upsert-by-id: an existing row is updated, a new row
//!   inserted.
//! - Service APIs never bypass repository validation contracts.

use crate::media::{normalize_photo, PhotoError};
use crate::model::content::{
    Achievement, AchievementId, Announcement, AnnouncementId, Article, ArticleId,
    ArticlePhotoReport, Event, EventId, HelpItem, HelpItemId, PhotoReportId,
};
use crate::model::person::PersonId;
use crate::model::ValidationError;
use crate::repo::content_repo::ContentRepository;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for content use-cases.
#[derive(Debug)]
pub enum ContentServiceError {
    Validation(ValidationError),
    Photo(PhotoError),
    Repo(RepoError),
}

impl Display for ContentServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Photo(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ContentServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Photo(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<PhotoError> for ContentServiceError {
    fn from(value: PhotoError) -> Self {
        Self::Photo(value)
    }
}

impl From<RepoError> for ContentServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

/// Content facade over a repository implementation.
pub struct ContentService<R: ContentRepository> {
    repo: R,
}

impl<R: ContentRepository> ContentService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Saves an event, re-deriving its photo payload first.
    pub fn save_event(&self, event: &mut Event) -> Result<(), ContentServiceError> {
        normalize_photo(&mut event.photo)?;
        if self.repo.get_event(event.event_id)?.is_some() {
            self.repo.update_event(event)?;
        } else {
            self.repo.create_event(event)?;
        }
        Ok(())
    }

    /// Saves an article. On first insert the storage-assigned release date
    /// is read back into the model.
    pub fn save_article(&self, article: &mut Article) -> Result<(), ContentServiceError> {
        if self.repo.get_article(article.article_id)?.is_some() {
            self.repo.update_article(article)?;
        } else {
            self.repo.create_article(article)?;
            if let Some(stored) = self.repo.get_article(article.article_id)? {
                article.release_date = stored.release_date;
            }
        }
        Ok(())
    }

    pub fn save_announcement(
        &self,
        announcement: &Announcement,
    ) -> Result<(), ContentServiceError> {
        if self
            .repo
            .get_announcement(announcement.announcement_id)?
            .is_some()
        {
            self.repo.update_announcement(announcement)?;
        } else {
            self.repo.create_announcement(announcement)?;
        }
        Ok(())
    }

    pub fn save_help_item(&self, item: &HelpItem) -> Result<(), ContentServiceError> {
        if self.repo.get_help_item(item.help_item_id)?.is_some() {
            self.repo.update_help_item(item)?;
        } else {
            self.repo.create_help_item(item)?;
        }
        Ok(())
    }

    /// Saves an achievement, re-deriving its photo payload first.
    pub fn save_achievement(
        &self,
        achievement: &mut Achievement,
    ) -> Result<(), ContentServiceError> {
        normalize_photo(&mut achievement.photo)?;
        if self.repo.get_achievement(achievement.achievement_id)?.is_some() {
            self.repo.update_achievement(achievement)?;
        } else {
            self.repo.create_achievement(achievement)?;
        }
        Ok(())
    }

    /// Saves an article photo report, re-deriving its photo payload first.
    pub fn save_photo_report(
        &self,
        report: &mut ArticlePhotoReport,
    ) -> Result<(), ContentServiceError> {
        normalize_photo(&mut report.photo)?;
        if self.repo.get_photo_report(report.photo_report_id)?.is_some() {
            self.repo.update_photo_report(report)?;
        } else {
            self.repo.create_photo_report(report)?;
        }
        Ok(())
    }

    pub fn get_event(&self, event_id: EventId) -> Result<Option<Event>, ContentServiceError> {
        Ok(self.repo.get_event(event_id)?)
    }

    pub fn list_events(&self) -> Result<Vec<Event>, ContentServiceError> {
        Ok(self.repo.list_events()?)
    }

    pub fn delete_event(&self, event_id: EventId) -> Result<(), ContentServiceError> {
        Ok(self.repo.delete_event(event_id)?)
    }

    pub fn get_article(
        &self,
        article_id: ArticleId,
    ) -> Result<Option<Article>, ContentServiceError> {
        Ok(self.repo.get_article(article_id)?)
    }

    pub fn list_articles(&self) -> Result<Vec<Article>, ContentServiceError> {
        Ok(self.repo.list_articles()?)
    }

    pub fn delete_article(&self, article_id: ArticleId) -> Result<(), ContentServiceError> {
        Ok(self.repo.delete_article(article_id)?)
    }

    pub fn get_announcement(
        &self,
        announcement_id: AnnouncementId,
    ) -> Result<Option<Announcement>, ContentServiceError> {
        Ok(self.repo.get_announcement(announcement_id)?)
    }

    pub fn list_announcements(&self) -> Result<Vec<Announcement>, ContentServiceError> {
        Ok(self.repo.list_announcements()?)
    }

    pub fn delete_announcement(
        &self,
        announcement_id: AnnouncementId,
    ) -> Result<(), ContentServiceError> {
        Ok(self.repo.delete_announcement(announcement_id)?)
    }

    pub fn get_help_item(
        &self,
        help_item_id: HelpItemId,
    ) -> Result<Option<HelpItem>, ContentServiceError> {
        Ok(self.repo.get_help_item(help_item_id)?)
    }

    pub fn list_help_items(&self) -> Result<Vec<HelpItem>, ContentServiceError> {
        Ok(self.repo.list_help_items()?)
    }

    pub fn delete_help_item(&self, help_item_id: HelpItemId) -> Result<(), ContentServiceError> {
        Ok(self.repo.delete_help_item(help_item_id)?)
    }

    pub fn get_achievement(
        &self,
        achievement_id: AchievementId,
    ) -> Result<Option<Achievement>, ContentServiceError> {
        Ok(self.repo.get_achievement(achievement_id)?)
    }

    pub fn list_achievements_for_expert(
        &self,
        expert_id: PersonId,
    ) -> Result<Vec<Achievement>, ContentServiceError> {
        Ok(self.repo.list_achievements_for_expert(expert_id)?)
    }

    pub fn delete_achievement(
        &self,
        achievement_id: AchievementId,
    ) -> Result<(), ContentServiceError> {
        Ok(self.repo.delete_achievement(achievement_id)?)
    }

    pub fn get_photo_report(
        &self,
        photo_report_id: PhotoReportId,
    ) -> Result<Option<ArticlePhotoReport>, ContentServiceError> {
        Ok(self.repo.get_photo_report(photo_report_id)?)
    }

    pub fn list_photo_reports_for_article(
        &self,
        article_id: ArticleId,
    ) -> Result<Vec<ArticlePhotoReport>, ContentServiceError> {
        Ok(self.repo.list_photo_reports_for_article(article_id)?)
    }

    pub fn delete_photo_report(
        &self,
        photo_report_id: PhotoReportId,
    ) -> Result<(), ContentServiceError> {
        Ok(self.repo.delete_photo_report(photo_report_id)?)
    }
}
