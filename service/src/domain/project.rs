use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shelf_common::{ProjectId, Slug, UserId};
use uuid::Uuid;

use crate::domain::error::ServiceError;

/// Publication state of a project.
///
/// `Unpublished` keeps the time of the last publication, so the
/// `published_at` column is never reset by an unpublish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicationState {
    /// Never published
    Draft,

    /// Visible to everyone
    Published { published_at: DateTime<Utc> },

    /// Hidden again after having been published
    Unpublished { last_published_at: DateTime<Utc> },
}

impl PublicationState {
    /// Rebuild the state from the persisted `is_published` / `published_at` pair
    pub fn from_columns(
        is_published: bool,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<Self, String> {
        match (is_published, published_at) {
            (true, Some(published_at)) => Ok(Self::Published { published_at }),
            (false, Some(last_published_at)) => Ok(Self::Unpublished { last_published_at }),
            (false, None) => Ok(Self::Draft),
            (true, None) => Err("published project without publication time".to_string()),
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published { .. })
    }

    /// Most recent publication time, kept across unpublish
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Draft => None,
            Self::Published { published_at } => Some(*published_at),
            Self::Unpublished { last_published_at } => Some(*last_published_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub date: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    #[serde(default)]
    pub metric: Option<String>,
    #[serde(default)]
    pub testimonial: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "IMAGE",
            MediaType::Video => "VIDEO",
        }
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IMAGE" => Ok(MediaType::Image),
            "VIDEO" => Ok(MediaType::Video),
            other => Err(format!("unknown media type {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    pub id: Uuid,
    pub media_type: MediaType,
    pub url: String,
    pub caption: Option<String>,
    pub order: i32,
}

/// Media item as submitted by the editor, before it gets an id
#[derive(Debug, Clone)]
pub struct NewMedia {
    pub media_type: MediaType,
    pub url: String,
    pub caption: Option<String>,
    pub order: i32,
}

impl From<NewMedia> for Media {
    fn from(value: NewMedia) -> Self {
        Self {
            id: Uuid::new_v4(),
            media_type: value.media_type,
            url: value.url,
            caption: value.caption,
            order: value.order,
        }
    }
}

/// A case study owned by exactly one user
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: ProjectId,
    pub owner_id: UserId,
    pub title: String,
    pub description: String,
    pub slug: Slug,
    pub content: Option<String>,
    pub cover_image: Option<String>,
    pub timeline: Vec<TimelineEntry>,
    pub technologies: Vec<String>,
    pub outcomes: Vec<Outcome>,
    /// Gallery, always kept sorted by `order`
    pub media: Vec<Media>,
    pub publication: PublicationState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn is_published(&self) -> bool {
        self.publication.is_published()
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.owner_id == user_id
    }

    /// DRAFT | UNPUBLISHED -> PUBLISHED, stamping the publication time
    pub fn publish(&mut self, now: DateTime<Utc>) -> Result<(), ServiceError> {
        match self.publication {
            PublicationState::Draft | PublicationState::Unpublished { .. } => {
                self.publication = PublicationState::Published { published_at: now };
                self.updated_at = now;
                Ok(())
            }
            PublicationState::Published { .. } => Err(ServiceError::Conflict(
                "project is already published".to_string(),
            )),
        }
    }

    /// PUBLISHED -> UNPUBLISHED, keeping the publication time
    pub fn unpublish(&mut self, now: DateTime<Utc>) -> Result<(), ServiceError> {
        match self.publication {
            PublicationState::Published { published_at } => {
                self.publication = PublicationState::Unpublished {
                    last_published_at: published_at,
                };
                self.updated_at = now;
                Ok(())
            }
            _ => Err(ServiceError::Conflict(
                "project is not published".to_string(),
            )),
        }
    }

    pub fn replace_media(&mut self, media: Vec<NewMedia>) {
        self.media = media.into_iter().map(Media::from).collect();
        sort_media(&mut self.media);
    }
}

/// Stable sort, items sharing an `order` keep their submission order
pub fn sort_media(media: &mut [Media]) {
    media.sort_by_key(|m| m.order);
}

/// Keeps the first occurrence of every technology, dropping blanks
pub fn normalize_technologies(technologies: Vec<String>) -> Vec<String> {
    let mut result: Vec<String> = Vec::with_capacity(technologies.len());
    for technology in technologies {
        let technology = technology.trim();
        if !technology.is_empty() && !result.iter().any(|t| t == technology) {
            result.push(technology.to_string());
        }
    }
    result
}

/// Input of the project creation
#[derive(Debug, Clone, Default)]
pub struct ProjectDraft {
    pub title: String,
    pub description: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub cover_image: Option<String>,
    pub timeline: Vec<TimelineEntry>,
    pub technologies: Vec<String>,
    pub outcomes: Vec<Outcome>,
    pub media: Vec<NewMedia>,
}

/// Editable fields of a project. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct ProjectChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub cover_image: Option<String>,
    pub timeline: Option<Vec<TimelineEntry>>,
    pub technologies: Option<Vec<String>>,
    pub outcomes: Option<Vec<Outcome>>,
    pub media: Option<Vec<NewMedia>>,
}

impl ProjectChanges {
    pub fn apply(self, project: &mut Project, now: DateTime<Utc>) -> Result<(), ServiceError> {
        if let Some(title) = self.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(ServiceError::Validation("title must not be empty".to_string()));
            }
            project.title = title.to_string();
        }
        if let Some(description) = self.description {
            project.description = description;
        }
        if let Some(content) = self.content {
            project.content = Some(content);
        }
        if let Some(cover_image) = self.cover_image {
            project.cover_image = Some(cover_image).filter(|c| !c.is_empty());
        }
        if let Some(timeline) = self.timeline {
            project.timeline = timeline;
        }
        if let Some(technologies) = self.technologies {
            project.technologies = normalize_technologies(technologies);
        }
        if let Some(outcomes) = self.outcomes {
            project.outcomes = outcomes;
        }
        if let Some(media) = self.media {
            project.replace_media(media);
        }
        project.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn draft_project() -> Project {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        Project {
            id: ProjectId::generate(),
            owner_id: UserId::generate(),
            title: "Demo".to_string(),
            description: String::new(),
            slug: Slug::try_new("demo").unwrap(),
            content: None,
            cover_image: None,
            timeline: Vec::new(),
            technologies: Vec::new(),
            outcomes: Vec::new(),
            media: Vec::new(),
            publication: PublicationState::Draft,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_publish_then_unpublish_keeps_published_at() {
        let mut project = draft_project();
        let published = project.created_at + Duration::hours(1);

        project.publish(published).unwrap();
        assert!(project.is_published());
        assert_eq!(project.publication.published_at(), Some(published));

        project.unpublish(published + Duration::hours(1)).unwrap();
        assert!(!project.is_published());
        assert_eq!(project.publication.published_at(), Some(published));
    }

    #[test]
    fn test_republish_overwrites_published_at() {
        let mut project = draft_project();
        let first = project.created_at + Duration::hours(1);
        let second = first + Duration::days(2);

        project.publish(first).unwrap();
        project.unpublish(first + Duration::hours(1)).unwrap();
        project.publish(second).unwrap();

        assert_eq!(project.publication, PublicationState::Published { published_at: second });
    }

    #[test]
    fn test_invalid_transitions_conflict() {
        let mut project = draft_project();
        assert!(matches!(project.unpublish(Utc::now()), Err(ServiceError::Conflict(_))));

        project.publish(Utc::now()).unwrap();
        assert!(matches!(project.publish(Utc::now()), Err(ServiceError::Conflict(_))));
    }

    #[test]
    fn test_state_from_columns() {
        let at = Utc::now();
        assert_eq!(PublicationState::from_columns(false, None), Ok(PublicationState::Draft));
        assert_eq!(
            PublicationState::from_columns(false, Some(at)),
            Ok(PublicationState::Unpublished { last_published_at: at })
        );
        assert!(PublicationState::from_columns(true, None).is_err());
    }

    #[test]
    fn test_changes_keep_untouched_fields() {
        let mut project = draft_project();
        project.content = Some("body".to_string());
        let now = project.created_at + Duration::minutes(5);

        let changes = ProjectChanges {
            title: Some("  Renamed ".to_string()),
            technologies: Some(vec!["Rust".into(), " ".into(), "Rust".into(), "SQL".into()]),
            ..Default::default()
        };
        changes.apply(&mut project, now).unwrap();

        assert_eq!(project.title, "Renamed");
        assert_eq!(project.content.as_deref(), Some("body"));
        assert_eq!(project.technologies, vec!["Rust", "SQL"]);
        assert_eq!(project.slug.as_ref(), "demo");
        assert_eq!(project.updated_at, now);
    }

    #[test]
    fn test_blank_title_is_rejected() {
        let mut project = draft_project();
        let changes = ProjectChanges {
            title: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            changes.apply(&mut project, Utc::now()),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn test_media_sorted_by_order() {
        let mut project = draft_project();
        let item = |url: &str, order| NewMedia {
            media_type: MediaType::Image,
            url: url.to_string(),
            caption: None,
            order,
        };
        project.replace_media(vec![item("c", 2), item("a", 0), item("b", 2)]);

        let urls: Vec<&str> = project.media.iter().map(|m| m.url.as_str()).collect();
        assert_eq!(urls, vec!["a", "c", "b"]);
    }
}
