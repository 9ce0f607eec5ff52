use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shelf_common::{ProjectId, UserId};
use uuid::Uuid;

use crate::domain::project::{
    Media, MediaType, NewMedia, Outcome, Project, ProjectChanges, ProjectDraft, TimelineEntry,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRequest {
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub url: String,
    #[serde(default)]
    pub caption: Option<String>,
    /// Position in the gallery, defaults to the position in the request
    #[serde(default)]
    pub order: Option<i32>,
}

fn into_media(items: Vec<MediaRequest>) -> Vec<NewMedia> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| NewMedia {
            media_type: item.media_type,
            url: item.url,
            caption: item.caption,
            order: item.order.unwrap_or(index as i32),
        })
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub timeline: Vec<TimelineEntry>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub outcomes: Vec<Outcome>,
    #[serde(default)]
    pub media: Vec<MediaRequest>,
}

impl From<CreateProjectRequest> for ProjectDraft {
    fn from(value: CreateProjectRequest) -> Self {
        Self {
            title: value.title,
            description: value.description,
            slug: value.slug,
            content: value.content,
            cover_image: value.cover_image,
            timeline: value.timeline,
            technologies: value.technologies,
            outcomes: value.outcomes,
            media: into_media(value.media),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateProjectRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub cover_image: Option<String>,
    pub timeline: Option<Vec<TimelineEntry>>,
    pub technologies: Option<Vec<String>>,
    pub outcomes: Option<Vec<Outcome>>,
    pub media: Option<Vec<MediaRequest>>,
}

impl From<UpdateProjectRequest> for ProjectChanges {
    fn from(value: UpdateProjectRequest) -> Self {
        Self {
            title: value.title,
            description: value.description,
            content: value.content,
            cover_image: value.cover_image,
            timeline: value.timeline,
            technologies: value.technologies,
            outcomes: value.outcomes,
            media: value.media.map(into_media),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaResponse {
    id: Uuid,
    #[serde(rename = "type")]
    media_type: MediaType,
    url: String,
    caption: Option<String>,
    order: i32,
}

impl From<&Media> for MediaResponse {
    fn from(value: &Media) -> Self {
        Self {
            id: value.id,
            media_type: value.media_type,
            url: value.url.clone(),
            caption: value.caption.clone(),
            order: value.order,
        }
    }
}

/// Project as returned to owners and, once published, to everyone
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    id: ProjectId,
    user_id: UserId,
    title: String,
    description: String,
    slug: String,
    content: Option<String>,
    cover_image: Option<String>,
    timeline: Vec<TimelineEntry>,
    technologies: Vec<String>,
    outcomes: Vec<Outcome>,
    media: Vec<MediaResponse>,
    is_published: bool,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&Project> for ProjectResponse {
    fn from(value: &Project) -> Self {
        Self {
            id: value.id,
            user_id: value.owner_id,
            title: value.title.clone(),
            description: value.description.clone(),
            slug: value.slug.to_string(),
            content: value.content.clone(),
            cover_image: value.cover_image.clone(),
            timeline: value.timeline.clone(),
            technologies: value.technologies.clone(),
            outcomes: value.outcomes.clone(),
            media: value.media.iter().map(MediaResponse::from).collect(),
            is_published: value.is_published(),
            published_at: value.publication.published_at(),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}
