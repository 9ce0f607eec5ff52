use chrono::{DateTime, Utc};
use shelf_common::{
    CREATED_FIELD_NAME, EVENT_KIND_FIELD_NAME, Email, ID_FIELD_NAME, IS_PUBLISHED_FIELD_NAME,
    METADATA_FIELD_NAME, OWNER_ID_FIELD_NAME, PROJECT_ID_FIELD_NAME, ProjectId,
    PUBLISHED_FIELD_NAME, REFERRER_FIELD_NAME, Slug, UPDATED_FIELD_NAME, USER_ID_FIELD_NAME,
    UserId, Username, VISITOR_ID_FIELD_NAME, EventId,
};
use sqlx::{Row, postgres::PgRow, types::Json};
use uuid::Uuid;

use crate::domain::{
    event::{Event, EventKind, EventMetadata, EventTarget},
    project::{Media, MediaType, Outcome, Project, PublicationState, TimelineEntry},
    repository::RepositoryError,
    user::{Role, User},
};

fn get<'r, T>(row: &'r PgRow, column: &str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column).map_err(|e| {
        RepositoryError::DatabaseError(format!("Failed to parse {}: {}", column, e))
    })
}

fn corrupt(column: &str, cause: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::DatabaseError(format!("Invalid value in {}: {}", column, cause))
}

pub fn row_to_user(row: &PgRow) -> Result<User, RepositoryError> {
    let username: String = get(row, "username")?;
    let email: String = get(row, "email")?;
    let role: String = get(row, "role")?;

    Ok(User {
        id: UserId(get(row, ID_FIELD_NAME)?),
        username: Username::try_new(username).map_err(|e| corrupt("username", e))?,
        email: Email::try_new(email).map_err(|e| corrupt("email", e))?,
        name: get(row, "name")?,
        bio: get(row, "bio")?,
        avatar_url: get(row, "avatar_url")?,
        role: role.parse::<Role>().map_err(|e| corrupt("role", e))?,
        created_at: get(row, CREATED_FIELD_NAME)?,
        updated_at: get(row, UPDATED_FIELD_NAME)?,
    })
}

/// Project without its media, see `row_to_media`
pub fn row_to_project(row: &PgRow) -> Result<Project, RepositoryError> {
    let slug: String = get(row, "slug")?;
    let is_published: bool = get(row, IS_PUBLISHED_FIELD_NAME)?;
    let published_at: Option<DateTime<Utc>> = get(row, PUBLISHED_FIELD_NAME)?;
    let Json(timeline): Json<Vec<TimelineEntry>> = get(row, "timeline")?;
    let Json(outcomes): Json<Vec<Outcome>> = get(row, "outcomes")?;

    Ok(Project {
        id: ProjectId(get(row, ID_FIELD_NAME)?),
        owner_id: UserId(get(row, USER_ID_FIELD_NAME)?),
        title: get(row, "title")?,
        description: get(row, "description")?,
        slug: Slug::try_new(slug).map_err(|e| corrupt("slug", e))?,
        content: get(row, "content")?,
        cover_image: get(row, "cover_image")?,
        timeline,
        technologies: get(row, "technologies")?,
        outcomes,
        media: Vec::new(),
        publication: PublicationState::from_columns(is_published, published_at)
            .map_err(|e| corrupt(PUBLISHED_FIELD_NAME, e))?,
        created_at: get(row, CREATED_FIELD_NAME)?,
        updated_at: get(row, UPDATED_FIELD_NAME)?,
    })
}

/// Media row together with the project it belongs to
pub fn row_to_media(row: &PgRow) -> Result<(ProjectId, Media), RepositoryError> {
    let media_type: String = get(row, "media_type")?;
    let project_id: Uuid = get(row, PROJECT_ID_FIELD_NAME)?;

    Ok((
        ProjectId(project_id),
        Media {
            id: get(row, ID_FIELD_NAME)?,
            media_type: media_type
                .parse::<MediaType>()
                .map_err(|e| corrupt("media_type", e))?,
            url: get(row, "url")?,
            caption: get(row, "caption")?,
            order: get(row, "sort_order")?,
        },
    ))
}

pub fn row_to_event(row: &PgRow) -> Result<Event, RepositoryError> {
    let kind: String = get(row, EVENT_KIND_FIELD_NAME)?;
    let kind = kind
        .parse::<EventKind>()
        .map_err(|e| corrupt(EVENT_KIND_FIELD_NAME, e))?;
    let project_id: Option<Uuid> = get(row, PROJECT_ID_FIELD_NAME)?;
    let visitor_id: Option<Uuid> = get(row, VISITOR_ID_FIELD_NAME)?;
    let metadata: Option<Json<serde_json::Value>> = get(row, METADATA_FIELD_NAME)?;

    Ok(Event {
        id: EventId(get(row, ID_FIELD_NAME)?),
        owner_id: UserId(get(row, OWNER_ID_FIELD_NAME)?),
        target: EventTarget::from_columns(kind, project_id.map(ProjectId))
            .map_err(|e| corrupt(PROJECT_ID_FIELD_NAME, e))?,
        visitor_id: visitor_id.map(UserId),
        metadata: EventMetadata {
            referrer: get(row, REFERRER_FIELD_NAME)?,
            extra: metadata.map(|Json(value)| value),
        },
        created_at: get(row, CREATED_FIELD_NAME)?,
    })
}
