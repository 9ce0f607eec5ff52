use axum::http::{HeaderMap, StatusCode, header};
use shelf_common::ProjectId;

use crate::domain::AppState;
use crate::domain::event::EventMetadata;
use crate::domain::recorder::{EventRecorder, RecordPolicy};
use crate::infrastructure::http::api::ApiError;

pub mod analytics;
pub mod portfolio;
pub mod projects;
pub mod users;

// health check handler
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Project ids come from the path, an id that does not parse names no project
pub(crate) fn parse_project_id(value: &str) -> Result<ProjectId, ApiError> {
    ProjectId::try_from(value).map_err(|_| ApiError::NotFound)
}

pub(crate) fn event_metadata(
    headers: &HeaderMap,
    extra: Option<serde_json::Value>,
) -> EventMetadata {
    let referrer = headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string);
    EventMetadata { referrer, extra }
}

pub(crate) fn recorder<S: AppState>(state: &S) -> EventRecorder<'_, S::C, S::E, S::K> {
    EventRecorder::new(
        state.content(),
        state.events(),
        state.clock(),
        RecordPolicy {
            count_owner_views: state.analytics().count_owner_views,
        },
    )
}
