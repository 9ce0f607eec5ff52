use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::domain::AppState;
use crate::domain::lifecycle::ProjectLifecycle;
use crate::infrastructure::http::api::{ApiError, ApiSuccess};
use crate::infrastructure::http::handlers::parse_project_id;
use crate::infrastructure::http::identity::Caller;

pub use dto::ProjectResponse;
use dto::{CreateProjectRequest, UpdateProjectRequest};

mod dto;

pub async fn create_project<S: AppState>(
    State(state): State<S>,
    Caller(caller): Caller,
    Json(body): Json<CreateProjectRequest>,
) -> Result<ApiSuccess<ProjectResponse>, ApiError> {
    let project = ProjectLifecycle::new(state.content(), state.clock())
        .create(caller, body.into())
        .await?;
    Ok(ApiSuccess::new(StatusCode::CREATED, ProjectResponse::from(&project)))
}

pub async fn list_projects<S: AppState>(
    State(state): State<S>,
    Caller(caller): Caller,
) -> Result<ApiSuccess<Vec<ProjectResponse>>, ApiError> {
    let projects = ProjectLifecycle::new(state.content(), state.clock())
        .list_owned(caller)
        .await?;
    Ok(ApiSuccess::ok(projects.iter().map(ProjectResponse::from).collect()))
}

pub async fn get_project<S: AppState>(
    State(state): State<S>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> Result<ApiSuccess<ProjectResponse>, ApiError> {
    let project = ProjectLifecycle::new(state.content(), state.clock())
        .get_owned(caller, parse_project_id(&id)?)
        .await?;
    Ok(ApiSuccess::ok(ProjectResponse::from(&project)))
}

pub async fn update_project<S: AppState>(
    State(state): State<S>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    Json(body): Json<UpdateProjectRequest>,
) -> Result<ApiSuccess<ProjectResponse>, ApiError> {
    let project = ProjectLifecycle::new(state.content(), state.clock())
        .save(caller, parse_project_id(&id)?, body.into())
        .await?;
    Ok(ApiSuccess::ok(ProjectResponse::from(&project)))
}

pub async fn delete_project<S: AppState>(
    State(state): State<S>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ProjectLifecycle::new(state.content(), state.clock())
        .delete(caller, parse_project_id(&id)?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn publish_project<S: AppState>(
    State(state): State<S>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> Result<ApiSuccess<ProjectResponse>, ApiError> {
    let project = ProjectLifecycle::new(state.content(), state.clock())
        .publish(caller, parse_project_id(&id)?)
        .await?;
    Ok(ApiSuccess::ok(ProjectResponse::from(&project)))
}

pub async fn unpublish_project<S: AppState>(
    State(state): State<S>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> Result<ApiSuccess<ProjectResponse>, ApiError> {
    let project = ProjectLifecycle::new(state.content(), state.clock())
        .unpublish(caller, parse_project_id(&id)?)
        .await?;
    Ok(ApiSuccess::ok(ProjectResponse::from(&project)))
}
