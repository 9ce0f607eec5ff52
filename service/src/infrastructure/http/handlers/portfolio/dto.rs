use serde::Serialize;
use shelf_common::UserId;

use crate::{
    domain::{
        user::{PortfolioSummary, User},
        visibility::{PortfolioView, ProjectView},
    },
    infrastructure::http::handlers::projects::ProjectResponse,
};

/// Profile fields anyone may see
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUserResponse {
    id: UserId,
    username: String,
    name: Option<String>,
    display_name: String,
    bio: Option<String>,
    profile_image: Option<String>,
}

impl From<&User> for PublicUserResponse {
    fn from(value: &User) -> Self {
        Self {
            id: value.id,
            username: value.username.to_string(),
            name: value.name.clone(),
            display_name: value.display_name().to_string(),
            bio: value.bio.clone(),
            profile_image: value.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioResponse {
    user: PublicUserResponse,
    projects: Vec<ProjectResponse>,
    is_owner: bool,
}

impl From<&PortfolioView> for PortfolioResponse {
    fn from(value: &PortfolioView) -> Self {
        Self {
            user: PublicUserResponse::from(&value.owner),
            projects: value.projects.iter().map(ProjectResponse::from).collect(),
            is_owner: value.access.owner_request,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioProjectResponse {
    project: ProjectResponse,
    owner: PublicUserResponse,
    is_owner: bool,
}

impl From<&ProjectView> for PortfolioProjectResponse {
    fn from(value: &ProjectView) -> Self {
        Self {
            project: ProjectResponse::from(&value.project),
            owner: PublicUserResponse::from(&value.owner),
            is_owner: value.access.owner_request,
        }
    }
}

/// Entry of the explore listing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioListItem {
    id: UserId,
    username: String,
    display_name: String,
    bio: Option<String>,
    profile_image: Option<String>,
    project_count: i64,
}

impl From<&PortfolioSummary> for PortfolioListItem {
    fn from(value: &PortfolioSummary) -> Self {
        Self {
            id: value.user.id,
            username: value.user.username.to_string(),
            display_name: value.user.display_name().to_string(),
            bio: value.user.bio.clone(),
            profile_image: value.user.avatar_url.clone(),
            project_count: value.published_projects,
        }
    }
}
