use axum::extract::{Path, State};
use axum::http::HeaderMap;

use crate::domain::AppState;
use crate::domain::accounts::Accounts;
use crate::domain::recorder::ViewRequest;
use crate::domain::visibility::VisibilityResolver;
use crate::infrastructure::http::api::{ApiError, ApiSuccess};
use crate::infrastructure::http::handlers::{event_metadata, parse_project_id, recorder};
use crate::infrastructure::http::identity::Requester;
use dto::{PortfolioListItem, PortfolioProjectResponse, PortfolioResponse};

mod dto;

/// Users with at least one published project
pub async fn list_portfolios<S: AppState>(
    State(state): State<S>,
) -> Result<ApiSuccess<Vec<PortfolioListItem>>, ApiError> {
    let portfolios = Accounts::new(state.content(), state.clock())
        .published_portfolios()
        .await?;
    Ok(ApiSuccess::ok(
        portfolios.iter().map(PortfolioListItem::from).collect(),
    ))
}

pub async fn get_portfolio<S: AppState>(
    State(state): State<S>,
    Requester(requester): Requester,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> Result<ApiSuccess<PortfolioResponse>, ApiError> {
    let view = VisibilityResolver::new(state.content())
        .portfolio(&username, requester)
        .await?;

    let request = ViewRequest::portfolio_visit(view.owner.id, requester)
        .with_metadata(event_metadata(&headers, None));
    recorder(&state).record_best_effort(request).await;

    Ok(ApiSuccess::ok(PortfolioResponse::from(&view)))
}

pub async fn get_portfolio_project<S: AppState>(
    State(state): State<S>,
    Requester(requester): Requester,
    Path((username, project_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<ApiSuccess<PortfolioProjectResponse>, ApiError> {
    let project_id = parse_project_id(&project_id)?;
    let view = VisibilityResolver::new(state.content())
        .project(&username, project_id, requester)
        .await?;

    let request = ViewRequest::project_view(view.owner.id, view.project.id, requester)
        .with_metadata(event_metadata(&headers, None));
    recorder(&state).record_best_effort(request).await;

    Ok(ApiSuccess::ok(PortfolioProjectResponse::from(&view)))
}
