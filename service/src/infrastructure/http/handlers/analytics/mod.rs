use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use shelf_common::UserId;

use crate::domain::AppState;
use crate::domain::analytics::{AnalyticsAggregator, Period, StatsQuery};
use crate::domain::error::ServiceError;
use crate::domain::event::EventKind;
use crate::domain::recorder::{RecordOutcome, ViewRequest};
use crate::domain::repository::UserRepository;
use crate::domain::visibility::VisibilityResolver;
use crate::infrastructure::http::api::{ApiError, ApiSuccess};
use crate::infrastructure::http::handlers::{event_metadata, parse_project_id, recorder};
use crate::infrastructure::http::identity::{Caller, Requester};
use crate::infrastructure::http::querystring::QueryString;
use dto::{
    PortfolioVisitStatsResponse, ProjectViewStatsResponse, StatsParams, TrackRequest,
    TrackResponse,
};

mod dto;

fn period(params: &StatsParams) -> Result<Period, ServiceError> {
    params
        .period
        .as_deref()
        .map(str::parse)
        .transpose()
        .map(Option::unwrap_or_default)
}

fn aggregator<S: AppState>(state: &S) -> AnalyticsAggregator<'_, S::C, S::E, S::K> {
    AnalyticsAggregator::new(
        state.content(),
        state.events(),
        state.clock(),
        state.analytics().utc_offset,
    )
}

pub async fn project_views<S: AppState>(
    State(state): State<S>,
    Caller(caller): Caller,
    QueryString(params): QueryString<StatsParams>,
) -> Result<ApiSuccess<ProjectViewStatsResponse>, ApiError> {
    let project_id = params
        .project_id
        .as_deref()
        .map(|id| {
            parse_project_id(id)
                .map_err(|_| ApiError::UnprocessableEntity("invalid projectId".to_string()))
        })
        .transpose()?;
    let query = StatsQuery {
        kind: EventKind::ProjectView,
        project_id,
        period: period(&params)?,
    };

    let stats = aggregator(&state).query(caller, query).await?;
    Ok(ApiSuccess::ok(ProjectViewStatsResponse::from(&stats)))
}

pub async fn portfolio_visits<S: AppState>(
    State(state): State<S>,
    Caller(caller): Caller,
    QueryString(params): QueryString<StatsParams>,
) -> Result<ApiSuccess<PortfolioVisitStatsResponse>, ApiError> {
    let query = StatsQuery {
        kind: EventKind::PortfolioVisit,
        project_id: None,
        period: period(&params)?,
    };

    let stats = aggregator(&state).query(caller, query).await?;
    Ok(ApiSuccess::ok(PortfolioVisitStatsResponse::from(&stats)))
}

/// The authenticated requester wins, a body visitor only stands in for anonymous calls
fn visitor(requester: Option<UserId>, named: Option<&str>) -> Result<Option<UserId>, ApiError> {
    let named = named
        .map(|id| {
            UserId::try_from(id.trim())
                .map_err(|_| ApiError::UnprocessableEntity("invalid visitorId".to_string()))
        })
        .transpose()?;
    match (requester, named) {
        (Some(requester), Some(named)) if requester != named => Err(
            ApiError::UnprocessableEntity("visitorId does not match the caller".to_string()),
        ),
        (Some(requester), _) => Ok(Some(requester)),
        (None, named) => Ok(named),
    }
}

/// Explicit tracking used by pages that do not go through the gated routes
pub async fn track<S: AppState>(
    State(state): State<S>,
    Requester(requester): Requester,
    Path(kind): Path<String>,
    headers: HeaderMap,
    Json(body): Json<TrackRequest>,
) -> Result<ApiSuccess<TrackResponse>, ApiError> {
    let kind = EventKind::from_path(&kind).ok_or(ApiError::NotFound)?;

    let owner = match (body.username.as_deref(), body.user_id.as_deref()) {
        (Some(handle), _) => VisibilityResolver::new(state.content())
            .resolve_owner(handle)
            .await?,
        (None, Some(id)) => {
            let id = UserId::try_from(id).map_err(|_| ApiError::NotFound)?;
            state
                .content()
                .find_user(id)
                .await
                .map_err(ServiceError::from)?
                .ok_or(ApiError::NotFound)?
        }
        (None, None) => {
            return Err(ApiError::UnprocessableEntity(
                "username or userId is required".to_string(),
            ));
        }
    };

    let project_id = body.project_id.as_deref().map(parse_project_id).transpose()?;
    let visitor_id = visitor(requester, body.visitor_id.as_deref())?;
    let request = ViewRequest {
        kind,
        owner_id: owner.id,
        project_id,
        visitor_id,
        owner_request: visitor_id == Some(owner.id),
        metadata: event_metadata(&headers, body.metadata),
    };

    let outcome = recorder(&state).record(request).await?;
    let status = match outcome {
        RecordOutcome::Recorded(_) => StatusCode::CREATED,
        RecordOutcome::Suppressed(_) => StatusCode::OK,
    };
    Ok(ApiSuccess::new(status, TrackResponse::from(&outcome)))
}
