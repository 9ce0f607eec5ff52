use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shelf_common::{EventId, ProjectId};

use crate::domain::{
    analytics::Stats,
    recorder::{RecordOutcome, SuppressReason},
    repository::query::{DailyCount, ProjectCount},
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsParams {
    pub period: Option<String>,
    pub project_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCountResponse {
    day: NaiveDate,
    count: i64,
}

impl From<&DailyCount> for DailyCountResponse {
    fn from(value: &DailyCount) -> Self {
        Self {
            day: value.day,
            count: value.count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCountResponse {
    project_id: ProjectId,
    project_title: String,
    count: i64,
}

impl From<&ProjectCount> for ProjectCountResponse {
    fn from(value: &ProjectCount) -> Self {
        Self {
            project_id: value.project_id,
            project_title: value.project_title.clone(),
            count: value.count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectViewStatsResponse {
    total: i64,
    unique_viewers: i64,
    daily_views: Vec<DailyCountResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_breakdown: Option<Vec<ProjectCountResponse>>,
}

impl From<&Stats> for ProjectViewStatsResponse {
    fn from(value: &Stats) -> Self {
        Self {
            total: value.total,
            unique_viewers: value.unique_actors,
            daily_views: value.daily.iter().map(DailyCountResponse::from).collect(),
            project_breakdown: value
                .breakdown
                .as_ref()
                .map(|b| b.iter().map(ProjectCountResponse::from).collect()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioVisitStatsResponse {
    total: i64,
    unique_visitors: i64,
    daily_visits: Vec<DailyCountResponse>,
}

impl From<&Stats> for PortfolioVisitStatsResponse {
    fn from(value: &Stats) -> Self {
        Self {
            total: value.total,
            unique_visitors: value.unique_actors,
            daily_visits: value.daily.iter().map(DailyCountResponse::from).collect(),
        }
    }
}

/// Explicit tracking call. The subject is named by username (or email) or by id.
/// The visitor may be named in the body when the request carries no identity.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackRequest {
    pub username: Option<String>,
    pub user_id: Option<String>,
    pub project_id: Option<String>,
    #[serde(alias = "viewerId", alias = "visitorIdentity")]
    pub visitor_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackResponse {
    recorded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    event_id: Option<EventId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    suppressed: Option<&'static str>,
}

impl From<&RecordOutcome> for TrackResponse {
    fn from(value: &RecordOutcome) -> Self {
        match value {
            RecordOutcome::Recorded(event) => Self {
                recorded: true,
                event_id: Some(event.id),
                suppressed: None,
            },
            RecordOutcome::Suppressed(reason) => Self {
                recorded: false,
                event_id: None,
                suppressed: Some(match reason {
                    SuppressReason::OwnerView => "owner-view",
                    SuppressReason::StorageUnavailable => "storage-unavailable",
                    SuppressReason::Rejected => "rejected",
                }),
            },
        }
    }
}
