use chrono::{DateTime, NaiveDate, Utc};
use shelf_common::{ProjectId, UserId};

use crate::domain::event::{Event, EventKind};

/// Selection of events for the statistic queries
#[derive(Debug, Clone, PartialEq)]
pub struct EventFilter {
    pub kind: EventKind,
    pub owner_id: UserId,
    pub project_id: Option<ProjectId>,
    /// Inclusive lower bound, `None` means since the beginning of time
    pub since: Option<DateTime<Utc>>,
    /// Inclusive upper bound
    pub until: DateTime<Utc>,
}

impl EventFilter {
    /// Every event of the given kind about the owner, up to `until`
    pub fn new(kind: EventKind, owner_id: UserId, until: DateTime<Utc>) -> Self {
        Self {
            kind,
            owner_id,
            project_id: None,
            since: None,
            until,
        }
    }

    pub fn since(mut self, since: Option<DateTime<Utc>>) -> Self {
        self.since = since;
        self
    }

    pub fn project(mut self, project_id: Option<ProjectId>) -> Self {
        self.project_id = project_id;
        self
    }

    /// In-process evaluation, used by stores without a query engine
    pub fn matches(&self, event: &Event) -> bool {
        event.kind() == self.kind
            && event.owner_id == self.owner_id
            && self
                .project_id
                .is_none_or(|id| event.target.project_id() == Some(id))
            && self.since.is_none_or(|since| event.created_at >= since)
            && event.created_at <= self.until
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventCounts {
    pub total: i64,
    pub unique_visitors: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyCount {
    pub day: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectCount {
    pub project_id: ProjectId,
    pub project_title: String,
    pub count: i64,
}
