use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shelf_common::{EventId, ProjectId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    PortfolioVisit,
    ProjectView,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::PortfolioVisit => "PORTFOLIO_VISIT",
            EventKind::ProjectView => "PROJECT_VIEW",
        }
    }

    /// Parses the dashed form used in URLs, e.g. `project-view`
    pub fn from_path(segment: &str) -> Option<Self> {
        match segment {
            "portfolio-visit" => Some(EventKind::PortfolioVisit),
            "project-view" => Some(EventKind::ProjectView),
            _ => None,
        }
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PORTFOLIO_VISIT" => Ok(EventKind::PortfolioVisit),
            "PROJECT_VIEW" => Ok(EventKind::ProjectView),
            other => Err(format!("unknown event kind {}", other)),
        }
    }
}

/// What was looked at. The kind of an event follows from its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTarget {
    Portfolio,
    Project(ProjectId),
}

impl EventTarget {
    pub fn kind(&self) -> EventKind {
        match self {
            EventTarget::Portfolio => EventKind::PortfolioVisit,
            EventTarget::Project(_) => EventKind::ProjectView,
        }
    }

    pub fn project_id(&self) -> Option<ProjectId> {
        match self {
            EventTarget::Portfolio => None,
            EventTarget::Project(id) => Some(*id),
        }
    }

    /// Rebuilds the target from the persisted `kind` / `project_id` pair
    pub fn from_columns(kind: EventKind, project_id: Option<ProjectId>) -> Result<Self, String> {
        match (kind, project_id) {
            (EventKind::PortfolioVisit, _) => Ok(EventTarget::Portfolio),
            (EventKind::ProjectView, Some(id)) => Ok(EventTarget::Project(id)),
            (EventKind::ProjectView, None) => Err("project view without project".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventMetadata {
    pub referrer: Option<String>,
    pub extra: Option<serde_json::Value>,
}

/// Event about to be appended
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub owner_id: UserId,
    pub target: EventTarget,
    pub visitor_id: Option<UserId>,
    pub metadata: EventMetadata,
    pub occurred_at: DateTime<Utc>,
}

/// Immutable record of one recorded access
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: EventId,
    /// Owner of the visited portfolio or project
    pub owner_id: UserId,
    pub target: EventTarget,
    /// `None` for anonymous visitors
    pub visitor_id: Option<UserId>,
    pub metadata: EventMetadata,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        self.target.kind()
    }
}

impl From<NewEvent> for Event {
    fn from(value: NewEvent) -> Self {
        Self {
            id: EventId::generate(),
            owner_id: value.owner_id,
            target: value.target,
            visitor_id: value.visitor_id,
            metadata: value.metadata,
            created_at: value.occurred_at,
        }
    }
}
