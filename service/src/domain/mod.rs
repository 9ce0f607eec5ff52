use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::domain::repository::{EventRepository, ProjectRepository, UserRepository};

pub mod accounts;
pub mod analytics;
pub mod error;
pub mod event;
pub mod lifecycle;
pub mod project;
pub mod recorder;
pub mod repository;
pub mod user;
pub mod visibility;

/// Source of the current time, injected so that tests can pin it
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Analytics behaviour chosen by the operator
#[derive(Debug, Clone, Copy)]
pub struct AnalyticsOptions {
    /// Record views of owners looking at their own content.
    /// Off by default: self views are suppressed.
    pub count_owner_views: bool,
    /// Reference time zone for day buckets
    pub utc_offset: FixedOffset,
}

impl Default for AnalyticsOptions {
    fn default() -> Self {
        Self {
            count_owner_views: false,
            utc_offset: Utc.fix(),
        }
    }
}

/// The global application state shared between all request handlers.
pub trait AppState: Clone + Send + Sync + 'static {
    /// Users, projects and media
    type C: UserRepository + ProjectRepository;
    /// View events
    type E: EventRepository;
    type K: Clock;

    fn content(&self) -> &Self::C;
    fn events(&self) -> &Self::E;
    fn clock(&self) -> &Self::K;
    fn analytics(&self) -> &AnalyticsOptions;
}
