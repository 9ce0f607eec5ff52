use std::{fmt::Debug, future::Future};

use chrono::{DateTime, FixedOffset, Utc};
use shelf_common::{Email, ProjectId, UserId, Username};

use crate::domain::{
    event::{Event, NewEvent},
    project::{Project, PublicationState},
    repository::query::{DailyCount, EventCounts, EventFilter, ProjectCount},
    user::{NewUser, PortfolioSummary, User},
};

pub mod query;

pub trait UserRepository: Send + Sync + 'static {
    /// Create a user, failing with `UniqueViolation` on a taken username or email
    fn create_user(
        &self,
        user: NewUser,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<User, RepositoryError>> + Send;

    fn find_user(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;

    fn find_user_by_username(
        &self,
        username: &Username,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;

    fn find_user_by_email(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Persist role and profile fields
    fn update_user(&self, user: &User) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Users owning at least one published project
    fn published_portfolios(
        &self,
    ) -> impl Future<Output = Result<Vec<PortfolioSummary>, RepositoryError>> + Send;
}

pub trait ProjectRepository: Send + Sync + 'static {
    /// Insert a new project with its media, failing with `UniqueViolation` on a taken slug
    fn insert_project(
        &self,
        project: &Project,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Find single project with its media
    fn find_project(
        &self,
        id: ProjectId,
    ) -> impl Future<Output = Result<Option<Project>, RepositoryError>> + Send;

    /// Projects of one owner, newest first
    fn projects_of(
        &self,
        owner_id: UserId,
        published_only: bool,
    ) -> impl Future<Output = Result<Vec<Project>, RepositoryError>> + Send;

    /// Persist editable fields and replace the media list. Publication state is not touched.
    fn save_project(
        &self,
        project: &Project,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Write `is_published` and `published_at` together in one atomic step
    fn set_publication(
        &self,
        id: ProjectId,
        state: PublicationState,
        updated_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn delete_project(
        &self,
        id: ProjectId,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// Append only store of view events
pub trait EventRepository: Send + Sync + 'static {
    fn append(
        &self,
        event: NewEvent,
    ) -> impl Future<Output = Result<Event, RepositoryError>> + Send;

    /// Total events and distinct non anonymous visitors
    fn count(
        &self,
        filter: &EventFilter,
    ) -> impl Future<Output = Result<EventCounts, RepositoryError>> + Send;

    /// Events per calendar day in the given time zone, ascending, days without events omitted
    fn daily_counts(
        &self,
        filter: &EventFilter,
        offset: FixedOffset,
    ) -> impl Future<Output = Result<Vec<DailyCount>, RepositoryError>> + Send;

    /// Events per existing project, in any order
    fn project_counts(
        &self,
        filter: &EventFilter,
    ) -> impl Future<Output = Result<Vec<ProjectCount>, RepositoryError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    NotFound,
    ValidationFailed(String),
    UniqueViolation(String),
    Timeout,
    DatabaseError(String),
}
