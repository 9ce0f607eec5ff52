use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
};

use chrono::{DateTime, Duration, FixedOffset, Utc};
use itertools::Itertools;
use shelf_common::{Email, ProjectId, UserId, Username};
use tokio::sync::RwLock;

use crate::domain::{
    Clock,
    event::{Event, NewEvent},
    project::{Project, PublicationState},
    repository::{
        EventRepository, ProjectRepository, RepositoryError, UserRepository,
        query::{DailyCount, EventCounts, EventFilter, ProjectCount},
    },
    user::{NewUser, PortfolioSummary, User},
};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    projects: Vec<Project>,
    events: Vec<Event>,
}

/// Storage kept in process memory, selected with `storage: memory`.
/// Enforces the same uniqueness rules as the relational schema.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for MemoryStore {
    async fn create_user(
        &self,
        user: NewUser,
        now: DateTime<Utc>,
    ) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(RepositoryError::UniqueViolation(
                "username already taken".to_string(),
            ));
        }
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::UniqueViolation(
                "email already registered".to_string(),
            ));
        }

        let user = User {
            id: UserId::generate(),
            username: user.username,
            email: user.email,
            name: user.name,
            bio: None,
            avatar_url: None,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| &u.username == username).cloned())
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| &u.email == email).cloned())
    }

    async fn update_user(&self, user: &User) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(RepositoryError::NotFound)?;
        stored.name = user.name.clone();
        stored.bio = user.bio.clone();
        stored.avatar_url = user.avatar_url.clone();
        stored.role = user.role;
        stored.updated_at = user.updated_at;
        Ok(())
    }

    async fn published_portfolios(&self) -> Result<Vec<PortfolioSummary>, RepositoryError> {
        let tables = self.tables.read().await;
        let published = tables
            .projects
            .iter()
            .filter(|p| p.is_published())
            .map(|p| p.owner_id)
            .counts();

        Ok(tables
            .users
            .iter()
            .filter_map(|user| {
                published.get(&user.id).map(|count| PortfolioSummary {
                    user: user.clone(),
                    published_projects: *count as i64,
                })
            })
            .sorted_by(|a, b| a.user.username.cmp(&b.user.username))
            .collect())
    }
}

impl ProjectRepository for MemoryStore {
    async fn insert_project(&self, project: &Project) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.projects.iter().any(|p| p.slug == project.slug) {
            return Err(RepositoryError::UniqueViolation(format!(
                "slug '{}' already taken",
                project.slug
            )));
        }
        tables.projects.push(project.clone());
        Ok(())
    }

    async fn find_project(&self, id: ProjectId) -> Result<Option<Project>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn projects_of(
        &self,
        owner_id: UserId,
        published_only: bool,
    ) -> Result<Vec<Project>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .projects
            .iter()
            .rev()
            .filter(|p| p.owner_id == owner_id && (!published_only || p.is_published()))
            .sorted_by(|a, b| b.created_at.cmp(&a.created_at))
            .cloned()
            .collect())
    }

    async fn save_project(&self, project: &Project) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .projects
            .iter_mut()
            .find(|p| p.id == project.id)
            .ok_or(RepositoryError::NotFound)?;
        let publication = stored.publication;
        let slug = stored.slug.clone();
        *stored = Project {
            publication,
            slug,
            ..project.clone()
        };
        Ok(())
    }

    async fn set_publication(
        &self,
        id: ProjectId,
        state: PublicationState,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepositoryError::NotFound)?;
        stored.publication = state;
        stored.updated_at = updated_at;
        Ok(())
    }

    async fn delete_project(&self, id: ProjectId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let before = tables.projects.len();
        tables.projects.retain(|p| p.id != id);
        if tables.projects.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

impl EventRepository for MemoryStore {
    async fn append(&self, event: NewEvent) -> Result<Event, RepositoryError> {
        let event = Event::from(event);
        self.tables.write().await.events.push(event.clone());
        Ok(event)
    }

    async fn count(&self, filter: &EventFilter) -> Result<EventCounts, RepositoryError> {
        let tables = self.tables.read().await;
        let matching: Vec<&Event> = tables.events.iter().filter(|e| filter.matches(e)).collect();
        let visitors: HashSet<UserId> = matching.iter().filter_map(|e| e.visitor_id).collect();

        Ok(EventCounts {
            total: matching.len() as i64,
            unique_visitors: visitors.len() as i64,
        })
    }

    async fn daily_counts(
        &self,
        filter: &EventFilter,
        offset: FixedOffset,
    ) -> Result<Vec<DailyCount>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .events
            .iter()
            .filter(|e| filter.matches(e))
            .map(|e| e.created_at.with_timezone(&offset).date_naive())
            .counts()
            .into_iter()
            .map(|(day, count)| DailyCount {
                day,
                count: count as i64,
            })
            .sorted_by_key(|d| d.day)
            .collect())
    }

    async fn project_counts(
        &self,
        filter: &EventFilter,
    ) -> Result<Vec<ProjectCount>, RepositoryError> {
        let tables = self.tables.read().await;
        let counts = tables
            .events
            .iter()
            .filter(|e| filter.matches(e))
            .filter_map(|e| e.target.project_id())
            .counts();

        // events of deleted projects drop out
        Ok(tables
            .projects
            .iter()
            .filter_map(|p| {
                counts.get(&p.id).map(|count| ProjectCount {
                    project_id: p.id,
                    project_title: p.title.clone(),
                    count: *count as i64,
                })
            })
            .collect())
    }
}

/// Event store that is always down, for exercising the degraded paths
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingEventStore;

impl FailingEventStore {
    fn unavailable<T>() -> Result<T, RepositoryError> {
        Err(RepositoryError::DatabaseError(
            "event store unavailable".to_string(),
        ))
    }
}

impl EventRepository for FailingEventStore {
    async fn append(&self, _event: NewEvent) -> Result<Event, RepositoryError> {
        Self::unavailable()
    }

    async fn count(&self, _filter: &EventFilter) -> Result<EventCounts, RepositoryError> {
        Self::unavailable()
    }

    async fn daily_counts(
        &self,
        _filter: &EventFilter,
        _offset: FixedOffset,
    ) -> Result<Vec<DailyCount>, RepositoryError> {
        Self::unavailable()
    }

    async fn project_counts(
        &self,
        _filter: &EventFilter,
    ) -> Result<Vec<ProjectCount>, RepositoryError> {
        Self::unavailable()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
