use shelf_common::{ProjectId, Slug, UserId};
use tracing::debug;

use crate::domain::{
    Clock,
    error::ServiceError,
    project::{
        Media, Project, ProjectChanges, ProjectDraft, PublicationState, normalize_technologies,
        sort_media,
    },
    repository::{ProjectRepository, UserRepository},
};

/// Owns the draft -> published -> unpublished state machine of projects.
/// Every operation acts on behalf of `actor` and only the owner may touch a project.
pub struct ProjectLifecycle<'a, C, K> {
    content: &'a C,
    clock: &'a K,
}

impl<'a, C, K> ProjectLifecycle<'a, C, K>
where
    C: UserRepository + ProjectRepository,
    K: Clock,
{
    pub fn new(content: &'a C, clock: &'a K) -> Self {
        Self { content, clock }
    }

    /// New project in the DRAFT state. Only creators may own projects.
    pub async fn create(
        &self,
        actor: UserId,
        draft: ProjectDraft,
    ) -> Result<Project, ServiceError> {
        let owner = self
            .content
            .find_user(actor)
            .await?
            .ok_or(ServiceError::Unauthorized)?;
        if !owner.is_creator() {
            return Err(ServiceError::Forbidden);
        }

        let title = draft.title.trim();
        if title.is_empty() {
            return Err(ServiceError::Validation("title is required".to_string()));
        }

        let id = ProjectId::generate();
        let slug = match draft.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(explicit) => Slug::try_new(explicit)
                .map_err(|e| ServiceError::Validation(format!("invalid slug: {}", e)))?,
            // titles without ascii letters or digits fall back to the id
            None => Slug::derive_from(title)
                .or_else(|| Slug::derive_from(&format!("project {}", id.0.simple())))
                .ok_or_else(|| {
                    ServiceError::Validation("a slug cannot be derived from the title".to_string())
                })?,
        };

        let now = self.clock.now();
        let mut media: Vec<Media> = draft.media.into_iter().map(Media::from).collect();
        sort_media(&mut media);

        let project = Project {
            id,
            owner_id: owner.id,
            title: title.to_string(),
            description: draft.description.unwrap_or_default(),
            slug,
            content: draft.content,
            cover_image: draft.cover_image.filter(|c| !c.is_empty()),
            timeline: draft.timeline,
            technologies: normalize_technologies(draft.technologies),
            outcomes: draft.outcomes,
            media,
            publication: PublicationState::Draft,
            created_at: now,
            updated_at: now,
        };

        self.content.insert_project(&project).await?;
        debug!("Project {} created by {}", project.id, actor);
        Ok(project)
    }

    /// Load a project on behalf of its owner
    pub async fn get_owned(&self, actor: UserId, id: ProjectId) -> Result<Project, ServiceError> {
        let project = self
            .content
            .find_project(id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        if !project.is_owned_by(actor) {
            return Err(ServiceError::Forbidden);
        }
        Ok(project)
    }

    /// Every project of the actor, whatever its state
    pub async fn list_owned(&self, actor: UserId) -> Result<Vec<Project>, ServiceError> {
        Ok(self.content.projects_of(actor, false).await?)
    }

    /// Edit fields in place. The publication state and the slug stay as they are.
    pub async fn save(
        &self,
        actor: UserId,
        id: ProjectId,
        changes: ProjectChanges,
    ) -> Result<Project, ServiceError> {
        let mut project = self.get_owned(actor, id).await?;
        changes.apply(&mut project, self.clock.now())?;
        self.content.save_project(&project).await?;
        Ok(project)
    }

    pub async fn publish(&self, actor: UserId, id: ProjectId) -> Result<Project, ServiceError> {
        let mut project = self.get_owned(actor, id).await?;
        let now = self.clock.now();
        project.publish(now)?;
        self.content
            .set_publication(project.id, project.publication, now)
            .await?;
        debug!("Project {} published", project.id);
        Ok(project)
    }

    pub async fn unpublish(&self, actor: UserId, id: ProjectId) -> Result<Project, ServiceError> {
        let mut project = self.get_owned(actor, id).await?;
        let now = self.clock.now();
        project.unpublish(now)?;
        self.content
            .set_publication(project.id, project.publication, now)
            .await?;
        debug!("Project {} unpublished", project.id);
        Ok(project)
    }

    /// Remove the project and its media. Recorded events are kept.
    pub async fn delete(&self, actor: UserId, id: ProjectId) -> Result<(), ServiceError> {
        let project = self.get_owned(actor, id).await?;
        self.content.delete_project(project.id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use shelf_common::{Email, Username};

    use super::*;
    use crate::{
        domain::user::{NewUser, Role, User},
        infrastructure::memory::{ManualClock, MemoryStore},
    };

    async fn user(store: &MemoryStore, clock: &ManualClock, username: &str, role: Role) -> User {
        store
            .create_user(
                NewUser {
                    username: Username::try_new(username).unwrap(),
                    email: Email::try_new(format!("{}@example.com", username)).unwrap(),
                    name: None,
                    role,
                },
                clock.now(),
            )
            .await
            .unwrap()
    }

    fn draft(title: &str) -> ProjectDraft {
        ProjectDraft {
            title: title.to_string(),
            ..Default::default()
        }
    }

    fn fixture() -> (MemoryStore, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap());
        (MemoryStore::default(), clock)
    }

    #[tokio::test]
    async fn test_create_starts_as_draft_with_derived_slug() {
        let (store, clock) = fixture();
        let alice = user(&store, &clock, "alice", Role::Creator).await;
        let lifecycle = ProjectLifecycle::new(&store, &clock);

        let project = lifecycle.create(alice.id, draft("My Demo!")).await.unwrap();

        assert_eq!(project.slug.as_ref(), "my-demo");
        assert_eq!(project.publication, PublicationState::Draft);
        assert_eq!(project.publication.published_at(), None);
    }

    #[tokio::test]
    async fn test_non_ascii_title_falls_back_to_id_slug() {
        let (store, clock) = fixture();
        let alice = user(&store, &clock, "alice", Role::Creator).await;
        let lifecycle = ProjectLifecycle::new(&store, &clock);

        let project = lifecycle.create(alice.id, draft("Проект")).await.unwrap();

        assert_eq!(project.title, "Проект");
        assert_eq!(project.slug.as_ref(), format!("project-{}", project.id.0.simple()));
    }

    #[tokio::test]
    async fn test_create_requires_creator_role() {
        let (store, clock) = fixture();
        let bob = user(&store, &clock, "bob", Role::Visitor).await;
        let lifecycle = ProjectLifecycle::new(&store, &clock);

        let result = lifecycle.create(bob.id, draft("Demo")).await;
        assert_eq!(result.unwrap_err(), ServiceError::Forbidden);
    }

    #[tokio::test]
    async fn test_slug_collision_conflicts() {
        let (store, clock) = fixture();
        let alice = user(&store, &clock, "alice", Role::Creator).await;
        let carol = user(&store, &clock, "carol", Role::Creator).await;
        let lifecycle = ProjectLifecycle::new(&store, &clock);

        lifecycle.create(alice.id, draft("Demo")).await.unwrap();
        let mut second = draft("Another");
        second.slug = Some("demo".to_string());

        let result = lifecycle.create(carol.id, second).await;
        assert!(matches!(result, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_publish_round_trip_keeps_published_at() {
        let (store, clock) = fixture();
        let alice = user(&store, &clock, "alice", Role::Creator).await;
        let lifecycle = ProjectLifecycle::new(&store, &clock);
        let project = lifecycle.create(alice.id, draft("Demo")).await.unwrap();

        clock.advance(Duration::hours(1));
        let published_at = clock.now();
        lifecycle.publish(alice.id, project.id).await.unwrap();

        clock.advance(Duration::hours(1));
        let unpublished = lifecycle.unpublish(alice.id, project.id).await.unwrap();
        assert!(!unpublished.is_published());

        let stored = store.find_project(project.id).await.unwrap().unwrap();
        assert!(!stored.is_published());
        assert_eq!(stored.publication.published_at(), Some(published_at));
    }

    #[tokio::test]
    async fn test_non_owner_is_forbidden_and_unknown_is_not_found() {
        let (store, clock) = fixture();
        let alice = user(&store, &clock, "alice", Role::Creator).await;
        let mallory = user(&store, &clock, "mallory", Role::Creator).await;
        let lifecycle = ProjectLifecycle::new(&store, &clock);
        let project = lifecycle.create(alice.id, draft("Demo")).await.unwrap();

        assert_eq!(
            lifecycle.publish(mallory.id, project.id).await.unwrap_err(),
            ServiceError::Forbidden
        );
        assert_eq!(
            lifecycle
                .save(mallory.id, project.id, ProjectChanges::default())
                .await
                .unwrap_err(),
            ServiceError::Forbidden
        );
        assert_eq!(
            lifecycle.publish(alice.id, ProjectId::generate()).await.unwrap_err(),
            ServiceError::NotFound
        );
    }

    #[tokio::test]
    async fn test_save_does_not_change_publication() {
        let (store, clock) = fixture();
        let alice = user(&store, &clock, "alice", Role::Creator).await;
        let lifecycle = ProjectLifecycle::new(&store, &clock);
        let project = lifecycle.create(alice.id, draft("Demo")).await.unwrap();
        lifecycle.publish(alice.id, project.id).await.unwrap();

        clock.advance(Duration::minutes(5));
        let changes = ProjectChanges {
            description: Some("Updated".to_string()),
            ..Default::default()
        };
        let saved = lifecycle.save(alice.id, project.id, changes).await.unwrap();

        assert!(saved.is_published());
        let stored = store.find_project(project.id).await.unwrap().unwrap();
        assert_eq!(stored.description, "Updated");
        assert!(stored.is_published());
        assert_eq!(stored.updated_at, clock.now());
    }

    #[tokio::test]
    async fn test_delete_removes_project() {
        let (store, clock) = fixture();
        let alice = user(&store, &clock, "alice", Role::Creator).await;
        let lifecycle = ProjectLifecycle::new(&store, &clock);
        let project = lifecycle.create(alice.id, draft("Demo")).await.unwrap();

        lifecycle.delete(alice.id, project.id).await.unwrap();
        assert_eq!(
            lifecycle.get_owned(alice.id, project.id).await.unwrap_err(),
            ServiceError::NotFound
        );
    }
}
