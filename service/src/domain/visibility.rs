use shelf_common::{Email, ProjectId, UserId, Username};

use crate::domain::{
    error::ServiceError,
    project::Project,
    repository::{ProjectRepository, UserRepository},
    user::User,
};

/// Outcome of a visibility check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    pub allowed: bool,
    /// The requester is the owner of the content
    pub owner_request: bool,
}

/// Decides who may see a portfolio or a project.
///
/// Portfolios are always browsable. A project is visible when it is published
/// or when its owner asks for it. Anonymous requesters never count as owners.
pub fn can_view(owner_id: UserId, project: Option<&Project>, requester: Option<UserId>) -> Access {
    let owner_request = requester == Some(owner_id);
    let allowed = match project {
        None => true,
        Some(project) => project.is_published() || owner_request,
    };
    Access {
        allowed,
        owner_request,
    }
}

/// A portfolio as seen by one requester
#[derive(Debug, Clone)]
pub struct PortfolioView {
    pub owner: User,
    pub projects: Vec<Project>,
    pub access: Access,
}

/// A project as seen by one requester
#[derive(Debug, Clone)]
pub struct ProjectView {
    pub owner: User,
    pub project: Project,
    pub access: Access,
}

pub struct VisibilityResolver<'a, C> {
    content: &'a C,
}

impl<'a, C> VisibilityResolver<'a, C>
where
    C: UserRepository + ProjectRepository,
{
    pub fn new(content: &'a C) -> Self {
        Self { content }
    }

    /// Resolve the owner of a portfolio from a username, or from an email when
    /// the handle contains `@`
    pub async fn resolve_owner(&self, handle: &str) -> Result<User, ServiceError> {
        let user = if handle.contains('@') {
            match Email::try_new(handle) {
                Ok(email) => self.content.find_user_by_email(&email).await?,
                Err(_) => None,
            }
        } else {
            match Username::try_new(handle) {
                Ok(username) => self.content.find_user_by_username(&username).await?,
                Err(_) => None,
            }
        };
        user.ok_or(ServiceError::NotFound)
    }

    /// Public portfolio: owner profile plus published projects
    pub async fn portfolio(
        &self,
        handle: &str,
        requester: Option<UserId>,
    ) -> Result<PortfolioView, ServiceError> {
        let owner = self.resolve_owner(handle).await?;
        let access = can_view(owner.id, None, requester);
        let projects = self.content.projects_of(owner.id, true).await?;

        Ok(PortfolioView {
            owner,
            projects,
            access,
        })
    }

    /// One project of a portfolio. Hidden projects are reported as missing.
    pub async fn project(
        &self,
        handle: &str,
        project_id: ProjectId,
        requester: Option<UserId>,
    ) -> Result<ProjectView, ServiceError> {
        let owner = self.resolve_owner(handle).await?;
        let project = self
            .content
            .find_project(project_id)
            .await?
            .filter(|p| p.is_owned_by(owner.id))
            .ok_or(ServiceError::NotFound)?;

        let access = can_view(owner.id, Some(&project), requester);
        if !access.allowed {
            return Err(ServiceError::NotFound);
        }

        Ok(ProjectView {
            owner,
            project,
            access,
        })
    }
}
