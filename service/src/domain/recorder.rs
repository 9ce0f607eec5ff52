use shelf_common::{ProjectId, UserId};
use tracing::{debug, warn};

use crate::domain::{
    Clock,
    error::ServiceError,
    event::{Event, EventKind, EventMetadata, EventTarget, NewEvent},
    repository::{EventRepository, ProjectRepository, UserRepository},
};

/// Whether owners looking at their own content produce events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordPolicy {
    pub count_owner_views: bool,
}

/// One access to record
#[derive(Debug, Clone)]
pub struct ViewRequest {
    pub kind: EventKind,
    pub owner_id: UserId,
    pub project_id: Option<ProjectId>,
    pub visitor_id: Option<UserId>,
    /// Set by the visibility check, the visitor is the owner
    pub owner_request: bool,
    pub metadata: EventMetadata,
}

impl ViewRequest {
    pub fn portfolio_visit(owner_id: UserId, visitor_id: Option<UserId>) -> Self {
        Self {
            kind: EventKind::PortfolioVisit,
            owner_id,
            project_id: None,
            visitor_id,
            owner_request: visitor_id == Some(owner_id),
            metadata: EventMetadata::default(),
        }
    }

    pub fn project_view(
        owner_id: UserId,
        project_id: ProjectId,
        visitor_id: Option<UserId>,
    ) -> Self {
        Self {
            kind: EventKind::ProjectView,
            owner_id,
            project_id: Some(project_id),
            visitor_id,
            owner_request: visitor_id == Some(owner_id),
            metadata: EventMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: EventMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// Owner self view while owner views are not counted
    OwnerView,
    /// The event could not be stored
    StorageUnavailable,
    /// The request did not pass validation
    Rejected,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Recorded(Event),
    Suppressed(SuppressReason),
}

/// Appends view events. Storage failures never reach the caller.
pub struct EventRecorder<'a, C, E, K> {
    content: &'a C,
    events: &'a E,
    clock: &'a K,
    policy: RecordPolicy,
}

impl<'a, C, E, K> EventRecorder<'a, C, E, K>
where
    C: UserRepository + ProjectRepository,
    E: EventRepository,
    K: Clock,
{
    pub fn new(content: &'a C, events: &'a E, clock: &'a K, policy: RecordPolicy) -> Self {
        Self {
            content,
            events,
            clock,
            policy,
        }
    }

    /// Record one access.
    ///
    /// The target is validated first: `NotFound` when the owner or the project does not
    /// resolve, or when the project is not published, and `Validation` on a malformed
    /// request. Only a valid owner self view is then subject to the owner policy.
    /// Storage failures are logged and reported as `Suppressed(StorageUnavailable)`.
    pub async fn record(&self, request: ViewRequest) -> Result<RecordOutcome, ServiceError> {
        let target = match self.resolve_target(&request).await {
            Ok(target) => target,
            Err(error) if error.is_transient() => return Ok(self.unavailable(&request, error)),
            Err(error) => return Err(error),
        };

        if request.owner_request && !self.policy.count_owner_views {
            debug!("Owner view of {} not recorded", request.owner_id);
            return Ok(RecordOutcome::Suppressed(SuppressReason::OwnerView));
        }

        let appended = self
            .events
            .append(NewEvent {
                owner_id: request.owner_id,
                target,
                visitor_id: request.visitor_id,
                metadata: request.metadata.clone(),
                occurred_at: self.clock.now(),
            })
            .await
            .map_err(ServiceError::from);
        match appended {
            Ok(event) => Ok(RecordOutcome::Recorded(event)),
            Err(error) if error.is_transient() => Ok(self.unavailable(&request, error)),
            Err(error) => Err(error),
        }
    }

    /// Record as a side effect of serving content. Never fails.
    pub async fn record_best_effort(&self, request: ViewRequest) -> RecordOutcome {
        let kind = request.kind;
        let owner_id = request.owner_id;
        let owner_request = request.owner_request;
        match self.record(request).await {
            Ok(outcome) => outcome,
            Err(error) => {
                // owners previewing their own drafts land here
                if owner_request {
                    debug!("{} by owner {} not recorded: {}", kind.as_str(), owner_id, error);
                } else {
                    warn!("Rejected {} of owner {}: {}", kind.as_str(), owner_id, error);
                }
                RecordOutcome::Suppressed(SuppressReason::Rejected)
            }
        }
    }

    fn unavailable(&self, request: &ViewRequest, error: ServiceError) -> RecordOutcome {
        warn!(
            "Failed to record {} of owner {} (project {:?}): {}",
            request.kind.as_str(),
            request.owner_id,
            request.project_id,
            error
        );
        RecordOutcome::Suppressed(SuppressReason::StorageUnavailable)
    }

    async fn resolve_target(&self, request: &ViewRequest) -> Result<EventTarget, ServiceError> {
        match (request.kind, request.project_id) {
            (EventKind::PortfolioVisit, None) => {
                self.content
                    .find_user(request.owner_id)
                    .await?
                    .ok_or(ServiceError::NotFound)?;
                Ok(EventTarget::Portfolio)
            }
            (EventKind::PortfolioVisit, Some(_)) => Err(ServiceError::Validation(
                "a portfolio visit does not reference a project".to_string(),
            )),
            (EventKind::ProjectView, None) => Err(ServiceError::Validation(
                "a project view requires a project".to_string(),
            )),
            (EventKind::ProjectView, Some(project_id)) => {
                self.content
                    .find_project(project_id)
                    .await?
                    .filter(|p| p.is_owned_by(request.owner_id) && p.is_published())
                    .ok_or(ServiceError::NotFound)?;
                Ok(EventTarget::Project(project_id))
            }
        }
    }
}
