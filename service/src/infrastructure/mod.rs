use crate::domain::{
    AnalyticsOptions, AppState, Clock, SystemClock,
    repository::{EventRepository, ProjectRepository, UserRepository},
};

pub mod http;
pub mod memory;
pub mod persistence;
pub mod settings;

/// Concrete state wired at startup: one content store, one event store and a clock
#[derive(Clone)]
pub struct AppStateImpl<C, E, K = SystemClock> {
    content: C,
    events: E,
    clock: K,
    analytics: AnalyticsOptions,
}

impl<C, E, K> AppStateImpl<C, E, K> {
    pub fn new(content: C, events: E, clock: K, analytics: AnalyticsOptions) -> Self {
        Self {
            content,
            events,
            clock,
            analytics,
        }
    }
}

impl<C, E, K> AppState for AppStateImpl<C, E, K>
where
    C: UserRepository + ProjectRepository + Clone,
    E: EventRepository + Clone,
    K: Clock + Clone,
{
    type C = C;
    type E = E;
    type K = K;

    fn content(&self) -> &Self::C {
        &self.content
    }

    fn events(&self) -> &Self::E {
        &self.events
    }

    fn clock(&self) -> &Self::K {
        &self.clock
    }

    fn analytics(&self) -> &AnalyticsOptions {
        &self.analytics
    }
}
