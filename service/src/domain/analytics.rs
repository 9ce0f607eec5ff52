use std::str::FromStr;

use chrono::{DateTime, Duration, FixedOffset, Months, Utc};
use shelf_common::{ProjectId, UserId};

use crate::domain::{
    Clock,
    error::ServiceError,
    event::EventKind,
    repository::{
        EventRepository, ProjectRepository,
        query::{DailyCount, EventFilter, ProjectCount},
    },
};

/// Time window of a statistic query, always ending now
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Period {
    Week,
    Month,
    Year,
    #[default]
    All,
}

impl Period {
    /// Inclusive lower bound, `None` for the unbounded window
    pub fn lower_bound(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Period::Week => Some(now - Duration::days(7)),
            Period::Month => now.checked_sub_months(Months::new(1)),
            Period::Year => now.checked_sub_months(Months::new(12)),
            Period::All => None,
        }
    }
}

impl FromStr for Period {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "year" => Ok(Period::Year),
            "all" => Ok(Period::All),
            other => Err(ServiceError::Validation(format!(
                "unknown period '{}', expected one of week, month, year, all",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsQuery {
    pub kind: EventKind,
    pub project_id: Option<ProjectId>,
    pub period: Period,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stats {
    pub total: i64,
    /// Distinct authenticated visitors, anonymous events excluded
    pub unique_actors: i64,
    pub daily: Vec<DailyCount>,
    /// Per project counts of a portfolio wide project view query
    pub breakdown: Option<Vec<ProjectCount>>,
}

pub struct AnalyticsAggregator<'a, C, E, K> {
    content: &'a C,
    events: &'a E,
    clock: &'a K,
    utc_offset: FixedOffset,
}

impl<'a, C, E, K> AnalyticsAggregator<'a, C, E, K>
where
    C: ProjectRepository,
    E: EventRepository,
    K: Clock,
{
    pub fn new(content: &'a C, events: &'a E, clock: &'a K, utc_offset: FixedOffset) -> Self {
        Self {
            content,
            events,
            clock,
            utc_offset,
        }
    }

    /// Statistics over the events about `owner_id`.
    /// A project filter must name a project owned by `owner_id`.
    pub async fn query(&self, owner_id: UserId, query: StatsQuery) -> Result<Stats, ServiceError> {
        if let Some(project_id) = query.project_id {
            if query.kind != EventKind::ProjectView {
                return Err(ServiceError::Validation(
                    "only project views can be filtered by project".to_string(),
                ));
            }
            let project = self
                .content
                .find_project(project_id)
                .await?
                .ok_or(ServiceError::NotFound)?;
            if !project.is_owned_by(owner_id) {
                return Err(ServiceError::Forbidden);
            }
        }

        let now = self.clock.now();
        let filter = EventFilter::new(query.kind, owner_id, now)
            .since(query.period.lower_bound(now))
            .project(query.project_id);

        let with_breakdown = query.kind == EventKind::ProjectView && query.project_id.is_none();
        let (counts, daily, breakdown) = futures::try_join!(
            self.events.count(&filter),
            self.events.daily_counts(&filter, self.utc_offset),
            async {
                if with_breakdown {
                    self.events.project_counts(&filter).await.map(Some)
                } else {
                    Ok(None)
                }
            }
        )?;

        Ok(Stats {
            total: counts.total,
            unique_actors: counts.unique_visitors,
            daily,
            breakdown: breakdown.map(rank_projects),
        })
    }
}

/// Most viewed first, ties by project id
fn rank_projects(mut counts: Vec<ProjectCount>) -> Vec<ProjectCount> {
    counts.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.project_id.cmp(&b.project_id))
    });
    counts
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Offset, TimeZone};
    use shelf_common::{Slug, UserId};

    use super::*;
    use crate::{
        domain::{
            event::{EventMetadata, EventTarget, NewEvent},
            project::{Project, PublicationState},
        },
        infrastructure::memory::{FailingEventStore, ManualClock, MemoryStore},
    };

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
    }

    fn project(owner_id: UserId, title: &str) -> Project {
        Project {
            id: ProjectId::generate(),
            owner_id,
            title: title.to_string(),
            description: String::new(),
            slug: Slug::derive_from(title).unwrap(),
            content: None,
            cover_image: None,
            timeline: Vec::new(),
            technologies: Vec::new(),
            outcomes: Vec::new(),
            media: Vec::new(),
            publication: PublicationState::Published { published_at: now() },
            created_at: now(),
            updated_at: now(),
        }
    }

    async fn view(
        store: &MemoryStore,
        owner_id: UserId,
        project_id: ProjectId,
        visitor_id: Option<UserId>,
        at: DateTime<Utc>,
    ) {
        store
            .append(NewEvent {
                owner_id,
                target: EventTarget::Project(project_id),
                visitor_id,
                metadata: EventMetadata::default(),
                occurred_at: at,
            })
            .await
            .unwrap();
    }

    fn query(project_id: Option<ProjectId>, period: Period) -> StatsQuery {
        StatsQuery {
            kind: EventKind::ProjectView,
            project_id,
            period,
        }
    }

    #[test]
    fn test_period_parsing_and_bounds() {
        assert_eq!("week".parse::<Period>(), Ok(Period::Week));
        assert!(matches!("fortnight".parse::<Period>(), Err(ServiceError::Validation(_))));

        let now = Utc.with_ymd_and_hms(2024, 3, 31, 8, 0, 0).unwrap();
        assert_eq!(
            Period::Week.lower_bound(now),
            Some(Utc.with_ymd_and_hms(2024, 3, 24, 8, 0, 0).unwrap())
        );
        assert_eq!(
            Period::Month.lower_bound(now),
            Some(Utc.with_ymd_and_hms(2024, 2, 29, 8, 0, 0).unwrap())
        );
        assert_eq!(
            Period::Year.lower_bound(now),
            Some(Utc.with_ymd_and_hms(2023, 3, 31, 8, 0, 0).unwrap())
        );
        assert_eq!(Period::All.lower_bound(now), None);
    }

    #[tokio::test]
    async fn test_totals_unique_and_daily_series() {
        let store = MemoryStore::default();
        let clock = ManualClock::new(now());
        let owner = UserId::generate();
        let demo = project(owner, "Demo");
        store.insert_project(&demo).await.unwrap();

        let visitor = Some(UserId::generate());
        let yesterday = now() - Duration::days(1);
        view(&store, owner, demo.id, visitor, yesterday).await;
        view(&store, owner, demo.id, visitor, now()).await;
        view(&store, owner, demo.id, None, now()).await;
        view(&store, owner, demo.id, None, now()).await;

        let aggregator = AnalyticsAggregator::new(&store, &store, &clock, Utc.fix());
        let stats = aggregator
            .query(owner, query(Some(demo.id), Period::Week))
            .await
            .unwrap();

        assert_eq!(stats.total, 4);
        assert_eq!(stats.unique_actors, 1);
        assert_eq!(
            stats.daily,
            vec![
                DailyCount { day: NaiveDate::from_ymd_opt(2024, 5, 9).unwrap(), count: 1 },
                DailyCount { day: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(), count: 3 },
            ]
        );
        assert_eq!(stats.breakdown, None);
    }

    #[tokio::test]
    async fn test_all_anonymous_has_no_unique_actors() {
        let store = MemoryStore::default();
        let clock = ManualClock::new(now());
        let owner = UserId::generate();
        let demo = project(owner, "Demo");
        store.insert_project(&demo).await.unwrap();
        for _ in 0..5 {
            view(&store, owner, demo.id, None, now()).await;
        }

        let aggregator = AnalyticsAggregator::new(&store, &store, &clock, Utc.fix());
        let stats = aggregator.query(owner, query(None, Period::All)).await.unwrap();

        assert_eq!(stats.total, 5);
        assert_eq!(stats.unique_actors, 0);
    }

    #[tokio::test]
    async fn test_period_filters_old_events_but_all_keeps_them() {
        let store = MemoryStore::default();
        let clock = ManualClock::new(now());
        let owner = UserId::generate();
        let demo = project(owner, "Demo");
        store.insert_project(&demo).await.unwrap();
        view(&store, owner, demo.id, None, DateTime::<Utc>::MIN_UTC).await;
        view(&store, owner, demo.id, None, now() - Duration::days(10)).await;
        view(&store, owner, demo.id, None, now()).await;

        let aggregator = AnalyticsAggregator::new(&store, &store, &clock, Utc.fix());
        let week = aggregator.query(owner, query(None, Period::Week)).await.unwrap();
        let all = aggregator.query(owner, query(None, Period::All)).await.unwrap();

        assert_eq!(week.total, 1);
        assert_eq!(all.total, 3);
    }

    #[tokio::test]
    async fn test_breakdown_ordered_by_count_then_id() {
        let store = MemoryStore::default();
        let clock = ManualClock::new(now());
        let owner = UserId::generate();
        let a = project(owner, "Alpha");
        let b = project(owner, "Beta");
        let c = project(owner, "Gamma");
        for p in [&a, &b, &c] {
            store.insert_project(p).await.unwrap();
        }
        view(&store, owner, b.id, None, now()).await;
        view(&store, owner, b.id, None, now()).await;
        view(&store, owner, a.id, None, now()).await;
        view(&store, owner, c.id, None, now()).await;

        let aggregator = AnalyticsAggregator::new(&store, &store, &clock, Utc.fix());
        let stats = aggregator.query(owner, query(None, Period::All)).await.unwrap();
        let breakdown = stats.breakdown.unwrap();

        assert_eq!(breakdown[0].project_id, b.id);
        assert_eq!(breakdown[0].project_title, "Beta");
        assert_eq!(breakdown[0].count, 2);
        let (first, second) = if a.id < c.id { (a.id, c.id) } else { (c.id, a.id) };
        assert_eq!(breakdown[1].project_id, first);
        assert_eq!(breakdown[2].project_id, second);
    }

    #[tokio::test]
    async fn test_days_follow_reference_offset() {
        let store = MemoryStore::default();
        let clock = ManualClock::new(now());
        let owner = UserId::generate();
        let demo = project(owner, "Demo");
        store.insert_project(&demo).await.unwrap();
        // 23:30 UTC on the 9th is already the 10th two hours east
        let late_evening = Utc.with_ymd_and_hms(2024, 5, 9, 23, 30, 0).unwrap();
        view(&store, owner, demo.id, None, late_evening).await;

        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let aggregator = AnalyticsAggregator::new(&store, &store, &clock, offset);
        let stats = aggregator.query(owner, query(None, Period::All)).await.unwrap();

        assert_eq!(stats.daily[0].day, NaiveDate::from_ymd_opt(2024, 5, 10).unwrap());
    }

    #[tokio::test]
    async fn test_foreign_or_unknown_project_filter() {
        let store = MemoryStore::default();
        let clock = ManualClock::new(now());
        let owner = UserId::generate();
        let demo = project(owner, "Demo");
        store.insert_project(&demo).await.unwrap();

        let aggregator = AnalyticsAggregator::new(&store, &store, &clock, Utc.fix());
        assert_eq!(
            aggregator
                .query(UserId::generate(), query(Some(demo.id), Period::All))
                .await
                .unwrap_err(),
            ServiceError::Forbidden
        );
        assert_eq!(
            aggregator
                .query(owner, query(Some(ProjectId::generate()), Period::All))
                .await
                .unwrap_err(),
            ServiceError::NotFound
        );
    }

    #[tokio::test]
    async fn test_storage_failure_is_transient() {
        let store = MemoryStore::default();
        let clock = ManualClock::new(now());
        let aggregator = AnalyticsAggregator::new(&store, &FailingEventStore, &clock, Utc.fix());

        let error = aggregator
            .query(UserId::generate(), query(None, Period::All))
            .await
            .unwrap_err();
        assert!(error.is_transient());
    }
}
