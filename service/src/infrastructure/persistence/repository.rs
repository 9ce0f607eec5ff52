use std::{borrow::Cow, collections::HashMap};

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use shelf_common::{
    CREATED_FIELD_NAME, EVENT_KIND_FIELD_NAME, Email, ID_FIELD_NAME, IS_PUBLISHED_FIELD_NAME,
    OWNER_ID_FIELD_NAME, PROJECT_ID_FIELD_NAME, ProjectId, USER_ID_FIELD_NAME, UserId, Username,
};
use sqlx::{Postgres, Row, Transaction, types::Json};
use uuid::Uuid;

use crate::{
    domain::{
        event::{Event, NewEvent},
        project::{Media, Project, PublicationState},
        repository::{
            EventRepository, ProjectRepository, RepositoryError, UserRepository,
            query::{DailyCount, EventCounts, EventFilter, ProjectCount},
        },
        user::{NewUser, PortfolioSummary, User},
    },
    infrastructure::persistence::{
        PostgresStore, prepared,
        query::{Condition, ConditionValue, QueryBuilder, SortDirection},
        result::{row_to_event, row_to_media, row_to_project, row_to_user},
        schema::{
            Column, EVENTS, MEDIA, MEDIA_COLUMNS, PROJECT_COLUMNS, PROJECTS, USER_COLUMNS, USERS,
            columns_of,
        },
    },
};

fn equals(column: Column<'static>, value: ConditionValue) -> Condition<'static> {
    Condition::Equals {
        column: Cow::Owned(column),
        value,
    }
}

fn event_conditions(filter: &EventFilter) -> Vec<Condition<'static>> {
    let mut conditions = vec![
        equals(
            EVENTS.column(EVENT_KIND_FIELD_NAME),
            ConditionValue::Text(filter.kind.as_str().to_string()),
        ),
        equals(
            EVENTS.column(OWNER_ID_FIELD_NAME),
            ConditionValue::Uuid(filter.owner_id.0),
        ),
        Condition::LessThanOrEqual {
            column: Cow::Owned(EVENTS.column(CREATED_FIELD_NAME)),
            value: ConditionValue::Timestamp(filter.until),
        },
    ];
    if let Some(project_id) = filter.project_id {
        conditions.push(equals(
            EVENTS.column(PROJECT_ID_FIELD_NAME),
            ConditionValue::Uuid(project_id.0),
        ));
    }
    if let Some(since) = filter.since {
        conditions.push(Condition::GreaterThanOrEqual {
            column: Cow::Owned(EVENTS.column(CREATED_FIELD_NAME)),
            value: ConditionValue::Timestamp(since),
        });
    }
    conditions
}

fn filtered_events(filter: &EventFilter) -> QueryBuilder<'static> {
    event_conditions(filter)
        .into_iter()
        .fold(QueryBuilder::from(EVENTS), |builder, condition| {
            builder.where_condition(condition)
        })
}

async fn insert_media(
    transaction: &mut Transaction<'_, Postgres>,
    project: &Project,
) -> Result<(), sqlx::Error> {
    for media in &project.media {
        sqlx::query(
            "INSERT INTO \"media\" (\"id\", \"project_id\", \"media_type\", \"url\", \"caption\", \"sort_order\", \"created_at\") \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(media.id)
        .bind(project.id)
        .bind(media.media_type.as_str())
        .bind(&media.url)
        .bind(&media.caption)
        .bind(media.order)
        .bind(project.updated_at)
        .execute(&mut **transaction)
        .await?;
    }
    Ok(())
}

impl PostgresStore {
    async fn find_user_where(
        &self,
        condition: Condition<'static>,
    ) -> Result<Option<User>, RepositoryError> {
        let (sql, params) = QueryBuilder::from(USERS)
            .select(columns_of(USERS, &USER_COLUMNS))
            .where_condition(condition)
            .build();
        let row = self
            .bounded(prepared(&sql, params).fetch_optional(self.pool()))
            .await?;
        row.as_ref().map(row_to_user).transpose()
    }

    /// Media of the given projects, grouped by project and ordered for display
    async fn media_of(
        &self,
        ids: &[ProjectId],
    ) -> Result<HashMap<ProjectId, Vec<Media>>, RepositoryError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let (sql, params) = QueryBuilder::from(MEDIA)
            .select(columns_of(MEDIA, &MEDIA_COLUMNS))
            .where_condition(Condition::In {
                column: Cow::Owned(MEDIA.column(PROJECT_ID_FIELD_NAME)),
                values: ids.iter().map(|id| ConditionValue::Uuid(id.0)).collect(),
            })
            .order_by("\"m\".\"sort_order\"", SortDirection::Ascending)
            .order_by("\"m\".\"created_at\"", SortDirection::Ascending)
            .build();
        let rows = self.bounded(prepared(&sql, params).fetch_all(self.pool())).await?;

        let mut media: HashMap<ProjectId, Vec<Media>> = HashMap::new();
        for row in &rows {
            let (project_id, item) = row_to_media(row)?;
            media.entry(project_id).or_default().push(item);
        }
        Ok(media)
    }

    async fn with_media(
        &self,
        mut projects: Vec<Project>,
    ) -> Result<Vec<Project>, RepositoryError> {
        let ids: Vec<ProjectId> = projects.iter().map(|p| p.id).collect();
        let mut media = self.media_of(&ids).await?;
        for project in projects.iter_mut() {
            project.media = media.remove(&project.id).unwrap_or_default();
        }
        Ok(projects)
    }
}

impl UserRepository for PostgresStore {
    async fn create_user(
        &self,
        user: NewUser,
        now: DateTime<Utc>,
    ) -> Result<User, RepositoryError> {
        let row = self
            .bounded(
                sqlx::query(
                    "INSERT INTO \"users\" (\"id\", \"username\", \"email\", \"name\", \"role\", \"created_at\", \"updated_at\") \
                     VALUES ($1, $2, $3, $4, $5, $6, $6) RETURNING *",
                )
                .bind(Uuid::new_v4())
                .bind(user.username.as_ref())
                .bind(user.email.as_ref())
                .bind(&user.name)
                .bind(user.role.as_str())
                .bind(now)
                .fetch_one(self.pool()),
            )
            .await?;
        row_to_user(&row)
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        self.find_user_where(equals(USERS.column(ID_FIELD_NAME), ConditionValue::Uuid(id.0)))
            .await
    }

    async fn find_user_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, RepositoryError> {
        self.find_user_where(equals(
            USERS.column("username"),
            ConditionValue::Text(username.to_string()),
        ))
        .await
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        self.find_user_where(equals(
            USERS.column("email"),
            ConditionValue::Text(email.to_string()),
        ))
        .await
    }

    async fn update_user(&self, user: &User) -> Result<(), RepositoryError> {
        let result = self
            .bounded(
                sqlx::query(
                    "UPDATE \"users\" SET \"name\" = $2, \"bio\" = $3, \"avatar_url\" = $4, \"role\" = $5, \"updated_at\" = $6 \
                     WHERE \"id\" = $1",
                )
                .bind(user.id)
                .bind(&user.name)
                .bind(&user.bio)
                .bind(&user.avatar_url)
                .bind(user.role.as_str())
                .bind(user.updated_at)
                .execute(self.pool()),
            )
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn published_portfolios(&self) -> Result<Vec<PortfolioSummary>, RepositoryError> {
        let (sql, params) = QueryBuilder::from(USERS)
            .select(columns_of(USERS, &USER_COLUMNS))
            .select_expression("COUNT(\"p\".\"id\")", "published_projects")
            .join(
                PROJECTS,
                Cow::Owned(USERS.column(ID_FIELD_NAME)),
                Cow::Owned(PROJECTS.column(USER_ID_FIELD_NAME)),
            )
            .where_condition(equals(
                PROJECTS.column(IS_PUBLISHED_FIELD_NAME),
                ConditionValue::Boolean(true),
            ))
            .group_by("\"u\".\"id\"")
            .order_by("\"u\".\"username\"", SortDirection::Ascending)
            .build();
        let rows = self.bounded(prepared(&sql, params).fetch_all(self.pool())).await?;

        rows.iter()
            .map(|row| {
                Ok(PortfolioSummary {
                    user: row_to_user(row)?,
                    published_projects: row.try_get("published_projects").map_err(|e| {
                        RepositoryError::DatabaseError(format!(
                            "Failed to parse published_projects: {}",
                            e
                        ))
                    })?,
                })
            })
            .collect()
    }
}

impl ProjectRepository for PostgresStore {
    async fn insert_project(&self, project: &Project) -> Result<(), RepositoryError> {
        let publication = project.publication;
        self.bounded(async {
            let mut transaction = self.pool().begin().await?;
            sqlx::query(
                "INSERT INTO \"projects\" (\"id\", \"user_id\", \"title\", \"description\", \"slug\", \"content\", \"cover_image\", \
                 \"timeline\", \"technologies\", \"outcomes\", \"is_published\", \"published_at\", \"created_at\", \"updated_at\") \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
            )
            .bind(project.id)
            .bind(project.owner_id)
            .bind(&project.title)
            .bind(&project.description)
            .bind(project.slug.as_ref())
            .bind(&project.content)
            .bind(&project.cover_image)
            .bind(Json(&project.timeline))
            .bind(&project.technologies)
            .bind(Json(&project.outcomes))
            .bind(publication.is_published())
            .bind(publication.published_at())
            .bind(project.created_at)
            .bind(project.updated_at)
            .execute(&mut *transaction)
            .await?;
            insert_media(&mut transaction, project).await?;
            transaction.commit().await
        })
        .await
    }

    async fn find_project(&self, id: ProjectId) -> Result<Option<Project>, RepositoryError> {
        let (sql, params) = QueryBuilder::from(PROJECTS)
            .select(columns_of(PROJECTS, &PROJECT_COLUMNS))
            .where_condition(equals(PROJECTS.column(ID_FIELD_NAME), ConditionValue::Uuid(id.0)))
            .build();
        let row = self
            .bounded(prepared(&sql, params).fetch_optional(self.pool()))
            .await?;

        match row.as_ref().map(row_to_project).transpose()? {
            Some(project) => Ok(self.with_media(vec![project]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn projects_of(
        &self,
        owner_id: UserId,
        published_only: bool,
    ) -> Result<Vec<Project>, RepositoryError> {
        let mut builder = QueryBuilder::from(PROJECTS)
            .select(columns_of(PROJECTS, &PROJECT_COLUMNS))
            .where_condition(equals(
                PROJECTS.column(USER_ID_FIELD_NAME),
                ConditionValue::Uuid(owner_id.0),
            ));
        if published_only {
            builder = builder.where_condition(equals(
                PROJECTS.column(IS_PUBLISHED_FIELD_NAME),
                ConditionValue::Boolean(true),
            ));
        }
        let (sql, params) = builder
            .order_by("\"p\".\"created_at\"", SortDirection::Descending)
            .build();
        let rows = self.bounded(prepared(&sql, params).fetch_all(self.pool())).await?;

        let projects = rows.iter().map(row_to_project).collect::<Result<Vec<_>, _>>()?;
        self.with_media(projects).await
    }

    async fn save_project(&self, project: &Project) -> Result<(), RepositoryError> {
        let updated = self
            .bounded(async {
                let mut transaction = self.pool().begin().await?;
                let result = sqlx::query(
                    "UPDATE \"projects\" SET \"title\" = $2, \"description\" = $3, \"content\" = $4, \"cover_image\" = $5, \
                     \"timeline\" = $6, \"technologies\" = $7, \"outcomes\" = $8, \"updated_at\" = $9 WHERE \"id\" = $1",
                )
                .bind(project.id)
                .bind(&project.title)
                .bind(&project.description)
                .bind(&project.content)
                .bind(&project.cover_image)
                .bind(Json(&project.timeline))
                .bind(&project.technologies)
                .bind(Json(&project.outcomes))
                .bind(project.updated_at)
                .execute(&mut *transaction)
                .await?;
                if result.rows_affected() == 0 {
                    return Ok(false);
                }

                sqlx::query("DELETE FROM \"media\" WHERE \"project_id\" = $1")
                    .bind(project.id)
                    .execute(&mut *transaction)
                    .await?;
                insert_media(&mut transaction, project).await?;
                transaction.commit().await?;
                Ok::<_, sqlx::Error>(true)
            })
            .await?;

        if !updated {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn set_publication(
        &self,
        id: ProjectId,
        state: PublicationState,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        // both columns in one statement
        let result = self
            .bounded(
                sqlx::query(
                    "UPDATE \"projects\" SET \"is_published\" = $2, \"published_at\" = $3, \"updated_at\" = $4 \
                     WHERE \"id\" = $1",
                )
                .bind(id)
                .bind(state.is_published())
                .bind(state.published_at())
                .bind(updated_at)
                .execute(self.pool()),
            )
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_project(&self, id: ProjectId) -> Result<(), RepositoryError> {
        let deleted = self
            .bounded(async {
                let mut transaction = self.pool().begin().await?;
                sqlx::query("DELETE FROM \"media\" WHERE \"project_id\" = $1")
                    .bind(id)
                    .execute(&mut *transaction)
                    .await?;
                let result = sqlx::query("DELETE FROM \"projects\" WHERE \"id\" = $1")
                    .bind(id)
                    .execute(&mut *transaction)
                    .await?;
                transaction.commit().await?;
                Ok::<_, sqlx::Error>(result.rows_affected())
            })
            .await?;

        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

impl EventRepository for PostgresStore {
    async fn append(&self, event: NewEvent) -> Result<Event, RepositoryError> {
        let event = Event::from(event);
        let row = self
            .bounded(
                sqlx::query(
                    "INSERT INTO \"events\" (\"id\", \"kind\", \"owner_id\", \"project_id\", \"visitor_id\", \"referrer\", \"metadata\", \"created_at\") \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
                )
                .bind(event.id)
                .bind(event.kind().as_str())
                .bind(event.owner_id)
                .bind(event.target.project_id())
                .bind(event.visitor_id)
                .bind(&event.metadata.referrer)
                .bind(event.metadata.extra.as_ref().map(Json))
                .bind(event.created_at)
                .fetch_one(self.pool()),
            )
            .await?;
        row_to_event(&row)
    }

    async fn count(&self, filter: &EventFilter) -> Result<EventCounts, RepositoryError> {
        let (sql, params) = filtered_events(filter)
            .select_expression("COUNT(*)", "total")
            .select_expression("COUNT(DISTINCT \"e\".\"visitor_id\")", "unique_visitors")
            .build();
        let row = self
            .bounded(prepared(&sql, params).fetch_one(self.pool()))
            .await?;

        let parse = |column: &str| -> Result<i64, RepositoryError> {
            row.try_get(column).map_err(|e| {
                RepositoryError::DatabaseError(format!("Failed to parse {}: {}", column, e))
            })
        };
        Ok(EventCounts {
            total: parse("total")?,
            unique_visitors: parse("unique_visitors")?,
        })
    }

    async fn daily_counts(
        &self,
        filter: &EventFilter,
        offset: FixedOffset,
    ) -> Result<Vec<DailyCount>, RepositoryError> {
        let offset_minutes = offset.local_minus_utc() / 60;
        let day = format!(
            "(\"e\".\"created_at\" AT TIME ZONE make_interval(mins => {}))::date",
            offset_minutes
        );
        let (sql, params) = filtered_events(filter)
            .select_expression(day.clone(), "day")
            .select_expression("COUNT(*)", "count")
            .group_by(day)
            .order_by("\"day\"", SortDirection::Ascending)
            .build();
        let rows = self.bounded(prepared(&sql, params).fetch_all(self.pool())).await?;

        rows.iter()
            .map(|row| {
                let day: NaiveDate = row.try_get("day").map_err(|e| {
                    RepositoryError::DatabaseError(format!("Failed to parse day: {}", e))
                })?;
                let count: i64 = row.try_get("count").map_err(|e| {
                    RepositoryError::DatabaseError(format!("Failed to parse count: {}", e))
                })?;
                Ok(DailyCount { day, count })
            })
            .collect()
    }

    async fn project_counts(
        &self,
        filter: &EventFilter,
    ) -> Result<Vec<ProjectCount>, RepositoryError> {
        // inner join: events of deleted projects drop out
        let (sql, params) = filtered_events(filter)
            .select(columns_of(PROJECTS, &[ID_FIELD_NAME, "title"]))
            .select_expression("COUNT(*)", "count")
            .join(
                PROJECTS,
                Cow::Owned(EVENTS.column(PROJECT_ID_FIELD_NAME)),
                Cow::Owned(PROJECTS.column(ID_FIELD_NAME)),
            )
            .group_by("\"p\".\"id\", \"p\".\"title\"")
            .build();
        let rows = self.bounded(prepared(&sql, params).fetch_all(self.pool())).await?;

        rows.iter()
            .map(|row| {
                let parse_error = |e: sqlx::Error| {
                    RepositoryError::DatabaseError(format!("Failed to parse breakdown: {}", e))
                };
                Ok(ProjectCount {
                    project_id: ProjectId(row.try_get(ID_FIELD_NAME).map_err(parse_error)?),
                    project_title: row.try_get("title").map_err(parse_error)?,
                    count: row.try_get("count").map_err(parse_error)?,
                })
            })
            .collect()
    }
}
