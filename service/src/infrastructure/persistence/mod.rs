use std::future::Future;

use shelf_common::Database;
use sqlx::{Postgres, postgres::PgArguments, query::Query};
use tracing::debug;

use crate::{
    domain::repository::RepositoryError,
    infrastructure::persistence::query::SqlParameter,
};

pub mod query;
pub mod repository;
pub mod result;
pub mod schema;

/// PostgreSQL adapter of the storage ports. Every call is bounded by the
/// configured statement timeout.
#[derive(Clone, Debug)]
pub struct PostgresStore {
    database: Database,
}

impl PostgresStore {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    fn pool(&self) -> &sqlx::PgPool {
        self.database.database_pool()
    }

    /// Run a storage operation, giving up after the query timeout
    async fn bounded<T, F>(&self, operation: F) -> Result<T, RepositoryError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.database.query_timeout(), operation).await {
            Ok(result) => result.map_err(map_sqlx_error),
            Err(_) => Err(RepositoryError::Timeout),
        }
    }
}

/// Prepare a generated statement with its positional parameters
fn prepared(sql: &str, params: Vec<SqlParameter>) -> Query<'_, Postgres, PgArguments> {
    debug!("Generated SQL: {}", sql);
    params
        .into_iter()
        .fold(sqlx::query(sql), |query, param| param.bind_to_query(query))
}

fn map_sqlx_error(error: sqlx::Error) -> RepositoryError {
    match &error {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::UniqueViolation(db.message().to_string())
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => RepositoryError::NotFound,
        sqlx::Error::Database(db) if db.is_check_violation() => {
            RepositoryError::ValidationFailed(db.message().to_string())
        }
        // 57014: statement cancelled by statement_timeout
        sqlx::Error::Database(db) if db.code().as_deref() == Some("57014") => {
            RepositoryError::Timeout
        }
        sqlx::Error::PoolTimedOut => RepositoryError::Timeout,
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        _ => RepositoryError::DatabaseError(error.to_string()),
    }
}
