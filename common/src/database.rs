use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use sqlx::{
    Executor, PgPool,
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
};

/// Process wide connection pool. Constructed once at startup and handed to the
/// adapters that need it, never reached through a global.
#[derive(Clone, Debug)]
pub struct Database {
    database_pool: PgPool,
    database_schema: String,
    query_timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub db: String,
    pub schema: String,
    pub credentials: DatabaseCredentials,
    pub connection: DatabaseConnection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConnection {
    pub min_connections: u32,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    #[serde(default = "default_statement_timeout")]
    pub statement_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseCredentials {
    pub username: String,
    pub password: String,
}

fn default_port() -> u16 {
    5432
}

fn default_statement_timeout() -> u64 {
    5
}

impl Database {
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, anyhow::Error> {
        let credentials = &settings.credentials;
        let connection = &settings.connection;
        let statement_timeout = format!("{}s", connection.statement_timeout_seconds);

        let pg_connect_options = PgConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&credentials.username)
            .password(&credentials.password)
            .database(&settings.db)
            .ssl_mode(PgSslMode::Prefer)
            .options([
                ("search_path", settings.schema.as_str()),
                ("statement_timeout", statement_timeout.as_str()),
            ]);

        let pool = PgPoolOptions::new()
            .min_connections(connection.min_connections)
            .max_connections(connection.max_connections)
            .acquire_timeout(Duration::from_secs(connection.acquire_timeout_seconds))
            .connect_with(pg_connect_options)
            .await
            .with_context(|| {
                format!(
                    "failed to open database at {}/{}",
                    settings.host, settings.db
                )
            })?;

        tracing::info!(host = %settings.host, db = %settings.db, "database pool ready");

        Ok(Self {
            database_pool: pool,
            database_schema: settings.schema.to_owned(),
            query_timeout: Duration::from_secs(connection.statement_timeout_seconds),
        })
    }

    pub async fn execute_in_transaction(
        &self,
        queries: Vec<String>,
        ctx: &'static str,
    ) -> Result<(), anyhow::Error> {
        let mut transaction = self
            .database_pool
            .begin()
            .await
            .context(format!("failed to start {} transaction", ctx))?;

        for ddl in queries {
            tracing::debug!(ctx, "{}", ddl);

            transaction
                .execute(sqlx::query(&ddl))
                .await
                .context(format!("failed to execute {} query", ctx))?;
        }

        transaction
            .commit()
            .await
            .context(format!("failed to commit {} transaction", ctx))?;

        Ok(())
    }

    pub fn database_pool(&self) -> &PgPool {
        &self.database_pool
    }

    pub fn database_schema(&self) -> &str {
        &self.database_schema
    }

    /// Upper bound for a single storage call made through this pool
    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }
}
