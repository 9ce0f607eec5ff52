use std::env;

use anyhow::{Context, anyhow};
use chrono::FixedOffset;
use config::{Config, Environment, File};
use dotenvy::dotenv;
use serde::Deserialize;
use shelf_common::DatabaseSettings;

use crate::domain::AnalyticsOptions;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server_port: String,
    #[serde(default)]
    pub storage: StorageKind,
    /// Required for `storage: postgres`
    pub database: Option<DatabaseSettings>,
    #[serde(default)]
    pub analytics: AnalyticsSettings,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyticsSettings {
    #[serde(default)]
    pub count_owner_views: bool,
    /// Reference time zone of the daily series, as minutes east of UTC
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl AnalyticsSettings {
    pub fn options(&self) -> anyhow::Result<AnalyticsOptions> {
        let utc_offset = FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            anyhow!("utc_offset_minutes out of range: {}", self.utc_offset_minutes)
        })?;
        Ok(AnalyticsOptions {
            count_owner_views: self.count_owner_views,
            utc_offset,
        })
    }
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        let run_mode = load_env("RUN_MODE", "development");

        let s = Config::builder()
            .add_source(File::with_name("./config/default"))
            .add_source(File::with_name(&format!("./config/{run_mode}")).required(false))
            .add_source(Environment::with_prefix("app").separator("__"))
            .build()?;

        s.try_deserialize().with_context(|| "failed to read config")
    }
}

fn load_env(key: &str, default_value: &'static str) -> String {
    env::var(key).unwrap_or_else(|_| default_value.into())
}
