pub mod database;
pub mod domain;

// Persisted table names

pub const USERS_TABLE_NAME: &str = "users";
pub const PROJECTS_TABLE_NAME: &str = "projects";
pub const MEDIA_TABLE_NAME: &str = "media";
pub const EVENTS_TABLE_NAME: &str = "events";

// Persisted field names shared by several tables

pub const ID_FIELD_NAME: &str = "id";
pub const USER_ID_FIELD_NAME: &str = "user_id";
pub const PROJECT_ID_FIELD_NAME: &str = "project_id";

pub const CREATED_FIELD_NAME: &str = "created_at";
pub const UPDATED_FIELD_NAME: &str = "updated_at";
pub const PUBLISHED_FIELD_NAME: &str = "published_at";
pub const IS_PUBLISHED_FIELD_NAME: &str = "is_published";

// Event specific field names

pub const EVENT_KIND_FIELD_NAME: &str = "kind";
pub const OWNER_ID_FIELD_NAME: &str = "owner_id";
pub const VISITOR_ID_FIELD_NAME: &str = "visitor_id";
pub const REFERRER_FIELD_NAME: &str = "referrer";
pub const METADATA_FIELD_NAME: &str = "metadata";

// expose domain module

pub use domain::*;
pub use database::{Database, DatabaseSettings};
