use std::borrow::Cow;

use shelf_common::{
    CREATED_FIELD_NAME, EVENTS_TABLE_NAME, ID_FIELD_NAME, IS_PUBLISHED_FIELD_NAME,
    MEDIA_TABLE_NAME, PROJECT_ID_FIELD_NAME, PROJECTS_TABLE_NAME, PUBLISHED_FIELD_NAME,
    UPDATED_FIELD_NAME, USER_ID_FIELD_NAME, USERS_TABLE_NAME,
};

// Represents a table in database
#[derive(Debug, Clone, Copy)]
pub struct Table<'a> {
    pub name: &'a str,
    pub alias: &'static str,
}

impl Table<'_> {
    /// Get qualified table name with alias
    pub fn qualified(&self) -> String {
        format!("\"{}\" AS \"{}\"", self.name, self.alias)
    }

    pub fn column(&self, name: &'static str) -> Column<'static> {
        Column {
            qualifier: self.alias,
            name,
        }
    }
}

/// Represents one column in the database table
#[derive(Debug, Clone, Copy)]
pub struct Column<'a> {
    pub qualifier: &'static str,
    pub name: &'a str,
}

impl Column<'_> {
    /// Get qualified column name
    pub fn qualified(&self) -> String {
        format!("\"{}\".\"{}\"", self.qualifier, self.name)
    }
}

/// Column reference which can be either borrowed or owned
pub type ColumnRef<'a> = Cow<'a, Column<'a>>;

pub const USERS: Table<'static> = Table {
    name: USERS_TABLE_NAME,
    alias: "u",
};
pub const PROJECTS: Table<'static> = Table {
    name: PROJECTS_TABLE_NAME,
    alias: "p",
};
pub const MEDIA: Table<'static> = Table {
    name: MEDIA_TABLE_NAME,
    alias: "m",
};
pub const EVENTS: Table<'static> = Table {
    name: EVENTS_TABLE_NAME,
    alias: "e",
};

pub const USER_COLUMNS: [&str; 9] = [
    ID_FIELD_NAME,
    "username",
    "email",
    "name",
    "bio",
    "avatar_url",
    "role",
    CREATED_FIELD_NAME,
    UPDATED_FIELD_NAME,
];

pub const PROJECT_COLUMNS: [&str; 14] = [
    ID_FIELD_NAME,
    USER_ID_FIELD_NAME,
    "title",
    "description",
    "slug",
    "content",
    "cover_image",
    "timeline",
    "technologies",
    "outcomes",
    IS_PUBLISHED_FIELD_NAME,
    PUBLISHED_FIELD_NAME,
    CREATED_FIELD_NAME,
    UPDATED_FIELD_NAME,
];

pub const MEDIA_COLUMNS: [&str; 6] = [
    ID_FIELD_NAME,
    PROJECT_ID_FIELD_NAME,
    "media_type",
    "url",
    "caption",
    "sort_order",
];

/// Borrowed references to the listed columns of a table
pub fn columns_of(table: Table<'static>, names: &[&'static str]) -> Vec<ColumnRef<'static>> {
    names
        .iter()
        .map(|name| Cow::Owned(table.column(name)))
        .collect()
}
