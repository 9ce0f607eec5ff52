use std::fmt::{Display, Formatter};

use shelf_common::{
    CREATED_FIELD_NAME, EVENT_KIND_FIELD_NAME, EVENTS_TABLE_NAME, ID_FIELD_NAME,
    IS_PUBLISHED_FIELD_NAME, MEDIA_TABLE_NAME, METADATA_FIELD_NAME, OWNER_ID_FIELD_NAME,
    PROJECT_ID_FIELD_NAME, PROJECTS_TABLE_NAME, PUBLISHED_FIELD_NAME, REFERRER_FIELD_NAME,
    UPDATED_FIELD_NAME, USER_ID_FIELD_NAME, USERS_TABLE_NAME, VISITOR_ID_FIELD_NAME,
};

/// Represents table in a database, used for ddl generation
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub checks: Vec<String>,
    pub foreign_keys: Vec<ForeignKeyConstraint>,
    pub indexes: Vec<Index>,
}

/// Represents one column in the database table
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub not_null: bool,
    pub unique: bool,
    pub primary_key: bool,
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Uuid,
    Text,
    TextArray,
    Integer,
    Boolean,
    TimestampTZ,
    Jsonb,
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let sql = match self {
            ColumnType::Uuid => "UUID",
            ColumnType::Text => "TEXT",
            ColumnType::TextArray => "TEXT[]",
            ColumnType::Integer => "INTEGER",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::TimestampTZ => "TIMESTAMPTZ",
            ColumnType::Jsonb => "JSONB",
        };
        f.write_str(sql)
    }
}

/// Represents foreign key constraint in the database table
pub struct ForeignKeyConstraint {
    pub table_name: String,
    pub column_name: String,
    pub referenced_table_name: String,
    pub referenced_column_name: String,
}

/// Represents an index in the database table
pub struct Index {
    pub table_name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

impl Table {
    pub fn new<T: Into<String>>(name: T, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
            checks: Vec::new(),
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
        }
    }

    pub fn check<T: Into<String>>(mut self, expression: T) -> Self {
        self.checks.push(expression.into());
        self
    }

    pub fn references(mut self, column_name: &str, referenced_table_name: &str) -> Self {
        let fk = ForeignKeyConstraint::new(
            self.name.as_str(),
            column_name,
            referenced_table_name,
            ID_FIELD_NAME,
        );
        self.foreign_keys.push(fk);
        self
    }

    pub fn index(mut self, columns: Vec<&str>) -> Self {
        let index = Index::new(self.name.as_str(), columns, false);
        self.indexes.push(index);
        self
    }
}

impl Column {
    pub fn new<T: Into<String>>(
        name: T,
        column_type: ColumnType,
        not_null: bool,
        unique: bool,
        default_value: Option<&str>,
    ) -> Self {
        Self {
            name: name.into(),
            column_type,
            not_null,
            unique,
            primary_key: false,
            default_value: default_value.map(str::to_string),
        }
    }

    pub fn primary_key<T: Into<String>>(name: T, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            not_null: false,
            unique: false,
            primary_key: true,
            default_value: None,
        }
    }

    fn required<T: Into<String>>(name: T, column_type: ColumnType) -> Self {
        Self::new(name, column_type, true, false, None)
    }

    fn optional<T: Into<String>>(name: T, column_type: ColumnType) -> Self {
        Self::new(name, column_type, false, false, None)
    }
}

impl ForeignKeyConstraint {
    pub fn new<T: Into<String>>(
        table_name: T,
        column_name: T,
        referenced_table_name: T,
        referenced_column_name: T,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            column_name: column_name.into(),
            referenced_table_name: referenced_table_name.into(),
            referenced_column_name: referenced_column_name.into(),
        }
    }
}

impl Index {
    pub fn new<T: Into<String>>(table_name: T, columns: Vec<T>, unique: bool) -> Self {
        Self {
            table_name: table_name.into(),
            columns: columns.into_iter().map(T::into).collect(),
            unique,
        }
    }
}

/// returns the tables the service needs, sorted conform dependency order
pub fn required_tables() -> Vec<Table> {
    vec![users_table(), projects_table(), media_table(), events_table()]
}

fn timestamps() -> [Column; 2] {
    [
        Column::new(
            CREATED_FIELD_NAME,
            ColumnType::TimestampTZ,
            true,
            false,
            Some("now()"),
        ),
        Column::new(
            UPDATED_FIELD_NAME,
            ColumnType::TimestampTZ,
            true,
            false,
            Some("now()"),
        ),
    ]
}

fn users_table() -> Table {
    let mut columns = vec![
        Column::primary_key(ID_FIELD_NAME, ColumnType::Uuid),
        Column::new("username", ColumnType::Text, true, true, None),
        Column::new("email", ColumnType::Text, true, true, None),
        Column::optional("name", ColumnType::Text),
        Column::optional("bio", ColumnType::Text),
        Column::optional("avatar_url", ColumnType::Text),
        Column::new("role", ColumnType::Text, true, false, Some("'VISITOR'")),
    ];
    columns.extend(timestamps());

    Table::new(USERS_TABLE_NAME, columns).check("role IN ('VISITOR', 'CREATOR')")
}

fn projects_table() -> Table {
    let mut columns = vec![
        Column::primary_key(ID_FIELD_NAME, ColumnType::Uuid),
        Column::required(USER_ID_FIELD_NAME, ColumnType::Uuid),
        Column::required("title", ColumnType::Text),
        Column::new("description", ColumnType::Text, true, false, Some("''")),
        Column::new("slug", ColumnType::Text, true, true, None),
        Column::optional("content", ColumnType::Text),
        Column::optional("cover_image", ColumnType::Text),
        Column::new("timeline", ColumnType::Jsonb, true, false, Some("'[]'")),
        Column::new("technologies", ColumnType::TextArray, true, false, Some("'{}'")),
        Column::new("outcomes", ColumnType::Jsonb, true, false, Some("'[]'")),
        Column::new(
            IS_PUBLISHED_FIELD_NAME,
            ColumnType::Boolean,
            true,
            false,
            Some("false"),
        ),
        Column::optional(PUBLISHED_FIELD_NAME, ColumnType::TimestampTZ),
    ];
    columns.extend(timestamps());

    // a published project always carries its publication time
    Table::new(PROJECTS_TABLE_NAME, columns)
        .check(format!(
            "NOT {} OR {} IS NOT NULL",
            IS_PUBLISHED_FIELD_NAME, PUBLISHED_FIELD_NAME
        ))
        .references(USER_ID_FIELD_NAME, USERS_TABLE_NAME)
        .index(vec![USER_ID_FIELD_NAME])
        .index(vec![IS_PUBLISHED_FIELD_NAME, USER_ID_FIELD_NAME])
}

fn media_table() -> Table {
    let columns = vec![
        Column::primary_key(ID_FIELD_NAME, ColumnType::Uuid),
        Column::required(PROJECT_ID_FIELD_NAME, ColumnType::Uuid),
        Column::required("media_type", ColumnType::Text),
        Column::required("url", ColumnType::Text),
        Column::optional("caption", ColumnType::Text),
        Column::new("sort_order", ColumnType::Integer, true, false, Some("0")),
        Column::new(
            CREATED_FIELD_NAME,
            ColumnType::TimestampTZ,
            true,
            false,
            Some("now()"),
        ),
    ];

    Table::new(MEDIA_TABLE_NAME, columns)
        .check("media_type IN ('IMAGE', 'VIDEO')")
        .references(PROJECT_ID_FIELD_NAME, PROJECTS_TABLE_NAME)
        .index(vec![PROJECT_ID_FIELD_NAME, "sort_order"])
}

/// Events only reference users and projects by id; they carry no foreign keys
/// so that they survive the deletion of what they point to.
fn events_table() -> Table {
    let columns = vec![
        Column::primary_key(ID_FIELD_NAME, ColumnType::Uuid),
        Column::required(EVENT_KIND_FIELD_NAME, ColumnType::Text),
        Column::required(OWNER_ID_FIELD_NAME, ColumnType::Uuid),
        Column::optional(PROJECT_ID_FIELD_NAME, ColumnType::Uuid),
        Column::optional(VISITOR_ID_FIELD_NAME, ColumnType::Uuid),
        Column::optional(REFERRER_FIELD_NAME, ColumnType::Text),
        Column::optional(METADATA_FIELD_NAME, ColumnType::Jsonb),
        Column::new(
            CREATED_FIELD_NAME,
            ColumnType::TimestampTZ,
            true,
            false,
            Some("now()"),
        ),
    ];

    Table::new(EVENTS_TABLE_NAME, columns)
        .check(format!(
            "{} IN ('PORTFOLIO_VISIT', 'PROJECT_VIEW')",
            EVENT_KIND_FIELD_NAME
        ))
        .check(format!(
            "{} <> 'PROJECT_VIEW' OR {} IS NOT NULL",
            EVENT_KIND_FIELD_NAME, PROJECT_ID_FIELD_NAME
        ))
        .index(vec![OWNER_ID_FIELD_NAME, EVENT_KIND_FIELD_NAME, CREATED_FIELD_NAME])
        .index(vec![PROJECT_ID_FIELD_NAME, CREATED_FIELD_NAME])
}
