use crate::domain::{
    persistence::Persistence,
    tables::{Column, ForeignKeyConstraint, Index, Table, required_tables},
};

pub trait MigrationStep {
    fn ctx(&self) -> &'static str;
    fn ddls(self) -> Vec<String>;
}

pub struct CreateTableStep {
    table_name: String,
    ddls: Vec<String>,
}

impl CreateTableStep {
    fn new(database_schema: &str, table: &Table) -> Self {
        let ddls = create_table_ddl(database_schema, table);
        Self {
            table_name: table.name.clone(),
            ddls,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

impl MigrationStep for CreateTableStep {
    fn ctx(&self) -> &'static str {
        "CREATE TABLE"
    }

    fn ddls(self) -> Vec<String> {
        self.ddls
    }
}

/// Brings the database schema in line with the tables the service needs.
/// Existing tables are left untouched.
pub struct Migration<P: Persistence> {
    persistence: P,
}

impl<P: Persistence> Migration<P> {
    pub fn new(persistence: P) -> Self {
        Self { persistence }
    }

    pub async fn migrate(&self) -> Result<usize, anyhow::Error> {
        let steps = migration_steps(&self.persistence).await?;
        let applied = steps.len();
        for step in steps.iter() {
            tracing::info!(table = step.table_name(), "creating table");
        }
        self.persistence.apply_migration_steps(steps).await?;
        Ok(applied)
    }
}

pub async fn migration_steps(
    persistence: &impl Persistence,
) -> Result<Vec<CreateTableStep>, anyhow::Error> {
    let database_schema = persistence.database_schema();
    let actual_schema = persistence.load().await?;

    let mut result = Vec::new();

    for table in required_tables() {
        if !actual_schema.contains(&table.name) {
            result.push(CreateTableStep::new(database_schema, &table));
        }
    }

    Ok(result)
}

fn create_table_ddl(schema: &str, table: &Table) -> Vec<String> {
    let mut columns = Vec::new();
    let mut pk_columns = Vec::new();

    for column in table.columns.iter() {
        columns.push(column_ddl(column));
        if column.primary_key {
            pk_columns.push(&column.name as &str);
        }
    }

    for check in table.checks.iter() {
        columns.push(format!("CHECK ({})", check));
    }

    let columns_sql = columns.join(",\n    ");
    let pk_columns_sql = pk_columns.join(",");

    let table_ddl = format!(
        "CREATE TABLE \"{}\".\"{}\" (\n    {},\n    PRIMARY KEY({})\n)",
        schema, table.name, columns_sql, pk_columns_sql
    );

    let mut ddls = vec![table_ddl];

    for fk in table.foreign_keys.iter() {
        ddls.push(create_fk_ddl(schema, fk));
    }

    for index in table.indexes.iter() {
        ddls.push(create_index_ddl(schema, index));
    }

    ddls
}

fn column_ddl(column: &Column) -> String {
    let mut sql = format!("\"{}\" {}", column.name, column.column_type);
    if column.not_null {
        sql.push_str(" NOT NULL");
    }
    if let Some(default_value) = &column.default_value {
        sql.push_str(format!(" DEFAULT {}", default_value).as_str());
    }
    if column.unique {
        sql.push_str(" UNIQUE");
    }
    sql
}

fn create_fk_ddl(schema: &str, fk: &ForeignKeyConstraint) -> String {
    format!(
        "ALTER TABLE \"{}\".\"{}\" ADD CONSTRAINT \"{}_{}_fkey\" FOREIGN KEY (\"{}\") REFERENCES \"{}\".\"{}\" (\"{}\") ON DELETE CASCADE",
        schema,
        fk.table_name,
        fk.table_name,
        fk.column_name,
        fk.column_name,
        schema,
        fk.referenced_table_name,
        fk.referenced_column_name
    )
}

fn create_index_ddl(schema: &str, index: &Index) -> String {
    let columns_sql = index
        .columns
        .iter()
        .map(|c| format!("\"{}\"", c))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "CREATE {}INDEX \"{}_{}_idx\" ON \"{}\".\"{}\" ({})",
        if index.unique { "UNIQUE " } else { "" },
        index.table_name,
        index.columns.join("_"),
        schema,
        index.table_name,
        columns_sql
    )
}
