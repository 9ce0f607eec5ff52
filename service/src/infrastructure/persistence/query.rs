use chrono::{DateTime, Utc};
use sqlx::{Postgres, postgres::PgArguments, query::Query};
use uuid::Uuid;

use crate::infrastructure::persistence::schema::{ColumnRef, Table};

/// Composable SELECT builder with positional parameters
#[derive(Debug, Clone)]
pub struct QueryBuilder<'a> {
    from_table: Table<'a>,
    select: Vec<Selection<'a>>,
    where_conditions: Vec<Condition<'a>>,
    group_by: Vec<String>,
    order_by: Vec<OrderBy>,
    joins: Vec<Join<'a>>,
}

/// One item of the SELECT list
#[derive(Debug, Clone)]
pub enum Selection<'a> {
    Column(ColumnRef<'a>),
    /// Raw SQL expression, e.g. an aggregate, selected under an alias
    Expression { sql: String, alias: &'static str },
}

/// A where condition that will be AND'ed together
#[derive(Debug, Clone)]
pub enum Condition<'a> {
    /// field = value
    Equals {
        column: ColumnRef<'a>,
        value: ConditionValue,
    },

    /// field >= value
    GreaterThanOrEqual {
        column: ColumnRef<'a>,
        value: ConditionValue,
    },

    /// field <= value
    LessThanOrEqual {
        column: ColumnRef<'a>,
        value: ConditionValue,
    },

    /// field IN (values)
    In {
        column: ColumnRef<'a>,
        values: Vec<ConditionValue>,
    },
}

#[derive(Debug, Clone)]
pub enum ConditionValue {
    Text(String),
    Boolean(bool),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
}

#[derive(Debug, Clone)]
pub struct OrderBy {
    pub expression: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// INNER JOIN on one column pair
#[derive(Debug, Clone)]
pub struct Join<'a> {
    pub target_table: Table<'a>,
    pub main_column: ColumnRef<'a>,
    pub target_column: ColumnRef<'a>,
}

impl<'a> From<Table<'a>> for QueryBuilder<'a> {
    fn from(value: Table<'a>) -> Self {
        QueryBuilder {
            from_table: value,
            select: vec![],
            where_conditions: vec![],
            group_by: vec![],
            order_by: vec![],
            joins: vec![],
        }
    }
}

impl<'a> QueryBuilder<'a> {
    /// Select specified columns
    pub fn select(mut self, columns: Vec<ColumnRef<'a>>) -> Self {
        self.select = columns.into_iter().map(Selection::Column).collect();
        self
    }

    /// Add an aliased expression to the SELECT list
    pub fn select_expression(mut self, sql: impl Into<String>, alias: &'static str) -> Self {
        self.select.push(Selection::Expression {
            sql: sql.into(),
            alias,
        });
        self
    }

    /// Add where condition
    pub fn where_condition(mut self, condition: Condition<'a>) -> Self {
        self.where_conditions.push(condition);
        self
    }

    pub fn join(
        mut self,
        target_table: Table<'a>,
        main_column: ColumnRef<'a>,
        target_column: ColumnRef<'a>,
    ) -> Self {
        self.joins.push(Join {
            target_table,
            main_column,
            target_column,
        });
        self
    }

    pub fn group_by(mut self, expression: impl Into<String>) -> Self {
        self.group_by.push(expression.into());
        self
    }

    pub fn order_by(mut self, expression: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by.push(OrderBy {
            expression: expression.into(),
            direction,
        });
        self
    }

    /// Build the SQL query string
    pub fn build(self) -> (String, Vec<SqlParameter>) {
        let mut sql = String::new();
        let mut params = Vec::new();
        let mut param_counter = 1;

        // SELECT clause
        sql.push_str("SELECT ");
        let columns: Vec<String> = self
            .select
            .iter()
            .map(|s| match s {
                Selection::Column(c) => c.qualified(),
                Selection::Expression { sql, alias } => format!("{} AS \"{}\"", sql, alias),
            })
            .collect();
        sql.push_str(&columns.join(", "));

        // FROM clause
        sql.push_str(&format!("\nFROM {}", self.from_table.qualified()));

        // JOIN clauses
        for join in &self.joins {
            sql.push_str(&format!(
                "\nINNER JOIN {} ON {} = {}",
                join.target_table.qualified(),
                join.main_column.qualified(),
                join.target_column.qualified()
            ));
        }

        // WHERE clause
        if !self.where_conditions.is_empty() {
            sql.push_str("\nWHERE ");
            let mut where_sql = Vec::new();
            for condition in &self.where_conditions {
                let (cond_sql, cond_params) = condition.to_sql(&mut param_counter);
                where_sql.push(cond_sql);
                params.extend(cond_params);
            }
            sql.push_str(&where_sql.join(" AND "));
        }

        // GROUP BY clause
        if !self.group_by.is_empty() {
            sql.push_str("\nGROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }

        // ORDER BY clause
        if !self.order_by.is_empty() {
            sql.push_str("\nORDER BY ");
            let order_clauses: Vec<String> = self
                .order_by
                .iter()
                .map(|ob| {
                    let direction = match ob.direction {
                        SortDirection::Ascending => "ASC",
                        SortDirection::Descending => "DESC",
                    };
                    format!("{} {}", ob.expression, direction)
                })
                .collect();
            sql.push_str(&order_clauses.join(", "));
        }

        (sql, params)
    }
}

impl Condition<'_> {
    pub fn to_sql(&self, param_counter: &mut usize) -> (String, Vec<SqlParameter>) {
        match self {
            Condition::Equals { column, value } => {
                let sql = format!("{} = ${}", column.qualified(), param_counter);
                *param_counter += 1;
                (sql, vec![value.into()])
            }

            Condition::GreaterThanOrEqual { column, value } => {
                let sql = format!("{} >= ${}", column.qualified(), param_counter);
                *param_counter += 1;
                (sql, vec![value.into()])
            }

            Condition::LessThanOrEqual { column, value } => {
                let sql = format!("{} <= ${}", column.qualified(), param_counter);
                *param_counter += 1;
                (sql, vec![value.into()])
            }

            Condition::In { column, values } => {
                let placeholders: Vec<String> = values
                    .iter()
                    .map(|_| {
                        let placeholder = format!("${}", param_counter);
                        *param_counter += 1;
                        placeholder
                    })
                    .collect();

                let sql = format!("{} IN ({})", column.qualified(), placeholders.join(", "));
                let params: Vec<SqlParameter> = values.iter().map(|v| v.into()).collect();
                (sql, params)
            }
        }
    }
}

impl From<&ConditionValue> for SqlParameter {
    fn from(value: &ConditionValue) -> Self {
        match value {
            ConditionValue::Text(s) => SqlParameter::Text(s.clone()),
            ConditionValue::Boolean(b) => SqlParameter::Boolean(*b),
            ConditionValue::Uuid(u) => SqlParameter::Uuid(*u),
            ConditionValue::Timestamp(t) => SqlParameter::Timestamp(*t),
        }
    }
}

// SQL parameter that will be bound to query
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParameter {
    Text(String),
    Boolean(bool),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
}

impl SqlParameter {
    /// Bind to sqlx query
    pub fn bind_to_query<'q>(
        self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments> {
        match self {
            SqlParameter::Text(s) => query.bind(s),
            SqlParameter::Boolean(b) => query.bind(b),
            SqlParameter::Uuid(u) => query.bind(u),
            SqlParameter::Timestamp(t) => query.bind(t),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;
    use crate::infrastructure::persistence::schema::{Column, EVENTS, PROJECTS};

    #[test]
    fn test_simple_select() {
        let table = Table {
            name: "projects",
            alias: "t",
        };
        let builder = QueryBuilder::from(table)
            .select(vec![Cow::Owned(Column {
                qualifier: "t",
                name: "id",
            })])
            .where_condition(Condition::Equals {
                column: Cow::Owned(Column {
                    qualifier: "t",
                    name: "is_published",
                }),
                value: ConditionValue::Boolean(false),
            });

        let (sql, params) = builder.build();

        assert!(sql.contains("SELECT \"t\".\"id\"\nFROM \"projects\" AS \"t\""));
        assert!(sql.contains("WHERE \"t\".\"is_published\" = $1"));
        assert_eq!(params, vec![SqlParameter::Boolean(false)]);
    }

    #[test]
    fn test_grouped_join_numbers_parameters_in_order() {
        let owner = Uuid::new_v4();
        let since = Utc::now();
        let (sql, params) = QueryBuilder::from(EVENTS)
            .select(vec![Cow::Owned(PROJECTS.column("id"))])
            .select_expression("COUNT(*)", "count")
            .join(
                PROJECTS,
                Cow::Owned(EVENTS.column("project_id")),
                Cow::Owned(PROJECTS.column("id")),
            )
            .where_condition(Condition::Equals {
                column: Cow::Owned(EVENTS.column("owner_id")),
                value: ConditionValue::Uuid(owner),
            })
            .where_condition(Condition::GreaterThanOrEqual {
                column: Cow::Owned(EVENTS.column("created_at")),
                value: ConditionValue::Timestamp(since),
            })
            .group_by("\"p\".\"id\"")
            .order_by("\"count\"", SortDirection::Descending)
            .build();

        assert!(sql.contains("COUNT(*) AS \"count\""));
        assert!(
            sql.contains("INNER JOIN \"projects\" AS \"p\" ON \"e\".\"project_id\" = \"p\".\"id\"")
        );
        assert!(sql.contains("\"e\".\"owner_id\" = $1 AND \"e\".\"created_at\" >= $2"));
        assert!(sql.contains("GROUP BY \"p\".\"id\"\nORDER BY \"count\" DESC"));
        assert_eq!(
            params,
            vec![SqlParameter::Uuid(owner), SqlParameter::Timestamp(since)]
        );
    }
}
