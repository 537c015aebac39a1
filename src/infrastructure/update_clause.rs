use std::str::FromStr;

use crate::{
    domain::{
        error::ClauseError, field_mapping::SqlType, sql_dialect::DialectDescriptor,
        validation::ValidationReport,
    },
    infrastructure::type_inference::{is_numeric_literal, parse_boolean},
};

#[derive(Debug, Clone, PartialEq)]
pub enum ClauseValue {
    Null,
    Text(String),
    /// Numeric literal kept as written.
    Number(String),
    Boolean(bool),
    List(Vec<ClauseValue>),
}

impl ClauseValue {
    /// Converts a raw cell using the column's inferred type. Cells that do not
    /// fit a numeric or boolean column stay text.
    pub fn from_cell(raw: &str, sql_type: SqlType) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return ClauseValue::Null;
        }
        if sql_type.is_numeric() && is_numeric_literal(trimmed) {
            return ClauseValue::Number(trimmed.to_string());
        }
        if sql_type == SqlType::Boolean {
            if let Some(flag) = parse_boolean(trimmed) {
                return ClauseValue::Boolean(flag);
            }
        }
        ClauseValue::Text(raw.to_string())
    }

    /// Literal as written by INSERT statements of the same dialect.
    pub fn to_sql(&self, dialect: &DialectDescriptor) -> String {
        match self {
            ClauseValue::Null => "NULL".to_string(),
            ClauseValue::Text(text) => dialect.quote_string(text),
            ClauseValue::Number(number) => number.clone(),
            ClauseValue::Boolean(flag) => dialect.boolean_literal(*flag).to_string(),
            ClauseValue::List(items) => format!(
                "({})",
                items
                    .iter()
                    .map(|item| item.to_sql(dialect))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhereOperator {
    Eq,
    NotEq,
    NotEqAnsi,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Like,
    NotLike,
    In,
    NotIn,
    IsNull,
    IsNotNull,
}

impl WhereOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            WhereOperator::Eq => "=",
            WhereOperator::NotEq => "!=",
            WhereOperator::NotEqAnsi => "<>",
            WhereOperator::Lt => "<",
            WhereOperator::Gt => ">",
            WhereOperator::LtEq => "<=",
            WhereOperator::GtEq => ">=",
            WhereOperator::Like => "LIKE",
            WhereOperator::NotLike => "NOT LIKE",
            WhereOperator::In => "IN",
            WhereOperator::NotIn => "NOT IN",
            WhereOperator::IsNull => "IS NULL",
            WhereOperator::IsNotNull => "IS NOT NULL",
        }
    }

    pub fn takes_list(self) -> bool {
        matches!(self, WhereOperator::In | WhereOperator::NotIn)
    }

    pub fn takes_no_value(self) -> bool {
        matches!(self, WhereOperator::IsNull | WhereOperator::IsNotNull)
    }
}

impl FromStr for WhereOperator {
    type Err = ClauseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();
        match normalized.as_str() {
            "=" => Ok(WhereOperator::Eq),
            "!=" => Ok(WhereOperator::NotEq),
            "<>" => Ok(WhereOperator::NotEqAnsi),
            "<" => Ok(WhereOperator::Lt),
            ">" => Ok(WhereOperator::Gt),
            "<=" => Ok(WhereOperator::LtEq),
            ">=" => Ok(WhereOperator::GtEq),
            "LIKE" => Ok(WhereOperator::Like),
            "NOT LIKE" => Ok(WhereOperator::NotLike),
            "IN" => Ok(WhereOperator::In),
            "NOT IN" => Ok(WhereOperator::NotIn),
            "IS NULL" => Ok(WhereOperator::IsNull),
            "IS NOT NULL" => Ok(WhereOperator::IsNotNull),
            _ => Err(ClauseError::InvalidOperator(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalJoin {
    And,
    Or,
}

impl LogicalJoin {
    pub fn as_str(self) -> &'static str {
        match self {
            LogicalJoin::And => "AND",
            LogicalJoin::Or => "OR",
        }
    }
}

impl FromStr for LogicalJoin {
    type Err = ClauseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(LogicalJoin::And),
            "OR" => Ok(LogicalJoin::Or),
            _ => Err(ClauseError::InvalidJoin(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetAssignment {
    pub field: String,
    pub value: ClauseValue,
    pub sql_type: SqlType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhereCondition {
    pub field: String,
    pub operator: WhereOperator,
    pub value: ClauseValue,
    pub sql_type: SqlType,
    pub join: LogicalJoin,
}

/// Collects the SET and WHERE parts of a single UPDATE statement.
///
/// Holds one row at a time; call [`UpdateClauseBuilder::reset`] before
/// reusing it for the next row.
#[derive(Debug, Clone)]
pub struct UpdateClauseBuilder {
    table: String,
    set_fields: Vec<SetAssignment>,
    conditions: Vec<WhereCondition>,
}

impl UpdateClauseBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            set_fields: Vec::new(),
            conditions: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        self.set_fields.clear();
        self.conditions.clear();
    }

    /// Adds an assignment. A second assignment to the same field replaces the
    /// value of the first and keeps its position.
    pub fn add_set_field(
        &mut self,
        name: &str,
        value: ClauseValue,
        sql_type: SqlType,
    ) -> &mut Self {
        match self.set_fields.iter_mut().find(|set| set.field == name) {
            Some(existing) => {
                existing.value = value;
                existing.sql_type = sql_type;
            }
            None => self.set_fields.push(SetAssignment {
                field: name.to_string(),
                value,
                sql_type,
            }),
        }
        self
    }

    pub fn add_where_condition(
        &mut self,
        name: &str,
        operator: &str,
        value: ClauseValue,
        sql_type: SqlType,
        join: &str,
    ) -> Result<&mut Self, ClauseError> {
        let operator = operator.parse::<WhereOperator>()?;
        let join = join.parse::<LogicalJoin>()?;

        let non_empty_list = matches!(&value, ClauseValue::List(items) if !items.is_empty());
        if operator.takes_list() && !non_empty_list {
            return Err(ClauseError::ExpectedList {
                field: name.to_string(),
                operator: operator.as_str().to_string(),
            });
        }

        self.conditions.push(WhereCondition {
            field: name.to_string(),
            operator,
            value,
            sql_type,
            join,
        });
        Ok(self)
    }

    pub fn set_fields(&self) -> &[SetAssignment] {
        &self.set_fields
    }

    pub fn conditions(&self) -> &[WhereCondition] {
        &self.conditions
    }

    /// A statement without a table, without assignments or without a WHERE
    /// clause is rejected; assigning a field that is also filtered on is
    /// allowed but reported.
    pub fn validate(&self) -> ValidationReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if self.table.trim().is_empty() {
            errors.push("Table name is required".to_string());
        }
        if self.set_fields.is_empty() {
            errors.push("At least one SET field is required".to_string());
        }
        if self.conditions.is_empty() {
            errors.push("At least one WHERE condition is required".to_string());
        }
        for set in &self.set_fields {
            if self.conditions.iter().any(|condition| condition.field == set.field) {
                warnings.push(format!(
                    "Field `{}` is both assigned and used as a filter",
                    set.field
                ));
            }
        }

        ValidationReport::from_findings(errors, warnings)
    }

    pub fn build_set_clause(&self, dialect: &DialectDescriptor) -> String {
        self.set_fields
            .iter()
            .map(|set| {
                format!(
                    "{} = {}",
                    dialect.quote_identifier(&set.field),
                    set.value.to_sql(dialect)
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn build_where_clause(&self, dialect: &DialectDescriptor) -> String {
        let mut clause = String::new();
        for (position, condition) in self.conditions.iter().enumerate() {
            if position > 0 {
                clause.push(' ');
                clause.push_str(condition.join.as_str());
                clause.push(' ');
            }
            clause.push_str(&dialect.quote_identifier(&condition.field));
            clause.push(' ');
            clause.push_str(condition.operator.as_str());
            if !condition.operator.takes_no_value() {
                clause.push(' ');
                clause.push_str(&condition.value.to_sql(dialect));
            }
        }
        clause
    }

    /// Renders the whole statement, terminated with `;`.
    pub fn build(&self, dialect: &DialectDescriptor) -> String {
        let mut statement = format!(
            "UPDATE {} SET {}",
            dialect.quote_identifier(&self.table),
            self.build_set_clause(dialect)
        );
        if !self.conditions.is_empty() {
            statement.push_str(" WHERE ");
            statement.push_str(&self.build_where_clause(dialect));
        }
        statement.push(';');
        statement
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sql_dialect::SqlDialectKind;

    fn mysql() -> &'static DialectDescriptor {
        SqlDialectKind::MySql.descriptor()
    }

    #[test]
    fn renders_update_statement() {
        let mut builder = UpdateClauseBuilder::new("users");
        builder
            .add_set_field("name", ClauseValue::Text("O'Brien".into()), SqlType::ShortText)
            .add_set_field("active", ClauseValue::Boolean(true), SqlType::Boolean);
        builder
            .add_where_condition(
                "id",
                "=",
                ClauseValue::Number("7".into()),
                SqlType::Integer,
                "AND",
            )
            .expect("condition should be accepted");

        assert_eq!(
            builder.build(mysql()),
            "UPDATE `users` SET `name` = 'O''Brien', `active` = TRUE WHERE `id` = 7;"
        );
    }

    #[test]
    fn values_follow_dialect_literals() {
        let mut builder = UpdateClauseBuilder::new("users");
        builder
            .add_set_field("active", ClauseValue::Boolean(false), SqlType::Boolean)
            .add_set_field("path", ClauseValue::Text(r"C:\tmp".into()), SqlType::ShortText);
        builder
            .add_where_condition(
                "id",
                "=",
                ClauseValue::Number("1".into()),
                SqlType::Integer,
                "AND",
            )
            .expect("condition should be accepted");

        assert_eq!(
            builder.build(SqlDialectKind::SqlServer.descriptor()),
            r"UPDATE [users] SET [active] = 0, [path] = 'C:\tmp' WHERE [id] = 1;"
        );
        assert_eq!(
            builder.build_set_clause(mysql()),
            r"`active` = FALSE, `path` = 'C:\\tmp'"
        );
    }

    #[test]
    fn last_set_write_wins() {
        let mut builder = UpdateClauseBuilder::new("users");
        builder
            .add_set_field("status", ClauseValue::Text("old".into()), SqlType::ShortText)
            .add_set_field("score", ClauseValue::Number("1".into()), SqlType::Integer)
            .add_set_field("status", ClauseValue::Null, SqlType::ShortText);

        assert_eq!(builder.set_fields().len(), 2);
        assert_eq!(builder.build_set_clause(mysql()), "`status` = NULL, `score` = 1");
    }

    #[test]
    fn rejects_unknown_operator_and_join() {
        let mut builder = UpdateClauseBuilder::new("users");

        let error = builder
            .add_where_condition("id", "===", ClauseValue::Null, SqlType::Integer, "AND")
            .expect_err("operator should be rejected");
        assert_eq!(error, ClauseError::InvalidOperator("===".to_string()));

        let error = builder
            .add_where_condition("id", "=", ClauseValue::Null, SqlType::Integer, "XOR")
            .expect_err("join should be rejected");
        assert_eq!(error, ClauseError::InvalidJoin("XOR".to_string()));
        assert!(builder.conditions().is_empty());
    }

    #[test]
    fn renders_list_and_null_operators_with_joins() {
        let mut builder = UpdateClauseBuilder::new("orders");
        builder.add_set_field("state", ClauseValue::Text("paid".into()), SqlType::ShortText);
        builder
            .add_where_condition(
                "id",
                "in",
                ClauseValue::List(vec![
                    ClauseValue::Number("1".into()),
                    ClauseValue::Number("2".into()),
                ]),
                SqlType::Integer,
                "and",
            )
            .expect("IN with a list should be accepted")
            .add_where_condition(
                "deleted_at",
                "is  null",
                ClauseValue::Null,
                SqlType::DateTime,
                "AND",
            )
            .expect("IS NULL should be accepted")
            .add_where_condition(
                "note",
                "NOT LIKE",
                ClauseValue::Text("%test%".into()),
                SqlType::ShortText,
                "or",
            )
            .expect("NOT LIKE should be accepted");

        assert_eq!(
            builder.build_where_clause(SqlDialectKind::PostgreSql.descriptor()),
            "\"id\" IN (1, 2) AND \"deleted_at\" IS NULL OR \"note\" NOT LIKE '%test%'"
        );
    }

    #[test]
    fn in_operator_requires_a_list() {
        let mut builder = UpdateClauseBuilder::new("orders");
        let error = builder
            .add_where_condition(
                "id",
                "NOT IN",
                ClauseValue::Number("1".into()),
                SqlType::Integer,
                "AND",
            )
            .expect_err("scalar value should be rejected");

        assert_eq!(
            error,
            ClauseError::ExpectedList {
                field: "id".to_string(),
                operator: "NOT IN".to_string(),
            }
        );
    }

    #[test]
    fn in_operator_rejects_an_empty_list() {
        let mut builder = UpdateClauseBuilder::new("orders");
        let error = builder
            .add_where_condition(
                "id",
                "IN",
                ClauseValue::List(Vec::new()),
                SqlType::Integer,
                "AND",
            )
            .expect_err("empty list should be rejected");

        assert_eq!(
            error,
            ClauseError::ExpectedList {
                field: "id".to_string(),
                operator: "IN".to_string(),
            }
        );
        assert!(builder.conditions().is_empty());
    }

    #[test]
    fn validation_requires_table_set_and_where() {
        let empty = UpdateClauseBuilder::new(" ");
        let report = empty.validate();
        assert!(!report.is_valid);
        assert_eq!(report.errors.len(), 3);

        let mut builder = UpdateClauseBuilder::new("users");
        builder.add_set_field("id", ClauseValue::Number("2".into()), SqlType::Integer);
        builder
            .add_where_condition(
                "id",
                "=",
                ClauseValue::Number("1".into()),
                SqlType::Integer,
                "AND",
            )
            .expect("condition should be accepted");
        let report = builder.validate();
        assert!(report.is_valid);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn reset_clears_previous_row() {
        let mut builder = UpdateClauseBuilder::new("users");
        builder.add_set_field("a", ClauseValue::Null, SqlType::ShortText);
        builder.reset();

        assert!(builder.set_fields().is_empty());
        assert!(builder.conditions().is_empty());
    }

    #[test]
    fn cell_conversion_follows_column_type() {
        assert_eq!(ClauseValue::from_cell(" ", SqlType::Integer), ClauseValue::Null);
        assert_eq!(
            ClauseValue::from_cell("42", SqlType::Integer),
            ClauseValue::Number("42".into())
        );
        assert_eq!(
            ClauseValue::from_cell("n/a", SqlType::Decimal),
            ClauseValue::Text("n/a".into())
        );
        assert_eq!(ClauseValue::from_cell("yes", SqlType::Boolean), ClauseValue::Boolean(true));
        assert_eq!(
            ClauseValue::from_cell("42", SqlType::ShortText),
            ClauseValue::Text("42".into())
        );
    }
}
