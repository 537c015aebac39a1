use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, warn};

use crate::{
    domain::{
        error::{ConfigError, GenerationError},
        field_mapping::{FieldMapping, SqlType},
        generation::{
            GenerationConfig, GenerationMetadata, GenerationResult, InsertMode, Operation,
        },
        raw_table::RawTable,
        row_batch::{BatchSize, RowBatchSlicer},
        settings::Settings,
        sql_dialect::{DialectDescriptor, IgnoreStrategy, UpsertStrategy},
    },
    infrastructure::{
        type_inference::{is_numeric_literal, parse_boolean, sanitize_name},
        update_clause::{ClauseValue, UpdateClauseBuilder, WhereOperator},
    },
};

/// Fixed per-statement cost used by [`estimate_size`], on top of the header
/// names repeated in every batch.
const BATCH_OVERHEAD_BYTES: usize = 64;

/// Operator suffixes accepted on WHERE-marked UPDATE columns, e.g.
/// `where_age__gte`.
const OPERATOR_SUFFIXES: [(&str, WhereOperator); 12] = [
    ("eq", WhereOperator::Eq),
    ("ne", WhereOperator::NotEq),
    ("lt", WhereOperator::Lt),
    ("gt", WhereOperator::Gt),
    ("lte", WhereOperator::LtEq),
    ("gte", WhereOperator::GtEq),
    ("like", WhereOperator::Like),
    ("not_like", WhereOperator::NotLike),
    ("in", WhereOperator::In),
    ("not_in", WhereOperator::NotIn),
    ("is_null", WhereOperator::IsNull),
    ("is_not_null", WhereOperator::IsNotNull),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnRole {
    Set,
    Where {
        operator: WhereOperator,
        join: &'static str,
    },
}

#[derive(Debug, Clone)]
struct UpdateColumn {
    index: usize,
    field: String,
    sql_type: SqlType,
    role: ColumnRole,
}

/// Renders INSERT or UPDATE scripts for one validated configuration.
#[derive(Debug)]
pub struct SqlGenerator<'a> {
    config: GenerationConfig<'a>,
    dialect: &'static DialectDescriptor,
    columns: Vec<&'a FieldMapping>,
    settings: &'a Settings,
}

impl<'a> SqlGenerator<'a> {
    /// Checks the configuration up front so that no SQL is produced for a
    /// configuration that cannot be rendered.
    pub fn new(config: GenerationConfig<'a>, settings: &'a Settings) -> Result<Self, ConfigError> {
        if config.table_name.trim().is_empty() {
            return Err(ConfigError::MissingTableName);
        }
        if config.field_mappings.is_empty() {
            return Err(ConfigError::MissingFieldMappings);
        }

        let dialect = config.dialect.descriptor();
        let header_count = config.table.columns();
        for header in &config.table.headers {
            if config.field_mappings.get(header).is_none() {
                return Err(ConfigError::MissingMapping(header.clone()));
            }
        }
        let mut columns = Vec::with_capacity(config.field_mappings.len());
        for mapping in config.field_mappings {
            if mapping.column_index >= header_count {
                return Err(ConfigError::MissingMapping(mapping.source_header.clone()));
            }
            columns.push(mapping);
        }

        if config.operation == Operation::Insert {
            match config.options.insert_mode {
                InsertMode::Ignore if dialect.ignore_insert == IgnoreStrategy::Unsupported => {
                    return Err(ConfigError::UnsupportedByDialect {
                        feature: "Ignore insert mode",
                        dialect: config.dialect.as_str(),
                    });
                }
                InsertMode::Update if dialect.upsert == UpsertStrategy::Unsupported => {
                    return Err(ConfigError::UnsupportedByDialect {
                        feature: "Upsert insert mode",
                        dialect: config.dialect.as_str(),
                    });
                }
                _ => {}
            }
        }

        Ok(Self {
            config,
            dialect,
            columns,
            settings,
        })
    }

    pub fn generate(&self) -> Result<GenerationResult, GenerationError> {
        self.generate_at(Utc::now())
    }

    pub fn generate_at(
        &self,
        generated_at: DateTime<Utc>,
    ) -> Result<GenerationResult, GenerationError> {
        let options = &self.config.options;
        let record_count = self.config.table.total_rows();
        let mut sql = String::new();

        if options.include_comments {
            self.write_header_comment(&mut sql, generated_at);
        }
        if options.include_transaction {
            sql.push_str(self.dialect.begin_transaction);
            sql.push_str("\n\n");
        }

        let body = match self.config.operation {
            Operation::Insert => self.write_insert_body(&mut sql),
            Operation::Update => self.write_update_body(&mut sql),
        };
        let batch_count = match body {
            Ok(batch_count) => batch_count,
            Err(error) => {
                if options.include_transaction {
                    sql.push_str(self.dialect.rollback_transaction);
                    sql.push('\n');
                }
                debug!(%error, discarded_bytes = sql.len(), "generation aborted");
                return Err(error);
            }
        };

        if options.include_transaction {
            sql.push_str(self.dialect.commit_transaction);
            sql.push('\n');
        }
        if options.include_comments {
            sql.push_str(&format!(
                "\n-- Summary: {record_count} records, {batch_count} batches\n"
            ));
        }

        debug!(
            operation = %self.config.operation,
            dialect = %self.config.dialect,
            record_count,
            batch_count,
            "generated sql"
        );

        Ok(GenerationResult {
            sql,
            metadata: GenerationMetadata {
                operation: self.config.operation,
                dialect: self.config.dialect,
                table: self.config.table_name.clone(),
                record_count,
                batch_count,
                generated_at,
            },
            success: true,
        })
    }

    fn write_header_comment(&self, sql: &mut String, generated_at: DateTime<Utc>) {
        let database = if self.config.database_name.trim().is_empty() {
            "(none)".to_string()
        } else {
            comment_text(&self.config.database_name)
        };
        sql.push_str("-- Generated by csv2sql\n");
        sql.push_str(&format!("-- Operation: {}\n", self.config.operation));
        sql.push_str(&format!("-- Database: {database}\n"));
        sql.push_str(&format!(
            "-- Table: {}\n",
            comment_text(&self.config.table_name)
        ));
        sql.push_str(&format!("-- Dialect: {}\n", self.config.dialect));
        sql.push_str(&format!(
            "-- Generated at: {}\n\n",
            generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        ));
    }

    fn quoted_table(&self) -> String {
        self.dialect.quote_identifier(&self.config.table_name)
    }

    fn write_insert_body(&self, sql: &mut String) -> Result<usize, GenerationError> {
        let options = &self.config.options;
        if options.include_create_table {
            sql.push_str(&self.create_table_statement());
            sql.push_str("\n\n");
        }

        let rows = &self.config.table.rows;
        let slicer = RowBatchSlicer::new(rows.len(), options.batch_size);
        let batch_count = slicer.batch_count();
        let column_list = self
            .columns
            .iter()
            .map(|mapping| self.dialect.quote_identifier(&mapping.sanitized_name))
            .collect::<Vec<_>>()
            .join(", ");
        let keyword = match (options.insert_mode, self.dialect.ignore_insert) {
            (InsertMode::Ignore, IgnoreStrategy::Keyword(keyword)) => keyword,
            _ => "INSERT INTO",
        };
        let suffix = self.insert_suffix();

        for (batch_index, range) in slicer.iter_ranges().enumerate() {
            if options.include_comments {
                sql.push_str(&format!(
                    "-- Batch {}/{} ({} rows)\n",
                    batch_index + 1,
                    batch_count,
                    range.len()
                ));
            }
            sql.push_str(&format!(
                "{keyword} {} ({column_list}) VALUES\n",
                self.quoted_table()
            ));
            let values = rows[range]
                .iter()
                .map(|row| format!("  ({})", self.insert_values(row)))
                .collect::<Vec<_>>()
                .join(",\n");
            sql.push_str(&values);
            sql.push_str(&suffix);
            sql.push_str(";\n\n");
        }

        Ok(batch_count)
    }

    fn insert_values(&self, row: &[String]) -> String {
        self.columns
            .iter()
            .map(|mapping| {
                let raw = row.get(mapping.column_index).map_or("", String::as_str);
                self.format_value(raw, mapping.sql_type)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Numbers go in bare and booleans become the dialect literal, but only
    /// when the cell actually looks like one; anything else is quoted.
    fn format_value(&self, raw: &str, sql_type: SqlType) -> String {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return "NULL".to_string();
        }
        if sql_type.is_numeric() && is_numeric_literal(trimmed) {
            return trimmed.to_string();
        }
        if sql_type == SqlType::Boolean {
            if let Some(flag) = parse_boolean(trimmed) {
                return self.dialect.boolean_literal(flag).to_string();
            }
        }
        self.dialect.quote_string(raw)
    }

    fn insert_suffix(&self) -> String {
        match (self.config.options.insert_mode, self.dialect.ignore_insert) {
            (InsertMode::Ignore, IgnoreStrategy::Suffix(suffix)) => format!("\n{suffix}"),
            (InsertMode::Update, _) => self.upsert_clause(),
            _ => String::new(),
        }
    }

    fn upsert_clause(&self) -> String {
        let quoted = self
            .columns
            .iter()
            .map(|mapping| self.dialect.quote_identifier(&mapping.sanitized_name))
            .collect::<Vec<_>>();
        match self.dialect.upsert {
            UpsertStrategy::OnDuplicateKey => format!(
                "\nON DUPLICATE KEY UPDATE {}",
                quoted
                    .iter()
                    .map(|column| format!("{column} = VALUES({column})"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            UpsertStrategy::OnConflict => format!(
                "\nON CONFLICT ({}) DO UPDATE SET {}",
                quoted[0],
                quoted
                    .iter()
                    .map(|column| format!("{column} = EXCLUDED.{column}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            UpsertStrategy::Unsupported => String::new(),
        }
    }

    fn create_table_statement(&self) -> String {
        let definitions = self
            .columns
            .iter()
            .map(|mapping| {
                let name = self.dialect.quote_identifier(&mapping.sanitized_name);
                if mapping.sanitized_name == "id"
                    && mapping.sql_type == SqlType::Integer
                    && !mapping.nullable
                {
                    return format!("  {name} {}", self.dialect.auto_increment_key);
                }
                let column_type = self
                    .dialect
                    .column_type(mapping.sql_type, mapping.max_length);
                let not_null = if mapping.nullable { "" } else { " NOT NULL" };
                format!("  {name} {column_type}{not_null}")
            })
            .collect::<Vec<_>>()
            .join(",\n");

        format!(
            "{} {} (\n{definitions}\n);",
            self.dialect.create_table,
            self.quoted_table()
        )
    }

    fn update_columns(&self) -> Vec<UpdateColumn> {
        self.columns
            .iter()
            .map(|mapping| {
                let (name, role) = parse_update_marker(&mapping.source_header);
                UpdateColumn {
                    index: mapping.column_index,
                    field: sanitize_name(&name, mapping.column_index, self.settings),
                    sql_type: mapping.sql_type,
                    role,
                }
            })
            .collect()
    }

    /// One statement per row. The first row without assignments or
    /// conditions fails the whole run.
    fn write_update_body(&self, sql: &mut String) -> Result<usize, GenerationError> {
        let columns = self.update_columns();
        let mut builder = UpdateClauseBuilder::new(self.config.table_name.clone());
        let mut statements = Vec::with_capacity(self.config.table.total_rows());

        for (row_index, row) in self.config.table.rows.iter().enumerate() {
            let row_number = row_index + 1;
            builder.reset();

            for column in &columns {
                let raw = row.get(column.index).map_or("", String::as_str);
                match column.role {
                    ColumnRole::Set => {
                        builder.add_set_field(
                            &column.field,
                            ClauseValue::from_cell(raw, column.sql_type),
                            column.sql_type,
                        );
                    }
                    ColumnRole::Where { operator, join } => {
                        let value = if operator.takes_no_value() {
                            ClauseValue::Null
                        } else if raw.trim().is_empty() {
                            continue;
                        } else if operator.takes_list() {
                            let items = raw
                                .split(',')
                                .map(str::trim)
                                .filter(|item| !item.is_empty())
                                .map(|item| ClauseValue::from_cell(item, column.sql_type))
                                .collect::<Vec<_>>();
                            // A cell of bare commas filters on nothing, same as an empty cell.
                            if items.is_empty() {
                                continue;
                            }
                            ClauseValue::List(items)
                        } else {
                            ClauseValue::from_cell(raw, column.sql_type)
                        };
                        builder
                            .add_where_condition(
                                &column.field,
                                operator.as_str(),
                                value,
                                column.sql_type,
                                join,
                            )
                            .map_err(|source| GenerationError::Clause {
                                row: row_number,
                                source,
                            })?;
                    }
                }
            }

            if builder.set_fields().is_empty() {
                return Err(GenerationError::MissingSetFields { row: row_number });
            }
            if builder.conditions().is_empty() {
                return Err(GenerationError::MissingWhereConditions { row: row_number });
            }
            for warning in builder.validate().warnings {
                warn!(row = row_number, "{warning}");
            }
            statements.push(builder.build(self.dialect));
        }

        for statement in &statements {
            sql.push_str(statement);
            sql.push('\n');
        }
        if !statements.is_empty() {
            sql.push('\n');
        }
        Ok(statements.len())
    }
}

/// Text for a `--` comment line. Line breaks would end the comment and let
/// the rest run as SQL, so they become spaces.
fn comment_text(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

/// Splits a header like `where_age__gte` or `set:name` into the target column
/// name and its role. Unmarked headers are assignments.
fn parse_update_marker(header: &str) -> (String, ColumnRole) {
    let trimmed = header.trim();

    for (prefix, join) in [
        ("or_where_", "OR"),
        ("or_where:", "OR"),
        ("where_", "AND"),
        ("where:", "AND"),
    ] {
        if let Some(rest) = strip_prefix_ignore_case(trimmed, prefix) {
            let (name, operator) = split_operator_suffix(rest);
            return (name.to_string(), ColumnRole::Where { operator, join });
        }
    }
    for prefix in ["set_", "set:"] {
        if let Some(rest) = strip_prefix_ignore_case(trimmed, prefix) {
            return (rest.to_string(), ColumnRole::Set);
        }
    }
    (trimmed.to_string(), ColumnRole::Set)
}

fn strip_prefix_ignore_case<'s>(text: &'s str, prefix: &str) -> Option<&'s str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}

fn split_operator_suffix(name: &str) -> (&str, WhereOperator) {
    if let Some((column, suffix)) = name.rsplit_once("__") {
        let suffix = suffix.to_ascii_lowercase();
        if let Some((_, operator)) = OPERATOR_SUFFIXES.iter().find(|(token, _)| *token == suffix) {
            return (column, *operator);
        }
    }
    (name, WhereOperator::Eq)
}

/// Rough output size in bytes. Advisory only.
pub fn estimate_size(table: &RawTable, batch_size: BatchSize) -> usize {
    let rows = table.total_rows();
    let columns = table.columns();
    let cells = rows * columns;
    let average_field_length = if cells == 0 {
        0
    } else {
        table
            .rows
            .iter()
            .flat_map(|row| row.iter().take(columns))
            .map(String::len)
            .sum::<usize>()
            .div_ceil(cells)
    };
    let header_length = table.headers.iter().map(String::len).sum::<usize>();
    let batches = RowBatchSlicer::new(rows, batch_size).batch_count();

    cells * average_field_length + batches * (BATCH_OVERHEAD_BYTES + header_length)
}
