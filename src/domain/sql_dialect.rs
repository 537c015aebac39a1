use std::str::FromStr;

use serde::Serialize;

use crate::domain::{error::ConfigError, field_mapping::SqlType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialectKind {
    MySql,
    PostgreSql,
    Sqlite,
    SqlServer,
}

impl SqlDialectKind {
    pub const ALL: [SqlDialectKind; 4] = [
        SqlDialectKind::MySql,
        SqlDialectKind::PostgreSql,
        SqlDialectKind::Sqlite,
        SqlDialectKind::SqlServer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SqlDialectKind::MySql => "mysql",
            SqlDialectKind::PostgreSql => "postgresql",
            SqlDialectKind::Sqlite => "sqlite",
            SqlDialectKind::SqlServer => "sqlserver",
        }
    }

    pub fn descriptor(self) -> &'static DialectDescriptor {
        match self {
            SqlDialectKind::MySql => &MYSQL,
            SqlDialectKind::PostgreSql => &POSTGRESQL,
            SqlDialectKind::Sqlite => &SQLITE,
            SqlDialectKind::SqlServer => &SQLSERVER,
        }
    }
}

impl std::fmt::Display for SqlDialectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SqlDialectKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(SqlDialectKind::MySql),
            "postgres" | "postgresql" | "pg" => Ok(SqlDialectKind::PostgreSql),
            "sqlite" | "sqlite3" => Ok(SqlDialectKind::Sqlite),
            "sqlserver" | "mssql" | "sql_server" => Ok(SqlDialectKind::SqlServer),
            _ => Err(ConfigError::UnsupportedDialect(value.to_string())),
        }
    }
}

/// How a dialect expresses "insert unless the row already exists".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreStrategy {
    /// Replaces the leading `INSERT INTO` keyword.
    Keyword(&'static str),
    /// Appended after the VALUES list.
    Suffix(&'static str),
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertStrategy {
    /// `ON DUPLICATE KEY UPDATE col = VALUES(col)`
    OnDuplicateKey,
    /// `ON CONFLICT (key) DO UPDATE SET col = EXCLUDED.col`
    OnConflict,
    Unsupported,
}

/// Static syntax data for one SQL engine family.
#[derive(Debug)]
pub struct DialectDescriptor {
    pub kind: SqlDialectKind,
    pub identifier_quotes: (char, char),
    pub string_quote: char,
    pub boolean_literals: (&'static str, &'static str),
    /// Definition for an integer `id` column in CREATE TABLE.
    pub auto_increment_key: &'static str,
    pub create_table: &'static str,
    pub ignore_insert: IgnoreStrategy,
    pub upsert: UpsertStrategy,
    pub begin_transaction: &'static str,
    pub commit_transaction: &'static str,
    pub rollback_transaction: &'static str,
    /// MySQL treats `\` as an escape inside string literals by default.
    pub escape_backslashes: bool,
    column_types: ColumnTypeNames,
}

#[derive(Debug)]
struct ColumnTypeNames {
    integer: &'static str,
    decimal: &'static str,
    boolean: &'static str,
    date: &'static str,
    datetime: &'static str,
    email: &'static str,
    short_text: &'static str,
    long_text: &'static str,
}

static MYSQL: DialectDescriptor = DialectDescriptor {
    kind: SqlDialectKind::MySql,
    identifier_quotes: ('`', '`'),
    string_quote: '\'',
    boolean_literals: ("TRUE", "FALSE"),
    auto_increment_key: "INT NOT NULL AUTO_INCREMENT PRIMARY KEY",
    create_table: "CREATE TABLE IF NOT EXISTS",
    ignore_insert: IgnoreStrategy::Keyword("INSERT IGNORE INTO"),
    upsert: UpsertStrategy::OnDuplicateKey,
    begin_transaction: "START TRANSACTION;",
    commit_transaction: "COMMIT;",
    rollback_transaction: "ROLLBACK;",
    escape_backslashes: true,
    column_types: ColumnTypeNames {
        integer: "INT",
        decimal: "DECIMAL(18,6)",
        boolean: "BOOLEAN",
        date: "DATE",
        datetime: "DATETIME",
        email: "VARCHAR(255)",
        short_text: "VARCHAR",
        long_text: "TEXT",
    },
};

static POSTGRESQL: DialectDescriptor = DialectDescriptor {
    kind: SqlDialectKind::PostgreSql,
    identifier_quotes: ('"', '"'),
    string_quote: '\'',
    boolean_literals: ("TRUE", "FALSE"),
    auto_increment_key: "SERIAL PRIMARY KEY",
    create_table: "CREATE TABLE IF NOT EXISTS",
    ignore_insert: IgnoreStrategy::Suffix("ON CONFLICT DO NOTHING"),
    upsert: UpsertStrategy::OnConflict,
    begin_transaction: "BEGIN;",
    commit_transaction: "COMMIT;",
    rollback_transaction: "ROLLBACK;",
    escape_backslashes: false,
    column_types: ColumnTypeNames {
        integer: "INTEGER",
        decimal: "NUMERIC(18,6)",
        boolean: "BOOLEAN",
        date: "DATE",
        datetime: "TIMESTAMP",
        email: "VARCHAR(255)",
        short_text: "VARCHAR",
        long_text: "TEXT",
    },
};

static SQLITE: DialectDescriptor = DialectDescriptor {
    kind: SqlDialectKind::Sqlite,
    identifier_quotes: ('"', '"'),
    string_quote: '\'',
    boolean_literals: ("1", "0"),
    auto_increment_key: "INTEGER PRIMARY KEY AUTOINCREMENT",
    create_table: "CREATE TABLE IF NOT EXISTS",
    ignore_insert: IgnoreStrategy::Keyword("INSERT OR IGNORE INTO"),
    upsert: UpsertStrategy::OnConflict,
    begin_transaction: "BEGIN TRANSACTION;",
    commit_transaction: "COMMIT;",
    rollback_transaction: "ROLLBACK;",
    escape_backslashes: false,
    column_types: ColumnTypeNames {
        integer: "INTEGER",
        decimal: "REAL",
        boolean: "INTEGER",
        date: "TEXT",
        datetime: "TEXT",
        email: "TEXT",
        short_text: "TEXT",
        long_text: "TEXT",
    },
};

static SQLSERVER: DialectDescriptor = DialectDescriptor {
    kind: SqlDialectKind::SqlServer,
    identifier_quotes: ('[', ']'),
    string_quote: '\'',
    boolean_literals: ("1", "0"),
    // IDENTITY would reject the explicit ids carried by the INSERT batches.
    auto_increment_key: "INT NOT NULL PRIMARY KEY",
    create_table: "CREATE TABLE",
    ignore_insert: IgnoreStrategy::Unsupported,
    upsert: UpsertStrategy::Unsupported,
    begin_transaction: "BEGIN TRANSACTION;",
    commit_transaction: "COMMIT TRANSACTION;",
    rollback_transaction: "ROLLBACK TRANSACTION;",
    escape_backslashes: false,
    column_types: ColumnTypeNames {
        integer: "INT",
        decimal: "DECIMAL(18,6)",
        boolean: "BIT",
        date: "DATE",
        datetime: "DATETIME2",
        email: "NVARCHAR(255)",
        short_text: "NVARCHAR",
        long_text: "NVARCHAR(MAX)",
    },
};

impl DialectDescriptor {
    pub fn quote_identifier(&self, name: &str) -> String {
        let (open, close) = self.identifier_quotes;
        let escaped = name.replace(close, &format!("{close}{close}"));
        format!("{open}{escaped}{close}")
    }

    pub fn quote_string(&self, value: &str) -> String {
        let quote = self.string_quote;
        let mut escaped = if self.escape_backslashes {
            value.replace('\\', "\\\\")
        } else {
            value.to_string()
        };
        escaped = escaped.replace(quote, &format!("{quote}{quote}"));
        format!("{quote}{escaped}{quote}")
    }

    pub fn boolean_literal(&self, value: bool) -> &'static str {
        if value {
            self.boolean_literals.0
        } else {
            self.boolean_literals.1
        }
    }

    /// Column type for CREATE TABLE. Text columns are sized from the longest
    /// observed value where the dialect takes a length.
    pub fn column_type(&self, sql_type: SqlType, max_length: usize) -> String {
        let names = &self.column_types;
        match sql_type {
            SqlType::Integer => names.integer.to_string(),
            SqlType::Decimal => names.decimal.to_string(),
            SqlType::Boolean => names.boolean.to_string(),
            SqlType::Date => names.date.to_string(),
            SqlType::DateTime => names.datetime.to_string(),
            SqlType::Email => names.email.to_string(),
            SqlType::LongText => names.long_text.to_string(),
            SqlType::ShortText => {
                if names.short_text == names.long_text {
                    names.short_text.to_string()
                } else {
                    format!("{}({})", names.short_text, varchar_length(max_length))
                }
            }
        }
    }
}

/// Rounds up to the next common VARCHAR width, never below 50.
fn varchar_length(max_length: usize) -> usize {
    match max_length {
        0..=50 => 50,
        51..=100 => 100,
        _ => 255,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dialect_aliases() {
        assert_eq!(
            "Postgres".parse::<SqlDialectKind>().expect("alias should parse"),
            SqlDialectKind::PostgreSql
        );
        assert_eq!(
            "mssql".parse::<SqlDialectKind>().expect("alias should parse"),
            SqlDialectKind::SqlServer
        );

        let error = "oracle"
            .parse::<SqlDialectKind>()
            .expect_err("unknown dialect should be rejected");
        assert_eq!(error, ConfigError::UnsupportedDialect("oracle".to_string()));
    }

    #[test]
    fn every_kind_resolves_its_own_descriptor() {
        for kind in SqlDialectKind::ALL {
            assert_eq!(kind.descriptor().kind, kind);
            assert_eq!(kind.as_str().parse::<SqlDialectKind>(), Ok(kind));
        }
    }

    #[test]
    fn quotes_identifiers_per_dialect() {
        assert_eq!(SqlDialectKind::MySql.descriptor().quote_identifier("a`b"), "`a``b`");
        assert_eq!(SqlDialectKind::PostgreSql.descriptor().quote_identifier("users"), "\"users\"");
        assert_eq!(SqlDialectKind::SqlServer.descriptor().quote_identifier("x]y"), "[x]]y]");
    }

    #[test]
    fn doubles_string_quotes_and_mysql_backslashes() {
        let postgres = SqlDialectKind::PostgreSql.descriptor();
        assert_eq!(postgres.quote_string("O'Brien"), "'O''Brien'");
        assert_eq!(postgres.quote_string("C:\\tmp"), "'C:\\tmp'");

        let mysql = SqlDialectKind::MySql.descriptor();
        assert_eq!(mysql.quote_string("C:\\tmp'"), "'C:\\\\tmp'''");
    }

    #[test]
    fn sizes_short_text_columns() {
        let mysql = SqlDialectKind::MySql.descriptor();
        assert_eq!(mysql.column_type(SqlType::ShortText, 12), "VARCHAR(50)");
        assert_eq!(mysql.column_type(SqlType::ShortText, 180), "VARCHAR(255)");
        assert_eq!(SqlDialectKind::Sqlite.descriptor().column_type(SqlType::ShortText, 12), "TEXT");
        assert_eq!(SqlDialectKind::SqlServer.descriptor().column_type(SqlType::Boolean, 0), "BIT");
    }
}
