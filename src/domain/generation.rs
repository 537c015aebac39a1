use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{
    error::ConfigError, field_mapping::FieldMappings, raw_table::RawTable, row_batch::BatchSize,
    sql_dialect::SqlDialectKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Insert,
    Update,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Insert => "INSERT",
            Operation::Update => "UPDATE",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "insert" => Ok(Operation::Insert),
            "update" => Ok(Operation::Update),
            _ => Err(ConfigError::UnsupportedOperation(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertMode {
    #[default]
    Normal,
    Ignore,
    /// Upsert: update the existing row on key conflict.
    Update,
}

impl FromStr for InsertMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(InsertMode::Normal),
            "ignore" => Ok(InsertMode::Ignore),
            "update" | "upsert" => Ok(InsertMode::Update),
            _ => Err(ConfigError::UnsupportedInsertMode(value.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub batch_size: BatchSize,
    pub include_transaction: bool,
    pub include_comments: bool,
    pub include_create_table: bool,
    pub insert_mode: InsertMode,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            batch_size: BatchSize::rows(crate::domain::settings::DEFAULT_BATCH_SIZE),
            include_transaction: false,
            include_comments: true,
            include_create_table: false,
            insert_mode: InsertMode::Normal,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationConfig<'a> {
    pub operation: Operation,
    pub dialect: SqlDialectKind,
    pub database_name: String,
    pub table_name: String,
    pub field_mappings: &'a FieldMappings,
    pub table: &'a RawTable,
    pub options: GenerationOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationMetadata {
    pub operation: Operation,
    pub dialect: SqlDialectKind,
    pub table: String,
    pub record_count: usize,
    pub batch_count: usize,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationResult {
    pub sql: String,
    pub metadata: GenerationMetadata,
    pub success: bool,
}
