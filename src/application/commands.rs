use std::path::PathBuf;

use crate::{
    domain::{
        generation::{GenerationOptions, Operation},
        settings::Settings,
        sql_dialect::SqlDialectKind,
    },
    infrastructure::csv_parser::ParseOptions,
};

#[derive(Debug)]
pub struct GenerateSqlCommand {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// Where to write the generation metadata as JSON, if anywhere.
    pub metadata_path: Option<PathBuf>,
    pub parse_options: ParseOptions,
    /// `None` lets the header names decide.
    pub operation: Option<Operation>,
    pub dialect_kind: SqlDialectKind,
    pub database_name: String,
    pub table_name: String,
    pub generation_options: GenerationOptions,
    pub settings: Settings,
}

#[derive(Debug)]
pub struct GenerateSqlResult {
    pub output_path: PathBuf,
    pub operation: Operation,
    pub record_count: usize,
    pub batch_count: usize,
    pub estimated_bytes: usize,
    pub warnings: Vec<String>,
}
