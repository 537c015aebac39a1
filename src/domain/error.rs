use thiserror::Error;

/// Input that cannot become a table at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Input text must not be empty")]
    Empty,
    #[error("No header columns found: {0}")]
    NoHeaders(String),
    #[error("Input is {size} bytes, above the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },
    #[error("Unknown encoding label: {0}")]
    UnknownEncoding(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    #[error("Cannot infer field types for a table without headers")]
    NoHeaders,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error(
        "Unsupported dialect: {0}. Available values: mysql,postgresql,sqlite,sqlserver"
    )]
    UnsupportedDialect(String),
    #[error("Unsupported operation: {0}. Available values: insert,update")]
    UnsupportedOperation(String),
    #[error("Unsupported insert mode: {0}. Available values: normal,ignore,update")]
    UnsupportedInsertMode(String),
    #[error("Invalid batch size: {0}. Use a positive number or `all`")]
    InvalidBatchSize(String),
    #[error("Table name must not be empty")]
    MissingTableName,
    #[error("Field mappings must not be empty")]
    MissingFieldMappings,
    #[error("No field mapping for header `{0}`")]
    MissingMapping(String),
    #[error("{feature} is not supported by the {dialect} dialect")]
    UnsupportedByDialect {
        feature: &'static str,
        dialect: &'static str,
    },
}

/// Rejected input to an UPDATE clause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClauseError {
    #[error("Unsupported WHERE operator `{0}`")]
    InvalidOperator(String),
    #[error("Unsupported logical join `{0}`, expected AND or OR")]
    InvalidJoin(String),
    #[error("Operator {operator} on field `{field}` expects a non-empty list of values")]
    ExpectedList { field: String, operator: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Row {row} has no SET values, nothing to update")]
    MissingSetFields { row: usize },
    #[error("Row {row} has no WHERE conditions, refusing to update every row")]
    MissingWhereConditions { row: usize },
    #[error("Row {row}: {source}")]
    Clause {
        row: usize,
        #[source]
        source: ClauseError,
    },
}
