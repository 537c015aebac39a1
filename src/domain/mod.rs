pub mod error;
pub mod field_mapping;
pub mod generation;
pub mod raw_table;
pub mod row_batch;
pub mod settings;
pub mod sql_dialect;
pub mod validation;
