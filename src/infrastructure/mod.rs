pub mod csv_parser;
pub mod logging;
pub mod sql_generator;
pub mod template_detector;
pub mod text_source;
pub mod type_inference;
pub mod update_clause;
