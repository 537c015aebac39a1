use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    application::commands::{GenerateSqlCommand, GenerateSqlResult},
    domain::{
        field_mapping::FieldMappings,
        generation::{GenerationConfig, GenerationMetadata},
        raw_table::RowWarning,
        validation::ValidationReport,
    },
    infrastructure::{
        csv_parser::CsvParser,
        sql_generator::{SqlGenerator, estimate_size},
        template_detector::detect_template_type,
        text_source::read_text,
        type_inference::{infer, validate_mappings},
    },
};

/// JSON sidecar written next to the script when a metadata path is given.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MetadataReport<'a> {
    generation: &'a GenerationMetadata,
    delimiter: char,
    encoding: &'a str,
    field_mappings: &'a FieldMappings,
    validation: &'a ValidationReport,
    row_warnings: &'a [RowWarning],
}

#[derive(Debug, Default)]
pub struct GenerateSqlUseCase;

impl GenerateSqlUseCase {
    pub fn execute(&self, command: GenerateSqlCommand) -> Result<GenerateSqlResult> {
        let settings = &command.settings;
        let decoded = read_text(
            &command.input_path,
            &command.parse_options.encoding_label,
            settings,
        )?;

        let mut parse_options = command.parse_options.clone();
        parse_options.encoding_label = decoded.encoding.clone();
        let table = CsvParser::new(parse_options, settings)
            .parse(&decoded.text)
            .with_context(|| format!("Unable to parse {}", command.input_path.display()))?;
        debug!(
            rows = table.total_rows(),
            columns = table.columns(),
            skipped = table.metadata.skipped_rows,
            "parsed input"
        );

        let operation = match command.operation {
            Some(operation) => operation,
            None => {
                let guess = detect_template_type(&table.headers);
                info!(
                    operation = %guess.kind,
                    confidence = guess.confidence,
                    update_hits = guess.update_hits,
                    insert_hits = guess.insert_hits,
                    "operation picked from header names"
                );
                guess.kind
            }
        };

        let field_mappings = infer(&table, settings)?;
        let validation = validate_mappings(&field_mappings, settings);
        if !validation.is_valid {
            bail!(
                "Column mappings are invalid:\n  - {}",
                validation.errors.join("\n  - ")
            );
        }

        let estimated_bytes = estimate_size(&table, command.generation_options.batch_size);
        let config = GenerationConfig {
            operation,
            dialect: command.dialect_kind,
            database_name: command.database_name.clone(),
            table_name: command.table_name.clone(),
            field_mappings: &field_mappings,
            table: &table,
            options: command.generation_options.clone(),
        };
        let generation = SqlGenerator::new(config, settings)?.generate()?;

        write_sql(&command.output_path, &generation.sql)?;
        if let Some(metadata_path) = &command.metadata_path {
            let report = MetadataReport {
                generation: &generation.metadata,
                delimiter: table.delimiter,
                encoding: &table.encoding,
                field_mappings: &field_mappings,
                validation: &validation,
                row_warnings: &table.warnings,
            };
            write_metadata(metadata_path, &report)?;
        }

        let mut warnings = table
            .warnings
            .iter()
            .map(|warning| format!("line {}: {}", warning.line, warning.message))
            .collect::<Vec<_>>();
        warnings.extend(validation.warnings.iter().cloned());
        if !warnings.is_empty() {
            warn!(count = warnings.len(), "generation finished with warnings");
        }

        Ok(GenerateSqlResult {
            output_path: command.output_path,
            operation,
            record_count: generation.metadata.record_count,
            batch_count: generation.metadata.batch_count,
            estimated_bytes,
            warnings,
        })
    }
}

fn write_sql(path: &Path, sql: &str) -> Result<()> {
    let output_file =
        File::create(path).with_context(|| format!("Unable to create file: {}", path.display()))?;
    let mut output_writer = BufWriter::new(output_file);
    output_writer.write_all(sql.as_bytes())?;
    output_writer.flush()?;
    Ok(())
}

fn write_metadata(path: &Path, report: &MetadataReport<'_>) -> Result<()> {
    let metadata_file =
        File::create(path).with_context(|| format!("Unable to create file: {}", path.display()))?;
    let mut metadata_writer = BufWriter::new(metadata_file);
    serde_json::to_writer_pretty(&mut metadata_writer, report)
        .with_context(|| format!("Unable to write metadata: {}", path.display()))?;
    writeln!(metadata_writer)?;
    metadata_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{
        fs,
        path::PathBuf,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;
    use crate::{
        domain::{
            error::GenerationError,
            generation::{GenerationOptions, Operation},
            settings::Settings,
            sql_dialect::SqlDialectKind,
        },
        infrastructure::csv_parser::ParseOptions,
    };

    fn temp_path(label: &str, extension: &str) -> PathBuf {
        let unique_suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be after unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("csv2sql_{label}_{unique_suffix}.{extension}"))
    }

    fn command_for(input: &str, label: &str) -> GenerateSqlCommand {
        let input_path = temp_path(label, "csv");
        fs::write(&input_path, input).expect("temp csv file should be written");

        GenerateSqlCommand {
            input_path,
            output_path: temp_path(label, "sql"),
            metadata_path: None,
            parse_options: ParseOptions::default(),
            operation: None,
            dialect_kind: SqlDialectKind::PostgreSql,
            database_name: String::new(),
            table_name: "people".to_string(),
            generation_options: GenerationOptions {
                include_comments: false,
                ..GenerationOptions::default()
            },
            settings: Settings::default(),
        }
    }

    fn cleanup(paths: &[&Path]) {
        for path in paths {
            if path.exists() {
                fs::remove_file(path).expect("temp file should be removed");
            }
        }
    }

    #[test]
    fn writes_insert_script_and_metadata() {
        let mut command = command_for("id,name\n1,Ann\n2,Bob\n", "insert");
        let metadata_path = temp_path("insert_meta", "json");
        command.metadata_path = Some(metadata_path.clone());
        let input_path = command.input_path.clone();

        let result = GenerateSqlUseCase
            .execute(command)
            .expect("generation should succeed");

        assert_eq!(result.operation, Operation::Insert);
        assert_eq!(result.record_count, 2);
        assert_eq!(result.batch_count, 1);
        assert!(result.warnings.is_empty());

        let sql = fs::read_to_string(&result.output_path).expect("output should be readable");
        assert_eq!(
            sql,
            "INSERT INTO \"people\" (\"id\", \"name\") VALUES\n  (1, 'Ann'),\n  (2, 'Bob');\n\n"
        );

        let metadata: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(&metadata_path).expect("metadata should be readable"),
        )
        .expect("metadata should be json");
        assert_eq!(metadata["generation"]["recordCount"], 2);
        assert_eq!(metadata["generation"]["operation"], "INSERT");
        assert_eq!(metadata["delimiter"], ",");
        assert_eq!(metadata["encoding"], "UTF-8");

        cleanup(&[&input_path, &result.output_path, &metadata_path]);
    }

    #[test]
    fn falls_back_to_header_hint_for_update() {
        let command = command_for("where_id,set_name\n1,Ann\n", "hint");
        let input_path = command.input_path.clone();

        let result = GenerateSqlUseCase
            .execute(command)
            .expect("generation should succeed");

        assert_eq!(result.operation, Operation::Update);
        let sql = fs::read_to_string(&result.output_path).expect("output should be readable");
        assert_eq!(
            sql.trim_end(),
            "UPDATE \"people\" SET \"name\" = 'Ann' WHERE \"id\" = 1;"
        );

        cleanup(&[&input_path, &result.output_path]);
    }

    #[test]
    fn marker_fragments_in_plain_headers_still_insert() {
        let command = command_for("id,asset_tag\n1,A-100\n", "asset");
        let input_path = command.input_path.clone();

        let result = GenerateSqlUseCase
            .execute(command)
            .expect("generation should succeed");

        assert_eq!(result.operation, Operation::Insert);
        let sql = fs::read_to_string(&result.output_path).expect("output should be readable");
        assert_eq!(
            sql,
            "INSERT INTO \"people\" (\"id\", \"asset_tag\") VALUES\n  (1, 'A-100');\n\n"
        );

        cleanup(&[&input_path, &result.output_path]);
    }

    #[test]
    fn reports_skipped_rows_as_warnings() {
        let command = command_for("id,name\n1,Ann\n2,\"Bob\n", "warnings");
        let input_path = command.input_path.clone();
        let output_path = command.output_path.clone();

        let result = GenerateSqlUseCase
            .execute(command)
            .expect("generation should succeed");

        assert_eq!(result.record_count, 1);
        assert!(
            result
                .warnings
                .iter()
                .any(|warning| warning.starts_with("line 3:"))
        );

        cleanup(&[&input_path, &output_path]);
    }

    #[test]
    fn rejects_duplicate_sanitized_names() {
        let command = command_for("Full Name,full_name\nAnn,Ann\n", "duplicates");
        let input_path = command.input_path.clone();
        let output_path = command.output_path.clone();

        let error = GenerateSqlUseCase
            .execute(command)
            .expect_err("duplicate columns should be rejected");

        assert!(error.to_string().contains("Column mappings are invalid"));
        assert!(!output_path.exists());

        cleanup(&[&input_path]);
    }

    #[test]
    fn does_not_write_output_when_update_lacks_where() {
        let mut command = command_for("name\nAnn\n", "nowhere");
        command.operation = Some(Operation::Update);
        let input_path = command.input_path.clone();
        let output_path = command.output_path.clone();

        let error = GenerateSqlUseCase
            .execute(command)
            .expect_err("update without where should fail");

        assert_eq!(
            error.downcast_ref::<GenerationError>(),
            Some(&GenerationError::MissingWhereConditions { row: 1 })
        );
        assert!(!output_path.exists());

        cleanup(&[&input_path]);
    }
}
