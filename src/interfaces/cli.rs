use std::{
    env,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use console::style;
use dialoguer::{Input, Select, theme::ColorfulTheme};
use inquire::Confirm;

use crate::{
    application::commands::GenerateSqlCommand,
    domain::{
        generation::{GenerationOptions, InsertMode, Operation},
        row_batch::BatchSize,
        settings::Settings,
        sql_dialect::SqlDialectKind,
    },
    infrastructure::csv_parser::ParseOptions,
};

const DEFAULT_OUTPUT: &str = "output.sql";
const DEFAULT_ENCODING: &str = "UTF-8";

#[derive(Debug, Parser)]
#[command(
    name = "csv2sql",
    version,
    about = "Turn CSV data into INSERT or UPDATE scripts for MySQL, PostgreSQL, SQLite and SQL Server"
)]
struct CliArgs {
    #[arg(long, short = 'i', help = "CSV file to read")]
    input: Option<PathBuf>,
    #[arg(long, short = 'o', default_value = DEFAULT_OUTPUT)]
    output: PathBuf,
    #[arg(long, short = 't', help = "Target table name")]
    table: Option<String>,
    #[arg(long, default_value = "", help = "Database name, shown in the header comment")]
    database: String,
    #[arg(
        long,
        value_parser = Operation::from_str,
        help = "insert or update; guessed from the header names when omitted"
    )]
    operation: Option<Operation>,
    #[arg(long, short = 'd', value_enum, default_value_t = CliDialect::Mysql)]
    dialect: CliDialect,
    #[arg(long, short = 'b', help = "Rows per INSERT statement, or \"all\"")]
    batch_size: Option<String>,
    #[arg(
        long,
        value_parser = InsertMode::from_str,
        default_value = "normal",
        help = "normal, ignore or update (upsert)"
    )]
    insert_mode: InsertMode,
    #[arg(long, help = "Wrap the script in a transaction")]
    transaction: bool,
    #[arg(long, help = "Leave out header, batch and summary comments")]
    no_comments: bool,
    #[arg(long, help = "Emit CREATE TABLE before the inserts")]
    create_table: bool,
    #[arg(long, help = "Field delimiter: one character or \"tab\"; detected when omitted")]
    delimiter: Option<String>,
    #[arg(long, help = "Treat the first line as data")]
    no_header: bool,
    #[arg(long, default_value = DEFAULT_ENCODING)]
    encoding: String,
    #[arg(long, help = "Keep blank lines as empty rows")]
    keep_empty_lines: bool,
    #[arg(long, help = "Keep whitespace around field values")]
    no_trim: bool,
    #[arg(long, help = "Stop reading after this many data rows")]
    max_rows: Option<usize>,
    #[arg(long, short = 'm', help = "Also write generation metadata as JSON")]
    metadata: Option<PathBuf>,
    #[arg(long, short = 'v', help = "Log pipeline steps to stderr")]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliDialect {
    Mysql,
    #[value(alias = "postgres")]
    Postgresql,
    Sqlite,
    #[value(alias = "mssql")]
    Sqlserver,
}

impl From<CliDialect> for SqlDialectKind {
    fn from(value: CliDialect) -> Self {
        match value {
            CliDialect::Mysql => SqlDialectKind::MySql,
            CliDialect::Postgresql => SqlDialectKind::PostgreSql,
            CliDialect::Sqlite => SqlDialectKind::Sqlite,
            CliDialect::Sqlserver => SqlDialectKind::SqlServer,
        }
    }
}

#[derive(Debug)]
pub struct CollectedCommand {
    pub command: GenerateSqlCommand,
    pub verbose: bool,
}

pub fn collect_generate_command() -> Result<CollectedCommand> {
    if env::args_os().len() == 1 {
        return collect_interactive_command();
    }
    let args = CliArgs::parse();
    let verbose = args.verbose;
    Ok(CollectedCommand {
        command: collect_command_from_args(args)?,
        verbose,
    })
}

fn collect_command_from_args(args: CliArgs) -> Result<GenerateSqlCommand> {
    let input_path = args
        .input
        .ok_or_else(|| anyhow!("--input is required when using argument mode"))?;
    let table_name = args
        .table
        .ok_or_else(|| anyhow!("--table is required when using argument mode"))?;
    let table_name = ensure_non_empty_value(table_name, "Table name")?;

    let mut settings = Settings::default();
    if let Some(max_rows) = args.max_rows {
        settings.max_rows = max_rows;
    }

    let batch_size = match args.batch_size {
        Some(value) => BatchSize::from_str(&value)?,
        None => BatchSize::rows(settings.default_batch_size),
    };
    let delimiter = args.delimiter.as_deref().map(parse_delimiter).transpose()?;

    Ok(GenerateSqlCommand {
        input_path,
        output_path: args.output,
        metadata_path: args.metadata,
        parse_options: ParseOptions {
            delimiter,
            has_header: !args.no_header,
            encoding_label: args.encoding,
            skip_empty_lines: !args.keep_empty_lines,
            trim_values: !args.no_trim,
        },
        operation: args.operation,
        dialect_kind: args.dialect.into(),
        database_name: args.database.trim().to_string(),
        table_name: table_name.trim().to_string(),
        generation_options: GenerationOptions {
            batch_size,
            include_transaction: args.transaction,
            include_comments: !args.no_comments,
            include_create_table: args.create_table,
            insert_mode: args.insert_mode,
        },
        settings,
    })
}

fn collect_interactive_command() -> Result<CollectedCommand> {
    let theme = ColorfulTheme::default();
    let settings = Settings::default();

    println!();
    println!(
        "{}",
        style(" CSV TO SQL ").black().on_cyan().bold().underlined()
    );
    println!("{}", style("Generate INSERT or UPDATE scripts from CSV data").dim());
    println!();

    let input_name: String = Input::with_theme(&theme)
        .with_prompt("CSV file path")
        .validate_with(|value: &String| {
            if Path::new(value.trim()).is_file() {
                Ok(())
            } else {
                Err("File does not exist")
            }
        })
        .interact_text()?;
    let input_path = PathBuf::from(input_name.trim());

    let encoding_label: String = Input::with_theme(&theme)
        .with_prompt("File encoding")
        .default(DEFAULT_ENCODING.to_string())
        .interact_text()?;

    let operation_items = ["Auto-detect from headers", "INSERT", "UPDATE"];
    let operation = match Select::with_theme(&theme)
        .with_prompt("Statement kind")
        .default(0)
        .items(&operation_items)
        .interact()?
    {
        1 => Some(Operation::Insert),
        2 => Some(Operation::Update),
        _ => None,
    };

    let dialect_items = SqlDialectKind::ALL
        .iter()
        .map(|dialect| dialect.as_str())
        .collect::<Vec<_>>();
    let selected_dialect_index = Select::with_theme(&theme)
        .with_prompt("SQL dialect")
        .default(0)
        .items(&dialect_items)
        .interact()?;
    let dialect_kind = SqlDialectKind::ALL[selected_dialect_index];

    let default_table = input_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let table_name: String = Input::with_theme(&theme)
        .with_prompt("Table name")
        .default(default_table)
        .validate_with(|value: &String| {
            if value.trim().is_empty() {
                Err("Table name must not be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let database_name: String = Input::with_theme(&theme)
        .with_prompt("Database name (optional)")
        .allow_empty(true)
        .interact_text()?;

    let batch_size_text: String = Input::with_theme(&theme)
        .with_prompt("Rows per INSERT (number or \"all\")")
        .default(settings.default_batch_size.to_string())
        .validate_with(|value: &String| {
            BatchSize::from_str(value)
                .map(|_| ())
                .map_err(|error| error.to_string())
        })
        .interact_text()?;
    let batch_size = BatchSize::from_str(&batch_size_text)?;

    let mut insert_mode = InsertMode::Normal;
    let mut include_create_table = false;
    if operation != Some(Operation::Update) {
        let mode_items = ["Plain INSERT", "Skip duplicates", "Update on conflict"];
        insert_mode = match Select::with_theme(&theme)
            .with_prompt("Insert mode")
            .default(0)
            .items(&mode_items)
            .interact()?
        {
            1 => InsertMode::Ignore,
            2 => InsertMode::Update,
            _ => InsertMode::Normal,
        };
        include_create_table = Confirm::new("Emit CREATE TABLE first?")
            .with_default(false)
            .prompt()?;
    }

    let include_transaction = Confirm::new("Wrap the script in a transaction?")
        .with_default(true)
        .prompt()?;
    let include_comments = Confirm::new("Include comments?")
        .with_default(true)
        .prompt()?;

    let output_name: String = Input::with_theme(&theme)
        .with_prompt("Output file")
        .default(DEFAULT_OUTPUT.to_string())
        .interact_text()?;

    Ok(CollectedCommand {
        command: GenerateSqlCommand {
            input_path,
            output_path: PathBuf::from(output_name.trim()),
            metadata_path: None,
            parse_options: ParseOptions {
                encoding_label: encoding_label.trim().to_string(),
                ..ParseOptions::default()
            },
            operation,
            dialect_kind,
            database_name: database_name.trim().to_string(),
            table_name: table_name.trim().to_string(),
            generation_options: GenerationOptions {
                batch_size,
                include_transaction,
                include_comments,
                include_create_table,
                insert_mode,
            },
            settings,
        },
        verbose: false,
    })
}

fn parse_delimiter(value: &str) -> Result<char> {
    if value.eq_ignore_ascii_case("tab") || value == "\\t" {
        return Ok('\t');
    }
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(delimiter), None) => Ok(delimiter),
        _ => Err(anyhow!(
            "Delimiter must be a single character or \"tab\", got {value:?}"
        )),
    }
}

fn ensure_non_empty_value(value: String, field_name: &str) -> Result<String> {
    if value.trim().is_empty() {
        return Err(anyhow!("{field_name} must not be empty"));
    }
    Ok(value)
}
