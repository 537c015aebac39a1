mod application;
mod domain;
mod infrastructure;
mod interfaces;

use anyhow::Result;
use console::style;

use crate::application::use_cases::generate_sql::GenerateSqlUseCase;
use crate::infrastructure::logging;
use crate::interfaces::cli::collect_generate_command;

fn main() -> Result<()> {
    let collected = collect_generate_command()?;
    logging::init(collected.verbose);
    let use_case = GenerateSqlUseCase::default();

    println!("{}", style("Generating SQL...").cyan());
    let result = use_case.execute(collected.command)?;

    for warning in &result.warnings {
        println!("{} {warning}", style("warning:").yellow());
    }
    println!(
        "{} {} ({} {} rows, {} statements, ~{} bytes estimated)",
        style("Generated SQL has been saved to").green(),
        style(result.output_path.display()).bold(),
        result.operation,
        result.record_count,
        result.batch_count,
        result.estimated_bytes,
    );
    Ok(())
}
