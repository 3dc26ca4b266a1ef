//! `importa import` command - run the import pipeline on a file

use console::style;
use dialoguer::Confirm;
use miette::{IntoDiagnostic, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;

use crate::cli::args::GlobalOpts;
use crate::core::config::Config;
use crate::core::store::SqliteStore;
use crate::pipeline::{FileFormat, ImportPipeline, ImportReport, ImportRequest, ERROR_CAP};

use super::{file_label, open_registry, resolve_project, truncate};

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// Entity type identifier (see 'importa types')
    pub entity_type: String,

    /// CSV or Excel file to import
    pub file: PathBuf,

    /// CSV delimiter (single character, e.g. ';' for locales that use
    /// comma as the decimal separator)
    #[arg(long, short = 'd')]
    pub delimiter: Option<char>,

    /// Validate without persisting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(global)?;
    let config = Config::load(Some(&project));
    let registry = open_registry(&project)?;

    if !args.file.exists() {
        return Err(miette::miette!("File not found: {}", args.file.display()));
    }
    let bytes = fs::read(&args.file).into_diagnostic()?;

    let delimiter = match args.delimiter {
        Some(c) if !c.is_ascii() => {
            return Err(miette::miette!(
                "delimiter must be a single ASCII character, got '{}'",
                c
            ));
        }
        Some(c) => c as u8,
        None => config.delimiter_byte(),
    };
    let format =
        FileFormat::from_path(&args.file, delimiter).map_err(|e| miette::miette!("{}", e))?;

    let digest = format!("{:x}", Sha256::digest(&bytes));

    if !args.yes && !args.dry_run && !global.format.is_json() {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Import {} into '{}'?",
                file_label(&args.file),
                args.entity_type
            ))
            .default(true)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            println!("{}", style("Import cancelled.").yellow());
            return Ok(());
        }
    }

    if !global.quiet && !global.format.is_json() {
        println!(
            "{} Importing into {} from {}{}",
            style("→").blue(),
            style(&args.entity_type).cyan(),
            style(args.file.display()).yellow(),
            if args.dry_run {
                style(" (dry run)").dim().to_string()
            } else {
                String::new()
            }
        );
        println!();
    }

    let mut store = SqliteStore::open(&project.store_path()).map_err(|e| miette::miette!("{}", e))?;
    let mut pipeline = ImportPipeline::new(&registry, &mut store);
    let request = ImportRequest {
        entity_type: &args.entity_type,
        bytes: &bytes,
        format,
        actor: config.actor(),
        dry_run: args.dry_run,
    };
    let report = pipeline.run(&request).map_err(|e| miette::miette!("{}", e))?;

    if global.format.is_json() {
        let payload = serde_json::json!({
            "results": report.results,
            "errors": report.errors,
            "meta": {
                "file": file_label(&args.file),
                "entity_type": args.entity_type,
                "digest": digest,
                "headers": report.headers,
                "error_total": report.error_total,
                "valid_rows": report.valid_rows,
            },
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).unwrap_or_default()
        );
        return Ok(());
    }

    print_summary(&report, args.dry_run);

    Ok(())
}

fn print_summary(report: &ImportReport, dry_run: bool) {
    let results = &report.results;

    println!("{}", style("─".repeat(50)).dim());
    println!("{}", style("Import Summary").bold());
    println!("{}", style("─".repeat(50)).dim());
    println!("  Rows processed:   {}", style(results.total).cyan());
    if dry_run {
        println!("  Valid rows:       {}", style(report.valid_rows).green());
    } else {
        println!("  Rows imported:    {}", style(results.imported).green());
    }
    if results.errors > 0 {
        println!("  Rows with errors: {}", style(results.errors).red());
    }
    if results.skipped > 0 {
        println!("  Rows skipped:     {}", style(results.skipped).dim());
    }

    if !report.errors.is_empty() {
        println!();
        if report.error_total > ERROR_CAP {
            println!(
                "{} (showing first {} of {} errors)",
                style("Row errors").bold(),
                report.errors.len(),
                report.error_total
            );
        } else {
            println!("{}", style("Row errors").bold());
        }
        for error in &report.errors {
            let location = if error.field == crate::pipeline::GENERAL_FIELD {
                format!("Row {}", error.row)
            } else {
                format!("Row {} [{}]", error.row, error.field)
            };
            let value = error
                .value
                .as_deref()
                .map(|v| format!(" (got '{}')", truncate(v, 30)))
                .unwrap_or_default();
            println!(
                "  {} {}: {}{}",
                style("✗").red(),
                style(location).cyan(),
                error.message,
                value
            );
        }
    }

    if dry_run {
        println!();
        println!(
            "{}",
            style("Dry run complete. No records were created.").yellow()
        );
    }
}
