//! `importa template` command - generate a fill-in workbook

use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::PathBuf;

use crate::cli::args::GlobalOpts;
use crate::core::registry::SchemaProvider;
use crate::pipeline::{generate_template, introspect};

use super::{open_registry, resolve_project};

#[derive(clap::Args, Debug)]
pub struct TemplateArgs {
    /// Entity type identifier (see 'importa types')
    pub entity_type: String,

    /// Output path (default: template_<entity>_<date>.xlsx in the
    /// current directory)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(args: TemplateArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(global)?;
    let registry = open_registry(&project)?;
    let def = registry
        .definition(&args.entity_type)
        .map_err(|e| miette::miette!("{}", e))?;
    let summary = introspect(&def);

    let artifact = generate_template(&summary).map_err(|e| miette::miette!("{}", e))?;
    let path = args
        .output
        .unwrap_or_else(|| PathBuf::from(&artifact.filename));
    fs::write(&path, &artifact.bytes).into_diagnostic()?;

    if !global.quiet {
        println!(
            "{} Wrote {} ({} fields, {} required)",
            style("✓").green(),
            style(path.display()).yellow(),
            summary.importable_fields,
            summary.required_fields
        );
    }

    Ok(())
}
