//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs, import::ImportArgs, init::InitArgs, schema::SchemaArgs,
    template::TemplateArgs, types::TypesArgs,
};

#[derive(Parser)]
#[command(name = "importa")]
#[command(author, version, about = "Schema-driven bulk importer for CSV and Excel files")]
#[command(
    long_about = "Importa loads tabular files into typed record stores: rows are validated \
against an entity type definition, coerced, and persisted one at a time with best-effort \
semantics. Also generates fill-in templates for each entity type."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Project root (default: auto-detect by finding .importa/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new importa project
    Init(InitArgs),

    /// List the entity types known to the schema registry
    Types(TypesArgs),

    /// Show the importable fields of an entity type
    Schema(SchemaArgs),

    /// Generate a fill-in XLSX template for an entity type
    Template(TemplateArgs),

    /// Import a CSV or Excel file into an entity type
    Import(ImportArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables and summaries
    Auto,
    /// Force table output
    Table,
    /// Machine-readable JSON
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}
