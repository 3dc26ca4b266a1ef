//! `importa schema` command - show importable fields of an entity type

use console::style;
use miette::Result;
use tabled::{settings::Style as TableStyle, Table, Tabled};

use crate::cli::args::GlobalOpts;
use crate::core::registry::SchemaProvider;
use crate::pipeline::introspect;

use super::{open_registry, resolve_project};

#[derive(clap::Args, Debug)]
pub struct SchemaArgs {
    /// Entity type identifier (see 'importa types')
    pub entity_type: String,
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    name: String,

    #[tabled(rename = "Type")]
    data_type: String,

    #[tabled(rename = "Required")]
    required: String,

    #[tabled(rename = "Constraints")]
    constraints: String,
}

pub fn run(args: SchemaArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(global)?;
    let registry = open_registry(&project)?;
    let def = registry
        .definition(&args.entity_type)
        .map_err(|e| miette::miette!("{}", e))?;
    let summary = introspect(&def);

    if global.format.is_json() {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).unwrap_or_default()
        );
        return Ok(());
    }

    println!(
        "{} ({})",
        style(&summary.display_name).bold(),
        style(&summary.uid).cyan()
    );
    println!(
        "  {} total, {} importable, {} required",
        summary.total_fields, summary.importable_fields, summary.required_fields
    );
    println!();

    let rows: Vec<FieldRow> = summary
        .fields
        .iter()
        .map(|field| FieldRow {
            name: field.name.clone(),
            data_type: field.data_type.to_string(),
            required: if field.required { "yes" } else { "" }.to_string(),
            constraints: field.constraints.join("; "),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(TableStyle::sharp());
    println!("{}", table);

    Ok(())
}
