//! `importa types` command - list registered entity types

use miette::Result;
use tabled::{settings::Style, Table, Tabled};

use crate::cli::args::GlobalOpts;
use crate::core::registry::SchemaProvider;
use crate::pipeline::introspect;

use super::{open_registry, resolve_project};

#[derive(clap::Args, Debug)]
pub struct TypesArgs {}

#[derive(Tabled)]
struct TypeRow {
    #[tabled(rename = "Entity Type")]
    uid: String,

    #[tabled(rename = "Display Name")]
    display_name: String,

    #[tabled(rename = "Importable")]
    importable: usize,

    #[tabled(rename = "Required")]
    required: usize,
}

pub fn run(_args: TypesArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(global)?;
    let registry = open_registry(&project)?;
    let defs = registry
        .definitions()
        .map_err(|e| miette::miette!("{}", e))?;

    if global.format.is_json() {
        let summaries: Vec<_> = defs.iter().map(introspect).collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&summaries).unwrap_or_default()
        );
        return Ok(());
    }

    if defs.is_empty() {
        println!("No entity types defined. Add definition files under schemas/.");
        return Ok(());
    }

    let rows: Vec<TypeRow> = defs
        .iter()
        .map(|def| {
            let summary = introspect(def);
            TypeRow {
                uid: summary.uid,
                display_name: summary.display_name,
                importable: summary.importable_fields,
                required: summary.required_fields,
            }
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{}", table);

    Ok(())
}
