//! `importa init` command - scaffold a new project

use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::PathBuf;

use crate::core::project::{Project, PROJECT_DIR, SCHEMAS_DIR};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    pub path: Option<PathBuf>,

    /// Skip the sample entity type definition
    #[arg(long)]
    pub bare: bool,
}

const CONFIG_TEMPLATE: &str = "\
# Importa project configuration
# author: Your Name
# email: you@example.com
# delimiter: ','
";

const SAMPLE_DEFINITION: &str = "\
uid: cliente
display_name: Clientes
fields:
  - name: nombre
    type: short-text
    required: true
    max_length: 300
  - name: codigo
    type: short-text
    required: true
    min_length: 5
    max_length: 5
    unique: true
  - name: correo
    type: email
  - name: edad
    type: integer
    min: 0
    max: 120
  - name: activo
    type: boolean
";

pub fn run(args: InitArgs) -> Result<()> {
    let root = match args.path {
        Some(path) => path,
        None => std::env::current_dir().into_diagnostic()?,
    };
    let project = Project::at(&root);

    if project.importa_dir().exists() {
        return Err(miette::miette!(
            "{} already exists in {}",
            PROJECT_DIR,
            root.display()
        ));
    }

    fs::create_dir_all(project.importa_dir()).into_diagnostic()?;
    fs::create_dir_all(project.schemas_dir()).into_diagnostic()?;
    fs::write(project.importa_dir().join("config.yaml"), CONFIG_TEMPLATE).into_diagnostic()?;

    if !args.bare {
        fs::write(project.schemas_dir().join("cliente.yaml"), SAMPLE_DEFINITION)
            .into_diagnostic()?;
    }

    println!(
        "{} Initialized importa project in {}",
        style("✓").green(),
        style(root.display()).yellow()
    );
    println!("  {}/config.yaml", PROJECT_DIR);
    if !args.bare {
        println!("  {}/cliente.yaml (sample entity type)", SCHEMAS_DIR);
    }
    println!();
    println!(
        "{} Add entity type definitions under {}/ and run 'importa types'",
        style("→").blue(),
        SCHEMAS_DIR
    );

    Ok(())
}
