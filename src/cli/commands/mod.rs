//! Command implementations

pub mod completions;
pub mod import;
pub mod init;
pub mod schema;
pub mod template;
pub mod types;

use miette::Result;
use std::path::Path;

use crate::cli::args::GlobalOpts;
use crate::core::project::Project;
use crate::core::registry::DirectoryRegistry;

/// Resolve the project from --project or by directory discovery
pub(crate) fn resolve_project(global: &GlobalOpts) -> Result<Project> {
    match &global.project {
        Some(root) => {
            if !root.join(crate::core::project::PROJECT_DIR).is_dir() {
                return Err(miette::miette!(
                    "no {} directory under {}",
                    crate::core::project::PROJECT_DIR,
                    root.display()
                ));
            }
            Ok(Project::at(root.clone()))
        }
        None => Project::discover().map_err(|e| miette::miette!("{}", e)),
    }
}

/// Open the schema registry for a project
pub(crate) fn open_registry(project: &Project) -> Result<DirectoryRegistry> {
    DirectoryRegistry::open(project.schemas_dir()).map_err(|e| miette::miette!("{}", e))
}

/// Truncate a string to max length with ellipsis
pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// File name portion of a path for display
pub(crate) fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
