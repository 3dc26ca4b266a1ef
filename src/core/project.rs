//! Project discovery - locating the `.importa/` marker directory

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Marker directory identifying a project root
pub const PROJECT_DIR: &str = ".importa";

/// Directory holding entity type definition files
pub const SCHEMAS_DIR: &str = "schemas";

/// Record store database location within a project
const STORE_FILE: &str = "records.db";

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not inside an importa project (no {PROJECT_DIR}/ directory found). Run 'importa init' first")]
    NotFound,
}

/// A discovered project rooted at the directory containing `.importa/`
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    /// Walk up from the current directory looking for `.importa/`
    pub fn discover() -> Result<Self, ProjectError> {
        let start = std::env::current_dir().map_err(|_| ProjectError::NotFound)?;
        Self::discover_from(&start)
    }

    /// Walk up from a given directory looking for `.importa/`
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = Some(start);
        while let Some(dir) = current {
            if dir.join(PROJECT_DIR).is_dir() {
                return Ok(Self {
                    root: dir.to_path_buf(),
                });
            }
            current = dir.parent();
        }
        Err(ProjectError::NotFound)
    }

    /// Use an explicit directory as the project root
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn importa_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    pub fn schemas_dir(&self) -> PathBuf {
        self.root.join(SCHEMAS_DIR)
    }

    pub fn store_path(&self) -> PathBuf {
        self.importa_dir().join(STORE_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_walks_up_to_marker() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join(PROJECT_DIR)).unwrap();
        let nested = tmp.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        let project = Project::discover_from(&nested).unwrap();
        assert_eq!(project.root(), tmp.path());
        assert!(project.store_path().ends_with(".importa/records.db"));
    }

    #[test]
    fn test_discover_fails_outside_project() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert!(Project::discover_from(tmp.path()).is_err());
    }
}
