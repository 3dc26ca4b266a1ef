//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::PathBuf;

use crate::core::actor::Actor;
use crate::core::project::Project;

/// Importa configuration with layered hierarchy
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default actor name for import attribution
    pub author: Option<String>,

    /// Actor email for import attribution
    pub email: Option<String>,

    /// Default CSV delimiter
    pub delimiter: Option<char>,

    /// Default output format
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load(project: Option<&Project>) -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/importa/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                if let Ok(contents) = std::fs::read_to_string(&global_path) {
                    if let Ok(global) = serde_yml::from_str::<Config>(&contents) {
                        config.merge(global);
                    }
                }
            }
        }

        // 3. Project config (.importa/config.yaml)
        if let Some(project) = project {
            let project_config_path = project.importa_dir().join("config.yaml");
            if project_config_path.exists() {
                if let Ok(contents) = std::fs::read_to_string(&project_config_path) {
                    if let Ok(project_config) = serde_yml::from_str::<Config>(&contents) {
                        config.merge(project_config);
                    }
                }
            }
        }

        // 4. Environment variables
        if let Ok(author) = std::env::var("IMPORTA_AUTHOR") {
            config.author = Some(author);
        }
        if let Ok(email) = std::env::var("IMPORTA_EMAIL") {
            config.email = Some(email);
        }

        config
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "importa")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.author.is_some() {
            self.author = other.author;
        }
        if other.email.is_some() {
            self.email = other.email;
        }
        if other.delimiter.is_some() {
            self.delimiter = other.delimiter;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
    }

    /// Resolve the acting user, falling back to git config or username
    pub fn actor(&self) -> Actor {
        let name = self.author.clone().unwrap_or_else(resolve_username);
        let mut actor = Actor::new(name);
        if let Some(ref email) = self.email {
            actor = actor.with_email(email.clone());
        }
        actor
    }

    /// Effective CSV delimiter as a single byte
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter
            .filter(char::is_ascii)
            .map(|c| c as u8)
            .unwrap_or(b',')
    }
}

fn resolve_username() -> String {
    // Try git config
    if let Ok(output) = std::process::Command::new("git")
        .args(["config", "user.name"])
        .output()
    {
        if output.status.success() {
            let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !name.is_empty() {
                return name;
            }
        }
    }

    // Fall back to username
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}
