//! Entity type registry - definitions the importer validates against
//!
//! Definitions live as YAML or JSON files in a schemas directory, one
//! entity type per file. Every file is checked against an embedded JSON
//! Schema before use, so a malformed definition fails loudly at load
//! time instead of silently skipping validation rules.

use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Embedded assets (definition meta-schema)
#[derive(RustEmbed)]
#[folder = "assets/"]
struct Assets;

const DEFINITION_SCHEMA: &str = "entity-type.schema.json";

/// Field names managed by a host store, never importable
pub const SYSTEM_FIELDS: &[&str] = &[
    "id",
    "created_at",
    "updated_at",
    "published_at",
    "created_by",
    "updated_by",
    "locale",
    "localizations",
];

/// Errors from registry lookups and definition loading
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("entity type '{0}' not found")]
    NotFound(String),

    #[error("cannot read definition {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid definition {}: {message}", .path.display())]
    Invalid { path: PathBuf, message: String },

    #[error("schemas directory {} does not exist", .0.display())]
    MissingDirectory(PathBuf),
}

/// Declared type of one field in an entity type definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    ShortText,
    LongText,
    Email,
    Integer,
    BigInteger,
    Float,
    Decimal,
    Boolean,
    Date,
    DateTime,
    Time,
    Enumeration,
    Uid,
    Relation,
    Media,
    Component,
    DynamicZone,
}

impl FieldType {
    /// Structural fields cannot be expressed as flat tabular cells
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            FieldType::Relation | FieldType::Media | FieldType::Component | FieldType::DynamicZone
        )
    }
}

/// One field of an entity type definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub unique: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

/// A named entity type: display metadata plus its ordered fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityTypeDefinition {
    pub uid: String,
    pub display_name: String,
    pub fields: Vec<FieldDef>,
}

impl EntityTypeDefinition {
    /// Names of fields declared unique (for store-side enforcement)
    pub fn unique_fields(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.unique)
            .map(|f| f.name.clone())
            .collect()
    }
}

/// Pull-based schema lookup - the pipeline's only view of the registry
pub trait SchemaProvider {
    /// Look up one entity type by identifier
    fn definition(&self, entity_type: &str) -> Result<EntityTypeDefinition, SchemaError>;

    /// All known entity types, ordered by identifier
    fn definitions(&self) -> Result<Vec<EntityTypeDefinition>, SchemaError>;
}

/// Registry backed by a directory of YAML/JSON definition files
pub struct DirectoryRegistry {
    root: PathBuf,
    validator: Option<jsonschema::Validator>,
}

impl DirectoryRegistry {
    /// Open a registry over a schemas directory
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, SchemaError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(SchemaError::MissingDirectory(root));
        }
        Ok(Self {
            root,
            validator: compile_definition_schema(),
        })
    }

    fn definition_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| {
                matches!(
                    path.extension().and_then(|e| e.to_str()),
                    Some("yaml") | Some("yml") | Some("json")
                )
            })
            .collect();
        files.sort();
        files
    }

    fn load_file(&self, path: &Path) -> Result<EntityTypeDefinition, SchemaError> {
        let contents = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let value: JsonValue = if path.extension().and_then(|e| e.to_str()) == Some("json") {
            serde_json::from_str(&contents).map_err(|e| SchemaError::Invalid {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        } else {
            serde_yml::from_str(&contents).map_err(|e| SchemaError::Invalid {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        };

        if let Some(validator) = &self.validator {
            let violations: Vec<String> = validator
                .iter_errors(&value)
                .map(|error| {
                    let at = error.instance_path.to_string();
                    if at.is_empty() {
                        error.to_string()
                    } else {
                        format!("{} at {}", error, at)
                    }
                })
                .collect();
            if !violations.is_empty() {
                return Err(SchemaError::Invalid {
                    path: path.to_path_buf(),
                    message: violations.join("; "),
                });
            }
        }

        serde_json::from_value(value).map_err(|e| SchemaError::Invalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

impl SchemaProvider for DirectoryRegistry {
    fn definition(&self, entity_type: &str) -> Result<EntityTypeDefinition, SchemaError> {
        for path in self.definition_files() {
            let def = self.load_file(&path)?;
            if def.uid == entity_type {
                return Ok(def);
            }
        }
        Err(SchemaError::NotFound(entity_type.to_string()))
    }

    fn definitions(&self) -> Result<Vec<EntityTypeDefinition>, SchemaError> {
        let mut defs = Vec::new();
        for path in self.definition_files() {
            defs.push(self.load_file(&path)?);
        }
        defs.sort_by(|a, b| a.uid.cmp(&b.uid));
        Ok(defs)
    }
}

/// In-memory registry, mostly for tests and embedding
#[derive(Debug, Default, Clone)]
pub struct StaticRegistry {
    defs: Vec<EntityTypeDefinition>,
}

impl StaticRegistry {
    pub fn new(defs: Vec<EntityTypeDefinition>) -> Self {
        Self { defs }
    }

    pub fn push(&mut self, def: EntityTypeDefinition) {
        self.defs.push(def);
    }
}

impl SchemaProvider for StaticRegistry {
    fn definition(&self, entity_type: &str) -> Result<EntityTypeDefinition, SchemaError> {
        self.defs
            .iter()
            .find(|d| d.uid == entity_type)
            .cloned()
            .ok_or_else(|| SchemaError::NotFound(entity_type.to_string()))
    }

    fn definitions(&self) -> Result<Vec<EntityTypeDefinition>, SchemaError> {
        let mut defs = self.defs.clone();
        defs.sort_by(|a, b| a.uid.cmp(&b.uid));
        Ok(defs)
    }
}

/// Compile the embedded definition meta-schema.
///
/// Returns None if the asset is missing or fails to compile; definitions
/// are then loaded without meta-validation.
fn compile_definition_schema() -> Option<jsonschema::Validator> {
    let asset = Assets::get(DEFINITION_SCHEMA)?;
    let schema: JsonValue = serde_json::from_slice(&asset.data).ok()?;
    jsonschema::validator_for(&schema).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_schema(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    const CLIENTE: &str = "\
uid: cliente
display_name: Clientes
fields:
  - name: nombre
    type: short-text
    required: true
    max_length: 300
  - name: correo
    type: email
    unique: true
";

    #[test]
    fn test_directory_registry_loads_yaml_definition() {
        let tmp = tempfile::TempDir::new().unwrap();
        write_schema(tmp.path(), "cliente.yaml", CLIENTE);

        let registry = DirectoryRegistry::open(tmp.path()).unwrap();
        let def = registry.definition("cliente").unwrap();
        assert_eq!(def.display_name, "Clientes");
        assert_eq!(def.fields.len(), 2);
        assert_eq!(def.fields[0].field_type, FieldType::ShortText);
        assert_eq!(def.fields[0].max_length, Some(300));
        assert_eq!(def.unique_fields(), vec!["correo".to_string()]);
    }

    #[test]
    fn test_unknown_entity_type_is_not_found() {
        let tmp = tempfile::TempDir::new().unwrap();
        write_schema(tmp.path(), "cliente.yaml", CLIENTE);

        let registry = DirectoryRegistry::open(tmp.path()).unwrap();
        let err = registry.definition("producto").unwrap_err();
        assert!(matches!(err, SchemaError::NotFound(_)));
    }

    #[test]
    fn test_invalid_field_type_is_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        write_schema(
            tmp.path(),
            "bad.yaml",
            "uid: bad\ndisplay_name: Bad\nfields:\n  - name: x\n    type: rainbow\n",
        );

        let registry = DirectoryRegistry::open(tmp.path()).unwrap();
        let err = registry.definitions().unwrap_err();
        assert!(matches!(err, SchemaError::Invalid { .. }));
    }

    #[test]
    fn test_definitions_sorted_by_uid() {
        let tmp = tempfile::TempDir::new().unwrap();
        write_schema(
            tmp.path(),
            "zz.yaml",
            "uid: zeta\ndisplay_name: Z\nfields:\n  - name: a\n    type: short-text\n",
        );
        write_schema(
            tmp.path(),
            "aa.yaml",
            "uid: alfa\ndisplay_name: A\nfields:\n  - name: a\n    type: short-text\n",
        );

        let registry = DirectoryRegistry::open(tmp.path()).unwrap();
        let uids: Vec<String> = registry
            .definitions()
            .unwrap()
            .into_iter()
            .map(|d| d.uid)
            .collect();
        assert_eq!(uids, vec!["alfa".to_string(), "zeta".to_string()]);
    }

    #[test]
    fn test_static_registry_lookup() {
        let registry = StaticRegistry::new(vec![EntityTypeDefinition {
            uid: "cliente".to_string(),
            display_name: "Clientes".to_string(),
            fields: vec![],
        }]);
        assert!(registry.definition("cliente").is_ok());
        assert!(matches!(
            registry.definition("nope"),
            Err(SchemaError::NotFound(_))
        ));
    }
}
