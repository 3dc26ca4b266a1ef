//! Record stores - persistence sinks for validated rows
//!
//! The pipeline only sees the `RecordStore` trait. The default backend
//! is a SQLite document table; an in-memory store backs the tests.
//!
//! Stores enforce uniqueness declared on fields and reject duplicates
//! with a typed error so the importer can attribute the failure to the
//! offending field.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use ulid::Ulid;

use crate::core::actor::Actor;
use crate::core::registry::EntityTypeDefinition;

/// Errors from record persistence
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate value for unique field '{field}'")]
    Duplicate { field: String, value: String },

    #[error("storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("cannot open record store: {0}")]
    Io(#[from] std::io::Error),
}

/// A record the store created for one validated row
#[derive(Debug, Clone)]
pub struct CreatedRecord {
    pub id: String,
    pub entity_type: String,
    pub created_at: DateTime<Utc>,
}

/// Persistence sink the importer writes through
pub trait RecordStore {
    /// Make the store aware of an entity type before rows arrive
    /// (unique-field bookkeeping). Default is a no-op.
    fn prepare(&mut self, def: &EntityTypeDefinition) -> Result<(), StoreError> {
        let _ = def;
        Ok(())
    }

    /// Persist one row. Failure is per-row; the caller decides whether
    /// to continue.
    fn create(
        &mut self,
        entity_type: &str,
        data: &JsonMap<String, JsonValue>,
        actor: &Actor,
    ) -> Result<CreatedRecord, StoreError>;
}

/// SQLite-backed record store: one document table for all entity types
pub struct SqliteStore {
    conn: Connection,
    unique_fields: HashMap<String, Vec<String>>,
}

impl SqliteStore {
    /// Open or create the store at the given path
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// In-memory database, used by tests
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS records (
                id          TEXT PRIMARY KEY,
                entity_type TEXT NOT NULL,
                data        TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                created_by  TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_records_entity ON records(entity_type);",
        )?;
        Ok(Self {
            conn,
            unique_fields: HashMap::new(),
        })
    }

    /// Number of records stored for an entity type
    pub fn count(&self, entity_type: &str) -> Result<usize, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM records WHERE entity_type = ?1",
            params![entity_type],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn check_unique(
        &self,
        entity_type: &str,
        data: &JsonMap<String, JsonValue>,
    ) -> Result<(), StoreError> {
        let Some(fields) = self.unique_fields.get(entity_type) else {
            return Ok(());
        };
        for field in fields {
            let Some(value) = data.get(field).filter(|v| !v.is_null()) else {
                continue;
            };
            let count: i64 = self.conn.query_row(
                "SELECT COUNT(*) FROM records
                 WHERE entity_type = ?1 AND json_extract(data, '$.' || ?2) = ?3",
                params![entity_type, field, to_sql_value(value)],
                |row| row.get(0),
            )?;
            if count > 0 {
                return Err(StoreError::Duplicate {
                    field: field.clone(),
                    value: scalar_text(value),
                });
            }
        }
        Ok(())
    }
}

impl RecordStore for SqliteStore {
    fn prepare(&mut self, def: &EntityTypeDefinition) -> Result<(), StoreError> {
        self.unique_fields
            .insert(def.uid.clone(), def.unique_fields());
        Ok(())
    }

    fn create(
        &mut self,
        entity_type: &str,
        data: &JsonMap<String, JsonValue>,
        actor: &Actor,
    ) -> Result<CreatedRecord, StoreError> {
        self.check_unique(entity_type, data)?;

        let id = Ulid::new().to_string();
        let created_at = Utc::now();
        let payload =
            serde_json::to_string(data).unwrap_or_else(|_| "{}".to_string());
        self.conn.execute(
            "INSERT INTO records (id, entity_type, data, created_at, created_by)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id,
                entity_type,
                payload,
                created_at.to_rfc3339(),
                actor.to_string()
            ],
        )?;

        Ok(CreatedRecord {
            id,
            entity_type: entity_type.to_string(),
            created_at,
        })
    }
}

/// Map a JSON scalar to the SQLite value `json_extract` yields for it
fn to_sql_value(value: &JsonValue) -> rusqlite::types::Value {
    match value {
        JsonValue::String(s) => s.clone().into(),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.into()
            } else if let Some(f) = n.as_f64() {
                f.into()
            } else {
                rusqlite::types::Value::Null
            }
        }
        JsonValue::Bool(b) => (*b as i64).into(),
        other => rusqlite::types::Value::Text(other.to_string()),
    }
}

fn scalar_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A stored record held by the in-memory store
#[derive(Debug, Clone)]
pub struct MemoryRecord {
    pub id: String,
    pub entity_type: String,
    pub data: JsonMap<String, JsonValue>,
    pub created_by: String,
}

/// In-memory record store for tests and dry wiring
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub records: Vec<MemoryRecord>,
    unique_fields: HashMap<String, Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn prepare(&mut self, def: &EntityTypeDefinition) -> Result<(), StoreError> {
        self.unique_fields
            .insert(def.uid.clone(), def.unique_fields());
        Ok(())
    }

    fn create(
        &mut self,
        entity_type: &str,
        data: &JsonMap<String, JsonValue>,
        actor: &Actor,
    ) -> Result<CreatedRecord, StoreError> {
        if let Some(fields) = self.unique_fields.get(entity_type) {
            for field in fields {
                let Some(value) = data.get(field).filter(|v| !v.is_null()) else {
                    continue;
                };
                let clash = self
                    .records
                    .iter()
                    .filter(|r| r.entity_type == entity_type)
                    .any(|r| r.data.get(field) == Some(value));
                if clash {
                    return Err(StoreError::Duplicate {
                        field: field.clone(),
                        value: scalar_text(value),
                    });
                }
            }
        }

        let id = Ulid::new().to_string();
        self.records.push(MemoryRecord {
            id: id.clone(),
            entity_type: entity_type.to_string(),
            data: data.clone(),
            created_by: actor.to_string(),
        });

        Ok(CreatedRecord {
            id,
            entity_type: entity_type.to_string(),
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::{FieldDef, FieldType};

    fn cliente_def() -> EntityTypeDefinition {
        EntityTypeDefinition {
            uid: "cliente".to_string(),
            display_name: "Clientes".to_string(),
            fields: vec![FieldDef {
                name: "codigo".to_string(),
                field_type: FieldType::ShortText,
                required: true,
                unique: true,
                min_length: None,
                max_length: None,
                min: None,
                max: None,
                regex: None,
                values: vec![],
            }],
        }
    }

    fn row(codigo: &str) -> JsonMap<String, JsonValue> {
        let mut data = JsonMap::new();
        data.insert(
            "codigo".to_string(),
            JsonValue::String(codigo.to_string()),
        );
        data
    }

    #[test]
    fn test_sqlite_store_roundtrip() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.prepare(&cliente_def()).unwrap();

        let actor = Actor::new("test");
        let record = store.create("cliente", &row("A1"), &actor).unwrap();
        assert_eq!(record.entity_type, "cliente");
        assert_eq!(store.count("cliente").unwrap(), 1);
    }

    #[test]
    fn test_sqlite_store_rejects_duplicate_unique_value() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.prepare(&cliente_def()).unwrap();

        let actor = Actor::new("test");
        store.create("cliente", &row("A1"), &actor).unwrap();
        let err = store.create("cliente", &row("A1"), &actor).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { ref field, .. } if field == "codigo"));
        assert_eq!(store.count("cliente").unwrap(), 1);
    }

    #[test]
    fn test_sqlite_store_allows_distinct_unique_values() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.prepare(&cliente_def()).unwrap();

        let actor = Actor::new("test");
        store.create("cliente", &row("A1"), &actor).unwrap();
        store.create("cliente", &row("A2"), &actor).unwrap();
        assert_eq!(store.count("cliente").unwrap(), 2);
    }

    #[test]
    fn test_memory_store_rejects_duplicate_unique_value() {
        let mut store = MemoryStore::new();
        store.prepare(&cliente_def()).unwrap();

        let actor = Actor::new("test");
        store.create("cliente", &row("A1"), &actor).unwrap();
        assert!(store.create("cliente", &row("A1"), &actor).is_err());
        assert_eq!(store.records.len(), 1);
    }
}
