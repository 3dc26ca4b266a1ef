//! Importer - persists validated rows one at a time
//!
//! Best-effort by design: rows are written independently and in input
//! order, and a store rejection (uniqueness, constraint violation) is
//! recorded against that row while the batch continues. There is no
//! batch transaction and no rollback; rows persisted before a failure
//! stay persisted.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::actor::Actor;
use crate::core::store::{RecordStore, StoreError};
use crate::pipeline::error::{ErrorKind, RowError};
use crate::pipeline::validator::ValidatedRow;

/// Row errors beyond this cap are reported by count only
pub const ERROR_CAP: usize = 50;

/// Aggregate result of one import run
///
/// Counts are per row, each row counted once. Invariant:
/// `imported + skipped + errors <= total`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportOutcome {
    pub total: usize,
    pub imported: usize,
    pub skipped: usize,
    pub errors: usize,
    pub timestamp: DateTime<Utc>,
    pub actor: Actor,
}

/// What the store pass produced: counts plus row-scoped failures
#[derive(Debug, Default)]
pub struct ImportTally {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<RowError>,
}

/// Persist rows through the store, never aborting on a single failure
pub fn import_rows(
    store: &mut dyn RecordStore,
    entity_type: &str,
    rows: &[ValidatedRow],
    actor: &Actor,
) -> ImportTally {
    let mut tally = ImportTally::default();

    for row in rows {
        // A payload of nothing but nulls has nothing to persist
        if row.values.values().all(|value| value.is_null()) {
            tally.skipped += 1;
            continue;
        }

        match store.create(entity_type, &row.values, actor) {
            Ok(_) => tally.imported += 1,
            Err(StoreError::Duplicate { field, value }) => {
                tally.errors.push(RowError::field(
                    row.number,
                    &field,
                    ErrorKind::PersistenceError,
                    format!("duplicate value for unique field '{}'", field),
                    Some(value),
                ));
            }
            Err(error) => {
                tally.errors.push(RowError::general(
                    row.number,
                    ErrorKind::PersistenceError,
                    format!("could not persist row: {}", error),
                ));
            }
        }
    }

    tally
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::{EntityTypeDefinition, FieldDef, FieldType};
    use crate::core::store::MemoryStore;
    use serde_json::{Map as JsonMap, Value as JsonValue};

    fn validated(number: usize, pairs: &[(&str, JsonValue)]) -> ValidatedRow {
        let mut values = JsonMap::new();
        for (key, value) in pairs {
            values.insert(key.to_string(), value.clone());
        }
        ValidatedRow { number, values }
    }

    fn unique_codigo_def() -> EntityTypeDefinition {
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

    #[test]
    fn test_rows_are_persisted_in_order() {
        let mut store = MemoryStore::new();
        let actor = Actor::new("test");
        let rows = vec![
            validated(2, &[("codigo", JsonValue::from("A1"))]),
            validated(3, &[("codigo", JsonValue::from("B2"))]),
        ];

        let tally = import_rows(&mut store, "cliente", &rows, &actor);
        assert_eq!(tally.imported, 2);
        assert!(tally.errors.is_empty());
        assert_eq!(store.records[0].data["codigo"], JsonValue::from("A1"));
        assert_eq!(store.records[1].data["codigo"], JsonValue::from("B2"));
    }

    #[test]
    fn test_store_rejection_does_not_abort_the_batch() {
        let mut store = MemoryStore::new();
        store.prepare(&unique_codigo_def()).unwrap();
        let actor = Actor::new("test");
        let rows = vec![
            validated(2, &[("codigo", JsonValue::from("A1"))]),
            validated(3, &[("codigo", JsonValue::from("A1"))]),
            validated(4, &[("codigo", JsonValue::from("C3"))]),
        ];

        let tally = import_rows(&mut store, "cliente", &rows, &actor);
        assert_eq!(tally.imported, 2);
        assert_eq!(tally.errors.len(), 1);
        assert_eq!(tally.errors[0].row, 3);
        assert_eq!(tally.errors[0].kind, ErrorKind::PersistenceError);
        assert_eq!(tally.errors[0].field, "codigo");
    }

    #[test]
    fn test_all_null_payload_is_skipped() {
        let mut store = MemoryStore::new();
        let actor = Actor::new("test");
        let rows = vec![validated(2, &[("nota", JsonValue::Null)])];

        let tally = import_rows(&mut store, "cliente", &rows, &actor);
        assert_eq!(tally.imported, 0);
        assert_eq!(tally.skipped, 1);
        assert!(store.records.is_empty());
    }
}
