//! Tabular import pipeline
//!
//! Parse, validate, persist: one uploaded file in, an outcome plus
//! row-scoped diagnostics out. Collaborators (schema provider, record
//! store) are injected; the pipeline owns no globals.

pub mod error;
pub mod importer;
pub mod parser;
pub mod spec;
pub mod template;
pub mod validator;

use chrono::Utc;
use serde::Serialize;

use crate::core::actor::Actor;
use crate::core::registry::SchemaProvider;
use crate::core::store::RecordStore;

pub use error::{ErrorKind, ImportError, ParseError, RowError, GENERAL_FIELD};
pub use importer::{import_rows, ImportOutcome, ERROR_CAP};
pub use parser::{parse, FileFormat, ParsedTable, RawRow};
pub use spec::{introspect, DataType, FieldRules, FieldSpec, SchemaSummary};
pub use template::{generate_template, TemplateArtifact, TemplateError, TEMPLATE_MIME};
pub use validator::{HeaderMap, RowValidator, ValidatedRow};

/// One import request: the file plus how to read and attribute it
#[derive(Debug)]
pub struct ImportRequest<'a> {
    pub entity_type: &'a str,
    pub bytes: &'a [u8],
    pub format: FileFormat,
    pub actor: Actor,

    /// Validate only; nothing reaches the store
    pub dry_run: bool,
}

/// Full result of one run: outcome, bounded error list, and context
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub results: ImportOutcome,

    /// First [`ERROR_CAP`] row errors, ordered by row
    pub errors: Vec<RowError>,

    /// Total number of row errors before capping
    pub error_total: usize,

    /// Headers as parsed from the file
    pub headers: Vec<String>,

    /// Rows that passed validation (importable even on a dry run)
    pub valid_rows: usize,
}

/// The import pipeline with its injected collaborators
pub struct ImportPipeline<'a> {
    provider: &'a dyn SchemaProvider,
    store: &'a mut dyn RecordStore,
}

impl<'a> ImportPipeline<'a> {
    pub fn new(provider: &'a dyn SchemaProvider, store: &'a mut dyn RecordStore) -> Self {
        Self { provider, store }
    }

    /// Run one import: introspect, parse, validate, persist.
    ///
    /// Parse and schema failures abort; row-scoped failures accumulate
    /// in the report while processing continues.
    pub fn run(&mut self, request: &ImportRequest<'_>) -> Result<ImportReport, ImportError> {
        let def = self.provider.definition(request.entity_type)?;
        let summary = introspect(&def);
        self.store.prepare(&def)?;

        let table = parse(request.bytes, request.format)?;
        let validator = RowValidator::new(&summary.fields, &table.headers);

        let mut errors: Vec<RowError> = table.defects.clone();
        let mut valid = Vec::new();
        for row in &table.rows {
            match validator.validate(row) {
                Ok(validated) => valid.push(validated),
                Err(mut row_errors) => errors.append(&mut row_errors),
            }
        }

        let total = table.rows.len() + table.defects.len();
        let (imported, skipped) = if request.dry_run {
            (0, 0)
        } else {
            let mut tally = import_rows(self.store, &def.uid, &valid, &request.actor);
            errors.append(&mut tally.errors);
            (tally.imported, tally.skipped)
        };

        let error_rows = {
            let mut rows: Vec<usize> = errors.iter().map(|e| e.row).collect();
            rows.sort_unstable();
            rows.dedup();
            rows.len()
        };

        errors.sort_by_key(|e| e.row);
        let error_total = errors.len();
        errors.truncate(ERROR_CAP);

        Ok(ImportReport {
            results: ImportOutcome {
                total,
                imported,
                skipped,
                errors: error_rows,
                timestamp: Utc::now(),
                actor: request.actor.clone(),
            },
            errors,
            error_total,
            headers: table.headers,
            valid_rows: valid.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::{
        EntityTypeDefinition, FieldDef, FieldType, SchemaError, StaticRegistry,
    };
    use crate::core::store::MemoryStore;

    fn field(name: &str, field_type: FieldType) -> FieldDef {
        FieldDef {
            name: name.to_string(),
            field_type,
            required: false,
            unique: false,
            min_length: None,
            max_length: None,
            min: None,
            max: None,
            regex: None,
            values: vec![],
        }
    }

    fn cliente_registry() -> StaticRegistry {
        StaticRegistry::new(vec![EntityTypeDefinition {
            uid: "cliente".to_string(),
            display_name: "Clientes".to_string(),
            fields: vec![
                FieldDef {
                    required: true,
                    max_length: Some(300),
                    ..field("nombre", FieldType::ShortText)
                },
                FieldDef {
                    required: true,
                    max_length: Some(5),
                    ..field("codigo", FieldType::ShortText)
                },
            ],
        }])
    }

    fn request<'a>(bytes: &'a [u8], dry_run: bool) -> ImportRequest<'a> {
        ImportRequest {
            entity_type: "cliente",
            bytes,
            format: FileFormat::Csv { delimiter: b',' },
            actor: Actor::new("test"),
            dry_run,
        }
    }

    const SCENARIO: &[u8] = b"nombre,codigo\nJuan P\xc3\xa9rez,12345\n,67890\nAna G\xc3\xb3mez,123456\n";

    #[test]
    fn test_partial_success_scenario() {
        let registry = cliente_registry();
        let mut store = MemoryStore::new();
        let mut pipeline = ImportPipeline::new(&registry, &mut store);

        let report = pipeline.run(&request(SCENARIO, false)).unwrap();
        assert_eq!(report.results.total, 3);
        assert_eq!(report.results.imported, 1);
        assert_eq!(report.results.errors, 2);
        assert_eq!(report.results.skipped, 0);
        assert_eq!(report.error_total, 2);

        // Row 3: nombre empty; row 4: codigo too long
        assert_eq!(report.errors[0].row, 3);
        assert_eq!(report.errors[0].kind, ErrorKind::RequiredField);
        assert_eq!(report.errors[0].field, "nombre");
        assert_eq!(report.errors[1].row, 4);
        assert_eq!(report.errors[1].kind, ErrorKind::MaxLength);
        assert_eq!(report.errors[1].field, "codigo");

        assert_eq!(store.records.len(), 1);
        assert_eq!(
            store.records[0].data["nombre"],
            serde_json::Value::from("Juan Pérez")
        );
    }

    #[test]
    fn test_clean_input_imports_everything() {
        let registry = cliente_registry();
        let mut store = MemoryStore::new();
        let mut pipeline = ImportPipeline::new(&registry, &mut store);

        let report = pipeline
            .run(&request(b"nombre,codigo\nJuan,111\nAna,222\n", false))
            .unwrap();
        assert_eq!(report.results.imported + report.results.errors, report.results.total);
        assert_eq!(report.results.skipped, 0);
        assert_eq!(report.results.imported, 2);
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let registry = cliente_registry();
        let mut store = MemoryStore::new();
        let mut pipeline = ImportPipeline::new(&registry, &mut store);

        let report = pipeline.run(&request(SCENARIO, true)).unwrap();
        assert_eq!(report.results.imported, 0);
        assert_eq!(report.valid_rows, 1);
        assert_eq!(report.results.errors, 2);
        assert!(store.records.is_empty());
    }

    #[test]
    fn test_unknown_entity_type_aborts() {
        let registry = cliente_registry();
        let mut store = MemoryStore::new();
        let mut pipeline = ImportPipeline::new(&registry, &mut store);

        let mut req = request(SCENARIO, false);
        req.entity_type = "producto";
        let err = pipeline.run(&req).unwrap_err();
        assert!(matches!(
            err,
            ImportError::Schema(SchemaError::NotFound(_))
        ));
    }

    #[test]
    fn test_empty_file_aborts() {
        let registry = cliente_registry();
        let mut store = MemoryStore::new();
        let mut pipeline = ImportPipeline::new(&registry, &mut store);

        let err = pipeline.run(&request(b"", false)).unwrap_err();
        assert!(matches!(err, ImportError::Parse(ParseError::Empty)));
    }

    #[test]
    fn test_header_only_file_is_an_empty_success() {
        let registry = cliente_registry();
        let mut store = MemoryStore::new();
        let mut pipeline = ImportPipeline::new(&registry, &mut store);

        let report = pipeline
            .run(&request(b"nombre,codigo\n", false))
            .unwrap();
        assert_eq!(report.results.total, 0);
        assert_eq!(report.results.imported, 0);
        assert_eq!(report.error_total, 0);
    }

    #[test]
    fn test_column_mismatch_row_is_counted_and_reported() {
        let registry = cliente_registry();
        let mut store = MemoryStore::new();
        let mut pipeline = ImportPipeline::new(&registry, &mut store);

        let report = pipeline
            .run(&request(b"nombre,codigo\nJuan,123,extra\nAna,456\n", false))
            .unwrap();
        assert_eq!(report.results.total, 2);
        assert_eq!(report.results.imported, 1);
        assert_eq!(report.results.errors, 1);
        assert_eq!(report.errors[0].kind, ErrorKind::MissingColumns);
    }
}
