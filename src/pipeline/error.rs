//! Pipeline error types
//!
//! Two tiers: whole-file failures (`ParseError`, and schema lookups via
//! `SchemaError`) abort the run; row-scoped failures are `RowError`
//! values collected alongside the outcome, never thrown.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::registry::SchemaError;
use crate::core::store::StoreError;

/// Field name used for errors that concern the whole row
pub const GENERAL_FIELD: &str = "general";

/// Classification of a row-scoped failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    RequiredField,
    MinLength,
    MaxLength,
    InvalidEmail,
    InvalidInteger,
    FormatError,
    MissingColumns,
    ParseError,
    PersistenceError,
}

/// One validation or persistence failure, tagged with its row
///
/// Rows are numbered 1-based with the header as row 1, so the first
/// data row is 2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    pub row: usize,
    pub field: String,
    pub kind: ErrorKind,
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl RowError {
    /// A failure attributed to one field
    pub fn field(
        row: usize,
        field: impl Into<String>,
        kind: ErrorKind,
        message: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        Self {
            row,
            field: field.into(),
            kind,
            message: message.into(),
            value,
        }
    }

    /// A failure concerning the whole row
    pub fn general(row: usize, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            row,
            field: GENERAL_FIELD.to_string(),
            kind,
            message: message.into(),
            value: None,
        }
    }
}

/// Whole-file parse failures - nothing row-scoped can be salvaged
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("the file is empty")]
    Empty,

    #[error("the file has no header row")]
    NoHeader,

    #[error("the workbook contains no sheets")]
    NoSheets,

    #[error("unsupported file format '{extension}': use .csv or .xlsx")]
    UnsupportedFormat { extension: String },

    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid workbook: {0}")]
    Workbook(String),
}

/// Top-level pipeline failure
#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
