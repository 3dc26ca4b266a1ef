//! Template generator - downloadable workbook for an entity type
//!
//! Produces an XLSX artifact with a "Data" sheet (headers plus one
//! example row) and an "Instructions" sheet. Example values are
//! deterministic and honor the declared constraints, so a generated
//! example always re-validates cleanly.

use chrono::Utc;
use rust_xlsxwriter::{Format, Workbook};
use thiserror::Error;

use crate::pipeline::spec::{DataType, FieldSpec, SchemaSummary};

/// MIME type of the generated workbook
pub const TEMPLATE_MIME: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("could not build workbook: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),
}

/// A generated template, ready to write or send
#[derive(Debug, Clone)]
pub struct TemplateArtifact {
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// Build the import template workbook for an entity type
pub fn generate_template(summary: &SchemaSummary) -> Result<TemplateArtifact, TemplateError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let data = workbook.add_worksheet();
    data.set_name("Data")?;
    for (col, field) in summary.fields.iter().enumerate() {
        let col = col as u16;
        data.write_string_with_format(0, col, field.name.as_str(), &bold)?;
        data.write_string(1, col, example_value(field).as_str())?;
        data.set_column_width(col, column_width(&field.name))?;
    }

    let instructions = workbook.add_worksheet();
    instructions.set_name("Instructions")?;
    for (row, line) in instruction_lines(summary).iter().enumerate() {
        instructions.write_string(row as u32, 0, line.as_str())?;
    }
    instructions.set_column_width(0, 80.0)?;

    let bytes = workbook.save_to_buffer()?;
    let filename = format!(
        "template_{}_{}.xlsx",
        summary.uid,
        Utc::now().format("%Y-%m-%d")
    );

    Ok(TemplateArtifact {
        filename,
        mime: TEMPLATE_MIME,
        bytes,
    })
}

/// Deterministic example value for one field, fitted to its constraints
pub fn example_value(field: &FieldSpec) -> String {
    let rules = &field.rules;
    if !rules.values.is_empty() {
        return rules.values[0].clone();
    }

    match field.data_type {
        DataType::ShortText => {
            let lower = field.name.to_lowercase();
            let base = if lower.contains("name") || lower.contains("nombre") {
                "Juan Pérez"
            } else if lower.contains("code") || lower.contains("codigo") {
                "ABC123"
            } else {
                "Sample text"
            };
            fit_length(base, rules.min_length, rules.max_length)
        }
        DataType::LongText => fit_length(
            "A longer example paragraph.",
            rules.min_length,
            rules.max_length,
        ),
        DataType::Email => "usuario@ejemplo.com".to_string(),
        DataType::Integer | DataType::BigInteger => {
            format!("{}", clamp(123.0, rules.min, rules.max) as i64)
        }
        DataType::Float | DataType::Decimal => {
            format!("{}", clamp(123.45, rules.min, rules.max))
        }
        DataType::Boolean => "true".to_string(),
        DataType::Date => Utc::now().format("%Y-%m-%d").to_string(),
        DataType::DateTime => Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        DataType::Time => "12:00:00".to_string(),
        DataType::Enumeration => String::new(),
        DataType::UniqueIdentifier => {
            fit_length("sample-123", rules.min_length, rules.max_length)
        }
    }
}

fn instruction_lines(summary: &SchemaSummary) -> Vec<String> {
    vec![
        "USAGE INSTRUCTIONS".to_string(),
        String::new(),
        "1. This template imports records into the entity type:".to_string(),
        format!("   {} ({})", summary.display_name, summary.uid),
        String::new(),
        "2. IMPORTANT:".to_string(),
        "   - Do NOT rename the column headers".to_string(),
        "   - Row 2 contains example values; delete it before importing".to_string(),
        "   - Required fields must be filled in on every row".to_string(),
        "   - Respect the declared data types and formats".to_string(),
        String::new(),
        "3. Available fields:".to_string(),
        format!("   - Total fields: {}", summary.total_fields),
        format!("   - Importable fields: {}", summary.importable_fields),
        format!("   - Required fields: {}", summary.required_fields),
    ]
}

fn column_width(header: &str) -> f64 {
    header.chars().count().max(12) as f64 + 2.0
}

/// Fit a sample to declared length bounds: truncate to max, pad to min
fn fit_length(base: &str, min: Option<usize>, max: Option<usize>) -> String {
    let mut value: String = match max {
        Some(max) => base.chars().take(max).collect(),
        None => base.to_string(),
    };
    if let Some(min) = min {
        while value.chars().count() < min {
            value.push('x');
        }
    }
    value
}

fn clamp(base: f64, min: Option<f64>, max: Option<f64>) -> f64 {
    let mut value = base;
    if let Some(min) = min {
        value = value.max(min);
    }
    if let Some(max) = max {
        value = value.min(max);
    }
    value
}
