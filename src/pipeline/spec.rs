//! Field specs - the importer's normalized view of an entity type
//!
//! The introspector reduces a raw entity type definition to the ordered
//! list of importable fields. System bookkeeping fields and structural
//! fields (relations, media, components, zones) are dropped: they have
//! no flat tabular representation.

use serde::Serialize;

use crate::core::registry::{EntityTypeDefinition, FieldType, SYSTEM_FIELDS};

/// Data type of an importable field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataType {
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
    UniqueIdentifier,
}

impl DataType {
    fn from_field_type(field_type: FieldType) -> Option<Self> {
        match field_type {
            FieldType::ShortText => Some(DataType::ShortText),
            FieldType::LongText => Some(DataType::LongText),
            FieldType::Email => Some(DataType::Email),
            FieldType::Integer => Some(DataType::Integer),
            FieldType::BigInteger => Some(DataType::BigInteger),
            FieldType::Float => Some(DataType::Float),
            FieldType::Decimal => Some(DataType::Decimal),
            FieldType::Boolean => Some(DataType::Boolean),
            FieldType::Date => Some(DataType::Date),
            FieldType::DateTime => Some(DataType::DateTime),
            FieldType::Time => Some(DataType::Time),
            FieldType::Enumeration => Some(DataType::Enumeration),
            FieldType::Uid => Some(DataType::UniqueIdentifier),
            FieldType::Relation
            | FieldType::Media
            | FieldType::Component
            | FieldType::DynamicZone => None,
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DataType::ShortText => "short-text",
            DataType::LongText => "long-text",
            DataType::Email => "email",
            DataType::Integer => "integer",
            DataType::BigInteger => "big-integer",
            DataType::Float => "float",
            DataType::Decimal => "decimal",
            DataType::Boolean => "boolean",
            DataType::Date => "date",
            DataType::DateTime => "date-time",
            DataType::Time => "time",
            DataType::Enumeration => "enumeration",
            DataType::UniqueIdentifier => "unique-identifier",
        };
        write!(f, "{}", name)
    }
}

/// Machine-readable constraints the validator enforces
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldRules {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub pattern: Option<String>,
    pub values: Vec<String>,
    pub unique: bool,
}

/// One importable field: type, requiredness, constraints
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    pub name: String,
    pub data_type: DataType,
    pub required: bool,
    pub rules: FieldRules,

    /// Human-readable constraint descriptions, derived from `rules`
    pub constraints: Vec<String>,
}

/// Introspection result: importable fields plus counts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaSummary {
    pub uid: String,
    pub display_name: String,
    pub fields: Vec<FieldSpec>,
    pub total_fields: usize,
    pub importable_fields: usize,
    pub required_fields: usize,
}

/// Derive the importable field specs for an entity type.
///
/// Deterministic: field order follows the definition, and constraint
/// strings are generated in a fixed order.
pub fn introspect(def: &EntityTypeDefinition) -> SchemaSummary {
    let mut fields = Vec::new();
    let mut required_fields = 0;

    for field in &def.fields {
        if SYSTEM_FIELDS.contains(&field.name.as_str()) {
            continue;
        }
        let Some(data_type) = DataType::from_field_type(field.field_type) else {
            continue;
        };

        if field.required {
            required_fields += 1;
        }

        let rules = FieldRules {
            min_length: field.min_length,
            max_length: field.max_length,
            min: field.min,
            max: field.max,
            pattern: field.regex.clone(),
            values: field.values.clone(),
            unique: field.unique,
        };
        let constraints = describe_constraints(data_type, &rules);

        fields.push(FieldSpec {
            name: field.name.clone(),
            data_type,
            required: field.required,
            rules,
            constraints,
        });
    }

    SchemaSummary {
        uid: def.uid.clone(),
        display_name: def.display_name.clone(),
        importable_fields: fields.len(),
        total_fields: def.fields.len(),
        required_fields,
        fields,
    }
}

fn describe_constraints(data_type: DataType, rules: &FieldRules) -> Vec<String> {
    let mut constraints = Vec::new();

    if let Some(min) = rules.min_length {
        constraints.push(format!("Minimum {} characters", min));
    }
    if let Some(max) = rules.max_length {
        constraints.push(format!("Maximum {} characters", max));
    }
    if let Some(min) = rules.min {
        constraints.push(format!("Minimum value: {}", min));
    }
    if let Some(max) = rules.max {
        constraints.push(format!("Maximum value: {}", max));
    }
    if rules.unique {
        constraints.push("Must be unique".to_string());
    }
    if let Some(pattern) = &rules.pattern {
        constraints.push(format!("Pattern: {}", pattern));
    }
    if !rules.values.is_empty() {
        constraints.push(format!("Allowed values: {}", rules.values.join(", ")));
    }
    match data_type {
        DataType::Email => constraints.push("Valid email format".to_string()),
        DataType::UniqueIdentifier => {
            constraints.push("Letters, numbers, hyphens and underscores only".to_string())
        }
        DataType::Date => constraints.push("Date in YYYY-MM-DD format".to_string()),
        _ => {}
    }

    constraints
}
