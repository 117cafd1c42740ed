// src/models/core.rs
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;

/// Column name to raw value, exactly as a source delivered it.
pub type RawFields = BTreeMap<String, JsonValue>;

/// Identity of a record: the source it came from and its id within that source.
///
/// Ordering is lexicographic on `(source, source_record_id)`, which is the
/// tie-break used everywhere output has to be reproducible.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub source: String,
    pub source_record_id: String,
}

impl RecordKey {
    pub fn new(source: impl Into<String>, source_record_id: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            source_record_id: source_record_id.into(),
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.source, self.source_record_id)
    }
}

/// One batch of rows from a single source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceBatch {
    pub source_name: String,
    pub records: Vec<RawFields>,
}

impl SourceBatch {
    pub fn new(source_name: impl Into<String>, records: Vec<RawFields>) -> Self {
        Self {
            source_name: source_name.into(),
            records,
        }
    }
}

/// A row as ingested from a source. Never modified after ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub source_name: String,
    /// 1-based position inside its batch, used to identify rows without an id.
    pub row_number: usize,
    pub fields: RawFields,
}

impl RawRecord {
    pub fn new(source_name: impl Into<String>, row_number: usize, fields: RawFields) -> Self {
        Self {
            source_name: source_name.into(),
            row_number,
            fields,
        }
    }

    pub fn value(&self, column: &str) -> Option<&JsonValue> {
        self.fields.get(column).filter(|v| !v.is_null())
    }

    /// Scalar column value rendered as trimmed text; `None` for null, blank or missing.
    pub fn text(&self, column: &str) -> Option<String> {
        self.value(column).and_then(scalar_text)
    }
}

/// Renders a scalar JSON value as text. Objects and arrays are not scalars.
pub fn scalar_text(value: &JsonValue) -> Option<String> {
    let text = match value {
        JsonValue::String(s) => s.trim().to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Fields of the canonical comparison schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    FirstName,
    LastName,
    MiddleName,
    DateOfBirth,
    Phone,
    Email,
    AddressLine,
    City,
    State,
    Zip,
    InsuranceId,
}

impl CanonicalField {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::FirstName => "first_name",
            CanonicalField::LastName => "last_name",
            CanonicalField::MiddleName => "middle_name",
            CanonicalField::DateOfBirth => "date_of_birth",
            CanonicalField::Phone => "phone",
            CanonicalField::Email => "email",
            CanonicalField::AddressLine => "address_line",
            CanonicalField::City => "city",
            CanonicalField::State => "state",
            CanonicalField::Zip => "zip",
            CanonicalField::InsuranceId => "insurance_id",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record in the canonical comparison schema.
///
/// Required-shape fields are plain strings where empty means "absent";
/// optional fields are `None` when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub key: RecordKey,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    /// `YYYY-MM-DD` or empty.
    pub date_of_birth: String,
    /// Digits only or empty.
    pub phone: String,
    pub email: String,
    pub address_line: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub insurance_id: Option<String>,
}

impl CanonicalRecord {
    pub fn birth_year(&self) -> Option<i32> {
        self.date_of_birth.get(..4)?.parse().ok()
    }

    /// Whether the record carries both fields the default block key is built from.
    pub fn has_blocking_fields(&self) -> bool {
        !self.last_name.is_empty() && !self.date_of_birth.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_key_orders_by_source_then_id() {
        let mut keys = vec![
            RecordKey::new("hospital", "2"),
            RecordKey::new("clinic", "9"),
            RecordKey::new("clinic", "10"),
        ];
        keys.sort();
        assert_eq!(keys[0], RecordKey::new("clinic", "10"));
        assert_eq!(keys[1], RecordKey::new("clinic", "9"));
        assert_eq!(keys[2], RecordKey::new("hospital", "2"));
    }

    #[test]
    fn test_raw_record_text_handles_scalars_and_blanks() {
        let mut fields = RawFields::new();
        fields.insert("id".to_string(), json!(42));
        fields.insert("name".to_string(), json!("  Ann "));
        fields.insert("blank".to_string(), json!("   "));
        fields.insert("nothing".to_string(), JsonValue::Null);
        fields.insert("nested".to_string(), json!({"a": 1}));
        let raw = RawRecord::new("clinic", 1, fields);

        assert_eq!(raw.text("id").as_deref(), Some("42"));
        assert_eq!(raw.text("name").as_deref(), Some("Ann"));
        assert_eq!(raw.text("blank"), None);
        assert_eq!(raw.text("nothing"), None);
        assert_eq!(raw.text("nested"), None);
        assert_eq!(raw.text("missing"), None);
        assert!(raw.value("nested").is_some());
    }
}
