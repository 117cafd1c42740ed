// src/normalization/mod.rs
//! Field normalizer: per-field pure functions that turn raw values into the
//! canonical comparison form. Every function is total; unparsable input
//! becomes an empty string and the record stays in the pipeline.

pub mod address;
pub mod date;
pub mod email;
pub mod phone;
pub mod text;

pub use address::normalize_address_line;
pub use date::normalize_date;
pub use email::normalize_email;
pub use phone::normalize_phone;
pub use text::{normalize_insurance_id, normalize_state, normalize_text, normalize_zip};

use crate::errors::NormalizationWarning;
use crate::models::core::{CanonicalField, CanonicalRecord, RecordKey};

/// Canonical-field values pulled out of a raw record by the schema mapper,
/// not yet normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappedFields {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub insurance_id: Option<String>,
}

/// A canonical record plus the warnings raised while normalizing it.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub record: CanonicalRecord,
    pub warnings: Vec<NormalizationWarning>,
}

fn warning_reason(field: CanonicalField) -> &'static str {
    match field {
        CanonicalField::DateOfBirth => "is not a recognizable date",
        CanonicalField::Phone => "does not have 7 to 15 digits",
        CanonicalField::Email => "is not a local@domain address",
        CanonicalField::AddressLine => "has no address tokens after noise removal",
        CanonicalField::State => "is not a state code or US state name",
        CanonicalField::Zip => "has fewer than 5 digits",
        _ => "is empty after normalization",
    }
}

struct FieldNormalizer {
    warnings: Vec<NormalizationWarning>,
}

impl FieldNormalizer {
    fn apply(
        &mut self,
        field: CanonicalField,
        raw: Option<&str>,
        normalize: fn(&str) -> String,
    ) -> String {
        let Some(raw) = raw else {
            return String::new();
        };
        let normalized = normalize(raw);
        if normalized.is_empty() && !raw.trim().is_empty() {
            self.warnings.push(NormalizationWarning {
                field,
                raw_value: raw.to_string(),
                reason: warning_reason(field),
            });
        }
        normalized
    }

    fn apply_optional(
        &mut self,
        field: CanonicalField,
        raw: Option<&str>,
        normalize: fn(&str) -> String,
    ) -> Option<String> {
        Some(self.apply(field, raw, normalize)).filter(|v| !v.is_empty())
    }
}

/// Builds the canonical record for `key` from mapped values.
pub fn normalize_record(key: RecordKey, mapped: &MappedFields) -> NormalizedRecord {
    let mut n = FieldNormalizer {
        warnings: Vec::new(),
    };

    let record = CanonicalRecord {
        first_name: n.apply(CanonicalField::FirstName, mapped.first_name.as_deref(), normalize_text),
        last_name: n.apply(CanonicalField::LastName, mapped.last_name.as_deref(), normalize_text),
        middle_name: n.apply_optional(CanonicalField::MiddleName, mapped.middle_name.as_deref(), normalize_text),
        date_of_birth: n.apply(CanonicalField::DateOfBirth, mapped.date_of_birth.as_deref(), normalize_date),
        phone: n.apply(CanonicalField::Phone, mapped.phone.as_deref(), normalize_phone),
        email: n.apply(CanonicalField::Email, mapped.email.as_deref(), normalize_email),
        address_line: n.apply(CanonicalField::AddressLine, mapped.address_line.as_deref(), normalize_address_line),
        city: n.apply_optional(CanonicalField::City, mapped.city.as_deref(), normalize_text),
        state: n.apply_optional(CanonicalField::State, mapped.state.as_deref(), normalize_state),
        zip: n.apply_optional(CanonicalField::Zip, mapped.zip.as_deref(), normalize_zip),
        insurance_id: n.apply_optional(CanonicalField::InsuranceId, mapped.insurance_id.as_deref(), normalize_insurance_id),
        key,
    };

    NormalizedRecord {
        record,
        warnings: n.warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapped() -> MappedFields {
        MappedFields {
            first_name: Some("  JOHN ".to_string()),
            last_name: Some("Smith".to_string()),
            date_of_birth: Some("01/15/1980".to_string()),
            phone: Some("(555) 123-4567".to_string()),
            email: Some("John@Example.com".to_string()),
            address_line: Some("123 Main St Apt 4".to_string()),
            city: Some("Springfield".to_string()),
            state: Some("IL".to_string()),
            zip: Some("62701".to_string()),
            insurance_id: Some("INS-001".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_record_produces_canonical_fields() {
        let out = normalize_record(RecordKey::new("clinic", "1"), &mapped());
        let r = &out.record;
        assert!(out.warnings.is_empty());
        assert_eq!(r.first_name, "john");
        assert_eq!(r.last_name, "smith");
        assert_eq!(r.middle_name, None);
        assert_eq!(r.date_of_birth, "1980-01-15");
        assert_eq!(r.phone, "5551234567");
        assert_eq!(r.email, "john@example.com");
        assert_eq!(r.address_line, "123 main street");
        assert_eq!(r.city.as_deref(), Some("springfield"));
        assert_eq!(r.state.as_deref(), Some("il"));
        assert_eq!(r.zip.as_deref(), Some("62701"));
        assert_eq!(r.insurance_id.as_deref(), Some("ins001"));
    }

    #[test]
    fn test_unparsable_values_warn_and_become_absent() {
        let mut fields = mapped();
        fields.date_of_birth = Some("sometime in spring".to_string());
        fields.phone = Some("123".to_string());
        fields.zip = Some("12".to_string());

        let out = normalize_record(RecordKey::new("clinic", "1"), &fields);
        assert_eq!(out.record.date_of_birth, "");
        assert_eq!(out.record.phone, "");
        assert_eq!(out.record.zip, None);

        let warned: Vec<_> = out.warnings.iter().map(|w| w.field).collect();
        assert_eq!(
            warned,
            vec![CanonicalField::DateOfBirth, CanonicalField::Phone, CanonicalField::Zip]
        );
        assert_eq!(out.warnings[0].raw_value, "sometime in spring");
    }

    #[test]
    fn test_missing_values_do_not_warn() {
        let out = normalize_record(RecordKey::new("clinic", "1"), &MappedFields::default());
        assert!(out.warnings.is_empty());
        assert!(!out.record.has_blocking_fields());
    }
}
