// src/schema/mod.rs
//! Schema mapper: per-source field maps onto the canonical schema.

pub mod address_parsing;
pub mod sources;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

use crate::errors::SchemaMismatchError;
use crate::models::core::{scalar_text, RawRecord, RecordKey};
use crate::normalization::{normalize_record, MappedFields, NormalizedRecord};
use address_parsing::split_combined_address;

/// How a source stores the patient's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum NameLayout {
    /// Separate columns per name part.
    Split {
        first: String,
        #[serde(default)]
        middle: Option<String>,
        last: String,
    },
    /// One column; the last whitespace-delimited token is the last name,
    /// the first token the first name, anything between the middle name.
    Full { field: String },
}

/// How a source stores the address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum AddressLayout {
    /// Free text, e.g. `123 Main St, Springfield, IL 62701` or multi-line.
    Combined { field: String },
    /// A JSON object (or JSON text of one) with street/city/state/zip keys.
    JsonObject { field: String },
    /// One column per part.
    Columns {
        line: String,
        #[serde(default)]
        city: Option<String>,
        #[serde(default)]
        state: Option<String>,
        #[serde(default)]
        zip: Option<String>,
    },
}

const JSON_STREET_KEYS: [&str; 4] = ["street", "address_line", "street_address", "line1"];
const JSON_CITY_KEYS: [&str; 1] = ["city"];
const JSON_STATE_KEYS: [&str; 3] = ["state", "state_province", "region"];
const JSON_ZIP_KEYS: [&str; 3] = ["zip", "zip_code", "postal_code"];

/// Explicit field-to-canonical mapping for one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSchema {
    pub source_name: String,
    pub id_field: String,
    pub name: NameLayout,
    pub date_of_birth: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<AddressLayout>,
    #[serde(default)]
    pub insurance_id: Option<String>,
}

impl SourceSchema {
    fn record_key(&self, raw: &RawRecord) -> Result<RecordKey, SchemaMismatchError> {
        match raw.text(&self.id_field) {
            Some(id) => Ok(RecordKey::new(&self.source_name, id)),
            None => Err(SchemaMismatchError::new(
                row_key(raw),
                &self.id_field,
                "record id is missing",
            )),
        }
    }

    /// Pulls canonical values out of `raw` according to this schema.
    pub fn map_fields(
        &self,
        raw: &RawRecord,
    ) -> Result<(RecordKey, MappedFields), SchemaMismatchError> {
        let key = self.record_key(raw)?;
        let mut mapped = MappedFields::default();

        match &self.name {
            NameLayout::Split {
                first,
                middle,
                last,
            } => {
                mapped.first_name = raw.text(first);
                mapped.last_name = raw.text(last);
                mapped.middle_name = middle.as_deref().and_then(|m| raw.text(m));
                if mapped.first_name.is_none() && mapped.last_name.is_none() {
                    return Err(SchemaMismatchError::new(
                        key,
                        format!("{}/{}", first, last),
                        "no name could be derived",
                    ));
                }
            }
            NameLayout::Full { field } => {
                let Some(full_name) = raw.text(field) else {
                    return Err(SchemaMismatchError::new(key, field, "full name is missing"));
                };
                let (first, middle, last) = split_full_name(&full_name).ok_or_else(|| {
                    SchemaMismatchError::new(
                        key.clone(),
                        field,
                        format!("cannot split '{}' into first and last name", full_name),
                    )
                })?;
                mapped.first_name = Some(first);
                mapped.middle_name = middle;
                mapped.last_name = Some(last);
            }
        }

        mapped.date_of_birth = raw.text(&self.date_of_birth);
        mapped.phone = self.phone.as_deref().and_then(|f| raw.text(f));
        mapped.email = self.email.as_deref().and_then(|f| raw.text(f));
        mapped.insurance_id = self.insurance_id.as_deref().and_then(|f| raw.text(f));

        match &self.address {
            None => {}
            Some(AddressLayout::Combined { field }) => {
                if let Some(text) = raw.text(field) {
                    let parts = split_combined_address(&text);
                    mapped.address_line = parts.line;
                    mapped.city = parts.city;
                    mapped.state = parts.state;
                    mapped.zip = parts.zip;
                }
            }
            Some(AddressLayout::JsonObject { field }) => {
                if let Some(object) = json_address(raw, field).map_err(|reason| {
                    SchemaMismatchError::new(key.clone(), field, reason)
                })? {
                    mapped.address_line = first_key(&object, &JSON_STREET_KEYS);
                    mapped.city = first_key(&object, &JSON_CITY_KEYS);
                    mapped.state = first_key(&object, &JSON_STATE_KEYS);
                    mapped.zip = first_key(&object, &JSON_ZIP_KEYS);
                }
            }
            Some(AddressLayout::Columns {
                line,
                city,
                state,
                zip,
            }) => {
                // the line column may carry the whole address; its own columns win
                let parts = raw
                    .text(line)
                    .map(|text| split_combined_address(&text))
                    .unwrap_or_default();
                mapped.address_line = parts.line;
                mapped.city = city.as_deref().and_then(|f| raw.text(f)).or(parts.city);
                mapped.state = state.as_deref().and_then(|f| raw.text(f)).or(parts.state);
                mapped.zip = zip.as_deref().and_then(|f| raw.text(f)).or(parts.zip);
            }
        }

        Ok((key, mapped))
    }

    /// `map(rawRecord, sourceName) → CanonicalRecord` for this source.
    pub fn map(&self, raw: &RawRecord) -> Result<NormalizedRecord, SchemaMismatchError> {
        let (key, mapped) = self.map_fields(raw)?;
        Ok(normalize_record(key, &mapped))
    }
}

fn row_key(raw: &RawRecord) -> RecordKey {
    RecordKey::new(&raw.source_name, format!("row:{}", raw.row_number))
}

/// Splits a full name: first token, optional middle tokens, last token.
pub fn split_full_name(full_name: &str) -> Option<(String, Option<String>, String)> {
    let tokens: Vec<&str> = full_name.split_whitespace().collect();
    if tokens.len() < 2 {
        return None;
    }
    let first = tokens[0].to_string();
    let last = tokens[tokens.len() - 1].to_string();
    let middle = if tokens.len() > 2 {
        Some(tokens[1..tokens.len() - 1].join(" "))
    } else {
        None
    };
    Some((first, middle, last))
}

/// `Ok(None)` when the column is absent or blank; `Err` when it holds
/// something that is not a JSON object.
fn json_address(raw: &RawRecord, field: &str) -> Result<Option<Map<String, JsonValue>>, String> {
    match raw.value(field) {
        None => Ok(None),
        Some(JsonValue::Object(object)) => Ok(Some(object.clone())),
        Some(JsonValue::String(text)) if text.trim().is_empty() => Ok(None),
        Some(JsonValue::String(text)) => match serde_json::from_str::<JsonValue>(text) {
            Ok(JsonValue::Object(object)) => Ok(Some(object)),
            Ok(_) => Err("address JSON is not an object".to_string()),
            Err(e) => Err(format!("unparsable address JSON ({})", e)),
        },
        Some(_) => Err("address is neither a JSON object nor JSON text".to_string()),
    }
}

fn first_key(object: &Map<String, JsonValue>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| object.get(*k).and_then(scalar_text))
}

/// All known source schemas, keyed by source name.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, SourceSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the clinic, hospital, urgent care and physical therapy schemas.
    pub fn with_builtin_sources() -> Self {
        let mut registry = Self::new();
        for schema in sources::builtin_schemas() {
            registry.register(schema);
        }
        registry
    }

    /// Adds schemas declared as a JSON array, replacing same-named ones.
    pub fn extend_from_json(&mut self, json: &str) -> Result<usize, serde_json::Error> {
        let schemas: Vec<SourceSchema> = serde_json::from_str(json)?;
        let count = schemas.len();
        for schema in schemas {
            self.register(schema);
        }
        Ok(count)
    }

    /// Returns the schema previously registered under the same name, if any.
    pub fn register(&mut self, schema: SourceSchema) -> Option<SourceSchema> {
        self.schemas.insert(schema.source_name.clone(), schema)
    }

    pub fn get(&self, source_name: &str) -> Option<&SourceSchema> {
        self.schemas.get(source_name)
    }

    pub fn source_names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Maps a raw record through its source's schema and normalizes it.
    pub fn map_record(&self, raw: &RawRecord) -> Result<NormalizedRecord, SchemaMismatchError> {
        match self.get(&raw.source_name) {
            Some(schema) => schema.map(raw),
            None => {
                let key = raw
                    .text("id")
                    .map(|id| RecordKey::new(&raw.source_name, id))
                    .unwrap_or_else(|| row_key(raw));
                Err(SchemaMismatchError::new(
                    key,
                    "source",
                    format!("no schema registered for source '{}'", raw.source_name),
                ))
            }
        }
    }
}
