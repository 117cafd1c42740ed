// src/ingestion.rs
//! Source batches in, raw records out. Batches come from callers directly or
//! from `.csv` / `.json` files.

use log::{debug, info};
use serde_json::Value as JsonValue;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::errors::{DedupeError, DedupeResult};
use crate::models::core::{RawFields, RawRecord, SourceBatch};

/// Flattens batches into raw records, numbering rows from 1 within each batch.
pub fn ingest_batches(batches: &[SourceBatch]) -> Vec<RawRecord> {
    let mut raw_records = Vec::with_capacity(batches.iter().map(|b| b.records.len()).sum());
    for batch in batches {
        debug!(
            "Ingesting {} rows from source '{}'",
            batch.records.len(),
            batch.source_name
        );
        raw_records.extend(
            batch
                .records
                .iter()
                .enumerate()
                .map(|(i, fields)| RawRecord::new(&batch.source_name, i + 1, fields.clone())),
        );
    }
    raw_records
}

/// CSV with a header row. Every cell is a string; empty cells are null.
pub fn read_csv_batch<R: Read>(source_name: &str, reader: R) -> DedupeResult<SourceBatch> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result?;
        let fields: RawFields = headers
            .iter()
            .zip(row.iter())
            .map(|(column, cell)| {
                let value = if cell.trim().is_empty() {
                    JsonValue::Null
                } else {
                    JsonValue::String(cell.to_string())
                };
                (column.to_string(), value)
            })
            .collect();
        records.push(fields);
    }
    Ok(SourceBatch::new(source_name, records))
}

/// JSON array of objects, values kept as delivered.
pub fn read_json_batch<R: Read>(source_name: &str, reader: R) -> DedupeResult<SourceBatch> {
    let records: Vec<RawFields> = serde_json::from_reader(reader)?;
    Ok(SourceBatch::new(source_name, records))
}

/// Reads a batch file, picking the format from its extension.
pub fn read_batch_file(source_name: &str, path: &Path) -> DedupeResult<SourceBatch> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let reader = BufReader::new(File::open(path)?);
    let batch = match extension.as_deref() {
        Some("csv") => read_csv_batch(source_name, reader)?,
        Some("json") => read_json_batch(source_name, reader)?,
        _ => {
            return Err(DedupeError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{}: expected a .csv or .json file", path.display()),
            )))
        }
    };
    info!(
        "📥 Loaded {} rows for source '{}' from {}",
        batch.records.len(),
        source_name,
        path.display()
    );
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_ingest_numbers_rows_per_batch() {
        let row = |id: i64| -> RawFields {
            serde_json::from_value(json!({ "patient_id": id })).unwrap()
        };
        let batches = vec![
            SourceBatch::new("clinic", vec![row(1), row(2)]),
            SourceBatch::new("hospital", vec![row(3)]),
        ];
        let raw = ingest_batches(&batches);
        let positions: Vec<_> = raw
            .iter()
            .map(|r| (r.source_name.as_str(), r.row_number))
            .collect();
        assert_eq!(positions, vec![("clinic", 1), ("clinic", 2), ("hospital", 1)]);
    }

    #[test]
    fn test_csv_batch_empty_cells_are_null() {
        let data = "patient_id, first_name ,phone_number\n1,Ann,\n2,\"Lee, Jr\",555-1234\n";
        let batch = read_csv_batch("clinic", data.as_bytes()).unwrap();
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.records[0]["first_name"], json!("Ann"));
        assert_eq!(batch.records[0]["phone_number"], JsonValue::Null);
        assert_eq!(batch.records[1]["first_name"], json!("Lee, Jr"));
    }

    #[test]
    fn test_read_batch_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("hospital.json");
        let mut file = File::create(&json_path).unwrap();
        write!(
            file,
            r#"[{{"hospital_patient_id": "H1", "address": {{"street": "1 Main St"}}}}]"#
        )
        .unwrap();
        let batch = read_batch_file("hospital", &json_path).unwrap();
        assert_eq!(batch.source_name, "hospital");
        assert!(batch.records[0]["address"].is_object());

        let csv_path = dir.path().join("clinic.CSV");
        std::fs::write(&csv_path, "patient_id,last_name\n9,Lee\n").unwrap();
        let batch = read_batch_file("clinic", &csv_path).unwrap();
        assert_eq!(batch.records[0]["last_name"], json!("Lee"));

        let txt_path = dir.path().join("clinic.txt");
        std::fs::write(&txt_path, "").unwrap();
        assert!(matches!(
            read_batch_file("clinic", &txt_path),
            Err(DedupeError::Io(_))
        ));
    }
}
