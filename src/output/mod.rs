// src/output/mod.rs
//! Result emitter: flat report rows plus the exception, cluster summary and
//! pair audit tables, all writable as CSV.

use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::errors::{DedupeResult, SchemaMismatchError};
use crate::models::cluster::Cluster;
use crate::models::core::CanonicalRecord;
use crate::models::matching::PairScore;

/// A row type with a fixed CSV header, written even when the table is empty.
pub trait CsvTable: Serialize {
    const HEADERS: &'static [&'static str];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DedupeReportRow {
    pub cluster_id: u64,
    pub source: String,
    pub source_record_id: String,
    pub cluster_confidence: f64,
    pub is_primary: bool,
}

impl CsvTable for DedupeReportRow {
    const HEADERS: &'static [&'static str] = &[
        "cluster_id",
        "source",
        "source_record_id",
        "cluster_confidence",
        "is_primary",
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExceptionRow {
    pub source: String,
    pub source_record_id: String,
    pub reason: String,
}

impl CsvTable for ExceptionRow {
    const HEADERS: &'static [&'static str] = &["source", "source_record_id", "reason"];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSummaryRow {
    pub cluster_id: u64,
    pub size: usize,
    pub min_edge_score: f64,
    pub mean_edge_score: f64,
    pub edge_count: usize,
    pub weak_chaining: bool,
    pub contradicting_pairs: usize,
    pub fingerprint: String,
}

impl CsvTable for ClusterSummaryRow {
    const HEADERS: &'static [&'static str] = &[
        "cluster_id",
        "size",
        "min_edge_score",
        "mean_edge_score",
        "edge_count",
        "weak_chaining",
        "contradicting_pairs",
        "fingerprint",
    ];
}

/// One scored candidate pair, with the per-field similarities behind it.
/// Absent fields are empty cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairScoreRow {
    pub left_source: String,
    pub left_record_id: String,
    pub right_source: String,
    pub right_record_id: String,
    pub first_name: Option<f64>,
    pub last_name: Option<f64>,
    pub date_of_birth: Option<f64>,
    pub phone: Option<f64>,
    pub email: Option<f64>,
    pub address_line: Option<f64>,
    pub insurance_id: Option<f64>,
    pub probability: f64,
    pub is_match: bool,
}

impl CsvTable for PairScoreRow {
    const HEADERS: &'static [&'static str] = &[
        "left_source",
        "left_record_id",
        "right_source",
        "right_record_id",
        "first_name",
        "last_name",
        "date_of_birth",
        "phone",
        "email",
        "address_line",
        "insurance_id",
        "probability",
        "is_match",
    ];
}

/// Report rows ordered by cluster id, then source and record id. The primary
/// member is the cluster's smallest `(source, source_record_id)`.
pub fn emit(clusters: &[Cluster]) -> Vec<DedupeReportRow> {
    let mut ordered: Vec<&Cluster> = clusters.iter().collect();
    ordered.sort_by_key(|c| c.cluster_id);

    let mut rows = Vec::with_capacity(ordered.iter().map(|c| c.size()).sum());
    for cluster in ordered {
        let mut members = cluster.members.clone();
        members.sort();
        for (position, key) in members.into_iter().enumerate() {
            rows.push(DedupeReportRow {
                cluster_id: cluster.cluster_id,
                source: key.source,
                source_record_id: key.source_record_id,
                cluster_confidence: cluster.confidence.mean_edge_score,
                is_primary: position == 0,
            });
        }
    }
    rows
}

pub fn emit_exceptions(exceptions: &[SchemaMismatchError]) -> Vec<ExceptionRow> {
    exceptions
        .iter()
        .map(|e| ExceptionRow {
            source: e.key.source.clone(),
            source_record_id: e.key.source_record_id.clone(),
            reason: e.reason_text(),
        })
        .collect()
}

pub fn summarize_clusters(clusters: &[Cluster]) -> Vec<ClusterSummaryRow> {
    let mut rows: Vec<ClusterSummaryRow> = clusters
        .iter()
        .map(|c| ClusterSummaryRow {
            cluster_id: c.cluster_id,
            size: c.size(),
            min_edge_score: c.confidence.min_edge_score,
            mean_edge_score: c.confidence.mean_edge_score,
            edge_count: c.confidence.edge_count,
            weak_chaining: c.confidence.weak_chaining,
            contradicting_pairs: c.confidence.contradicting_pairs,
            fingerprint: c.fingerprint.clone(),
        })
        .collect();
    rows.sort_by_key(|r| r.cluster_id);
    rows
}

/// Audit rows for scored pairs. `records` is the list the pair indices refer to.
pub fn emit_pair_scores(records: &[CanonicalRecord], scores: &[PairScore]) -> Vec<PairScoreRow> {
    scores
        .iter()
        .filter_map(|s| {
            let left = &records.get(s.pair.left())?.key;
            let right = &records.get(s.pair.right())?.key;
            Some(PairScoreRow {
                left_source: left.source.clone(),
                left_record_id: left.source_record_id.clone(),
                right_source: right.source.clone(),
                right_record_id: right.source_record_id.clone(),
                first_name: s.fields.first_name,
                last_name: s.fields.last_name,
                date_of_birth: s.fields.date_of_birth,
                phone: s.fields.phone,
                email: s.fields.email,
                address_line: s.fields.address_line,
                insurance_id: s.fields.insurance_id,
                probability: s.probability,
                is_match: s.is_match,
            })
        })
        .collect()
}

pub fn write_csv<W: Write, T: CsvTable>(writer: W, rows: &[T]) -> DedupeResult<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(T::HEADERS)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_csv_file<T: CsvTable>(path: &Path, rows: &[T]) -> DedupeResult<()> {
    let file = File::create(path)?;
    write_csv(BufWriter::new(file), rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cluster::ClusterConfidence;
    use crate::models::core::RecordKey;
    use crate::models::matching::{CandidatePair, FieldSimilarities};

    fn cluster(cluster_id: u64, members: &[(&str, &str)], mean: f64) -> Cluster {
        let members: Vec<RecordKey> = members.iter().map(|(s, id)| RecordKey::new(*s, *id)).collect();
        Cluster {
            cluster_id,
            members,
            confidence: ClusterConfidence {
                min_edge_score: mean,
                mean_edge_score: mean,
                edge_count: 1,
                weak_chaining: false,
                contradicting_pairs: 0,
            },
            fingerprint: format!("fp{}", cluster_id),
        }
    }

    fn to_string<T: CsvTable>(rows: &[T]) -> String {
        let mut buf = Vec::new();
        write_csv(&mut buf, rows).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_emit_orders_rows_and_marks_primary() {
        let clusters = vec![
            cluster(1, &[("urgent_care", "3")], 1.0),
            cluster(0, &[("hospital", "7"), ("clinic", "2")], 0.92),
        ];
        let rows = emit(&clusters);
        let keys: Vec<_> = rows
            .iter()
            .map(|r| (r.cluster_id, r.source.as_str(), r.is_primary))
            .collect();
        assert_eq!(
            keys,
            vec![(0, "clinic", true), (0, "hospital", false), (1, "urgent_care", true)]
        );
        assert_eq!(rows[0].cluster_confidence, 0.92);
    }

    #[test]
    fn test_report_csv_layout() {
        let rows = emit(&[cluster(0, &[("clinic", "2")], 1.0)]);
        assert_eq!(
            to_string(&rows),
            "cluster_id,source,source_record_id,cluster_confidence,is_primary\n0,clinic,2,1.0,true\n"
        );
    }

    #[test]
    fn test_empty_table_still_has_header() {
        let rows: Vec<ExceptionRow> = Vec::new();
        assert_eq!(to_string(&rows), "source,source_record_id,reason\n");
    }

    #[test]
    fn test_exception_rows_cite_field() {
        let errors = vec![SchemaMismatchError::new(
            RecordKey::new("hospital", "7"),
            "address",
            "expected a JSON object",
        )];
        let rows = emit_exceptions(&errors);
        assert_eq!(rows[0].reason, "address: expected a JSON object");
        assert!(to_string(&rows).contains("hospital,7,address: expected a JSON object"));
    }

    #[test]
    fn test_pair_rows_leave_absent_fields_empty() {
        let key = |id: &str| RecordKey::new("clinic", id);
        let records: Vec<CanonicalRecord> = ["1", "2"]
            .iter()
            .map(|id| CanonicalRecord {
                key: key(id),
                first_name: String::new(),
                last_name: String::new(),
                middle_name: None,
                date_of_birth: String::new(),
                phone: String::new(),
                email: String::new(),
                address_line: String::new(),
                city: None,
                state: None,
                zip: None,
                insurance_id: None,
            })
            .collect();
        let scores = vec![PairScore {
            pair: CandidatePair::new(0, 1).unwrap(),
            fields: FieldSimilarities {
                date_of_birth: Some(1.0),
                ..Default::default()
            },
            probability: 1.0,
            is_match: true,
        }];
        let csv = to_string(&emit_pair_scores(&records, &scores));
        let line = csv.lines().nth(1).unwrap();
        assert_eq!(line, "clinic,1,clinic,2,,,1.0,,,,,1.0,true");
    }

    #[test]
    fn test_write_csv_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clusters.csv");
        let rows = summarize_clusters(&[cluster(0, &[("clinic", "1"), ("clinic", "2")], 0.8)]);
        write_csv_file(&path, &rows).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), ClusterSummaryRow::HEADERS);
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[1], "2");
        assert_eq!(&record[7], "fp0");
    }
}
