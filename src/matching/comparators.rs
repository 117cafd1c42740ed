// src/matching/comparators.rs
use std::collections::HashSet;
use strsim::normalized_levenshtein;

use crate::models::core::CanonicalRecord;
use crate::models::matching::FieldSimilarities;

/// Edit-distance similarity in [0, 1]. `None` when either side is empty.
pub fn name_similarity(a: &str, b: &str) -> Option<f64> {
    if a.is_empty() || b.is_empty() {
        return None;
    }
    Some(normalized_levenshtein(a, b))
}

/// 1.0 on equality, 0.0 otherwise. `None` when either side is empty.
pub fn exact_match(a: &str, b: &str) -> Option<f64> {
    if a.is_empty() || b.is_empty() {
        return None;
    }
    Some(if a == b { 1.0 } else { 0.0 })
}

/// Jaccard overlap of whitespace tokens. `None` when either side has no tokens.
pub fn token_set_overlap(a: &str, b: &str) -> Option<f64> {
    let tokens_a: HashSet<&str> = a.split_whitespace().collect();
    let tokens_b: HashSet<&str> = b.split_whitespace().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return None;
    }
    let shared = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();
    Some(shared as f64 / union as f64)
}

fn optional_exact(a: Option<&str>, b: Option<&str>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => exact_match(a, b),
        _ => None,
    }
}

/// Per-field similarity vector for two normalized records.
pub fn compare_records(left: &CanonicalRecord, right: &CanonicalRecord) -> FieldSimilarities {
    FieldSimilarities {
        first_name: name_similarity(&left.first_name, &right.first_name),
        last_name: name_similarity(&left.last_name, &right.last_name),
        date_of_birth: exact_match(&left.date_of_birth, &right.date_of_birth),
        phone: exact_match(&left.phone, &right.phone),
        // already lowercased by the normalizer
        email: exact_match(&left.email, &right.email),
        address_line: token_set_overlap(&left.address_line, &right.address_line),
        insurance_id: optional_exact(left.insurance_id.as_deref(), right.insurance_id.as_deref()),
    }
}
