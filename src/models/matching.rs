// src/models/matching.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unordered pair of record indices, stored with `left < right`.
///
/// Indices refer to the run's record list, which is sorted by `RecordKey`,
/// so a pair identifies the same two records on every run over the same input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CandidatePair {
    left: usize,
    right: usize,
}

impl CandidatePair {
    /// Returns `None` for a self-pair.
    pub fn new(a: usize, b: usize) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { left: a, right: b }),
            std::cmp::Ordering::Greater => Some(Self { left: b, right: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn left(&self) -> usize {
        self.left
    }

    pub fn right(&self) -> usize {
        self.right
    }
}

/// Fields the scorer compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparedField {
    FirstName,
    LastName,
    DateOfBirth,
    Phone,
    Email,
    AddressLine,
    InsuranceId,
}

impl ComparedField {
    pub const ALL: [ComparedField; 7] = [
        ComparedField::FirstName,
        ComparedField::LastName,
        ComparedField::DateOfBirth,
        ComparedField::Phone,
        ComparedField::Email,
        ComparedField::AddressLine,
        ComparedField::InsuranceId,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparedField::FirstName => "first_name",
            ComparedField::LastName => "last_name",
            ComparedField::DateOfBirth => "date_of_birth",
            ComparedField::Phone => "phone",
            ComparedField::Email => "email",
            ComparedField::AddressLine => "address_line",
            ComparedField::InsuranceId => "insurance_id",
        }
    }
}

impl ComparedField {
    /// Name and birth date fields. Contact fields are shared within
    /// households and cannot identify a patient on their own.
    pub fn is_identity(&self) -> bool {
        matches!(
            self,
            ComparedField::FirstName | ComparedField::LastName | ComparedField::DateOfBirth
        )
    }
}

impl fmt::Display for ComparedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-field similarity vector. `None` means the field was missing on at
/// least one side and takes no part in the combined score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSimilarities {
    pub first_name: Option<f64>,
    pub last_name: Option<f64>,
    pub date_of_birth: Option<f64>,
    pub phone: Option<f64>,
    pub email: Option<f64>,
    pub address_line: Option<f64>,
    pub insurance_id: Option<f64>,
}

impl FieldSimilarities {
    pub fn get(&self, field: ComparedField) -> Option<f64> {
        match field {
            ComparedField::FirstName => self.first_name,
            ComparedField::LastName => self.last_name,
            ComparedField::DateOfBirth => self.date_of_birth,
            ComparedField::Phone => self.phone,
            ComparedField::Email => self.email,
            ComparedField::AddressLine => self.address_line,
            ComparedField::InsuranceId => self.insurance_id,
        }
    }

    /// True when a name or birth date was compared.
    pub fn has_identity_field(&self) -> bool {
        self.present().any(|(field, _)| field.is_identity())
    }

    /// Fields present on both sides, in fixed field order.
    pub fn present(&self) -> impl Iterator<Item = (ComparedField, f64)> + '_ {
        ComparedField::ALL
            .iter()
            .filter_map(move |&field| self.get(field).map(|score| (field, score)))
    }
}

/// Outcome of scoring one candidate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairScore {
    pub pair: CandidatePair,
    pub fields: FieldSimilarities,
    /// Combined match probability in [0, 1].
    pub probability: f64,
    /// `probability >= threshold`; non-matches are kept for audit.
    pub is_match: bool,
}
