// src/matching/scorer.rs
use log::warn;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigurationError;
use crate::matching::comparators::compare_records;
use crate::models::core::CanonicalRecord;
use crate::models::matching::{CandidatePair, ComparedField, FieldSimilarities, PairScore};

pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.7;

/// Per-field weights for the weighted scorer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldWeights {
    pub first_name: f64,
    pub last_name: f64,
    pub date_of_birth: f64,
    pub phone: f64,
    pub email: f64,
    pub address_line: f64,
    pub insurance_id: f64,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            first_name: 3.0,
            last_name: 2.5,
            date_of_birth: 4.0,
            phone: 1.0,
            email: 1.0,
            address_line: 1.0,
            insurance_id: 1.5,
        }
    }
}

impl FieldWeights {
    pub fn get(&self, field: ComparedField) -> f64 {
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

    pub fn set(&mut self, field: ComparedField, weight: f64) {
        let slot = match field {
            ComparedField::FirstName => &mut self.first_name,
            ComparedField::LastName => &mut self.last_name,
            ComparedField::DateOfBirth => &mut self.date_of_birth,
            ComparedField::Phone => &mut self.phone,
            ComparedField::Email => &mut self.email,
            ComparedField::AddressLine => &mut self.address_line,
            ComparedField::InsuranceId => &mut self.insurance_id,
        };
        *slot = weight;
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for field in ComparedField::ALL {
            let weight = self.get(field);
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigurationError::InvalidWeight {
                    field: field.as_str(),
                    weight,
                });
            }
        }
        if ComparedField::ALL.iter().all(|&f| self.get(f) == 0.0) {
            return Err(ConfigurationError::ZeroTotalWeight);
        }
        Ok(())
    }
}

/// Turns a similarity vector into a match probability.
///
/// Implementations must be pure functions of the vector: scoring is symmetric
/// because `compare_records` is, and batches run on worker threads.
pub trait MatchScorer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Combined probability in [0, 1].
    fn combine(&self, fields: &FieldSimilarities) -> f64;

    /// Scores 0.0 when no name or birth date is shared, whatever the
    /// contact fields say.
    fn score(
        &self,
        pair: CandidatePair,
        left: &CanonicalRecord,
        right: &CanonicalRecord,
        threshold: f64,
    ) -> PairScore {
        let fields = compare_records(left, right);
        let probability = if fields.has_identity_field() {
            self.combine(&fields).clamp(0.0, 1.0)
        } else {
            0.0
        };
        PairScore {
            pair,
            fields,
            probability,
            is_match: probability >= threshold,
        }
    }
}

/// Weighted mean of the similarities present on both records.
#[derive(Debug, Clone, Default)]
pub struct WeightedScorer {
    weights: FieldWeights,
}

impl WeightedScorer {
    pub fn new(weights: FieldWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &FieldWeights {
        &self.weights
    }
}

impl MatchScorer for WeightedScorer {
    fn name(&self) -> &'static str {
        "weighted"
    }

    fn combine(&self, fields: &FieldSimilarities) -> f64 {
        let (weighted_sum, total_weight) = fields
            .present()
            .fold((0.0, 0.0), |(sum, total), (field, score)| {
                let w = self.weights.get(field);
                (sum + w * score, total + w)
            });
        if total_weight > 0.0 {
            weighted_sum / total_weight
        } else {
            0.0
        }
    }
}

fn sigmoid(logit: f64) -> f64 {
    1.0 / (1.0 + (-logit).exp())
}

/// Logistic model over the similarity vector, trained by online gradient descent.
/// Absent fields contribute a zero feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticScorer {
    coefficients: [f64; 7],
    intercept: f64,
    learning_rate: f64,
    trials: usize,
}

impl Default for LogisticScorer {
    fn default() -> Self {
        Self::new(0.01)
    }
}

impl LogisticScorer {
    /// Zero-initialized model; predicts 0.5 until trained.
    pub fn new(learning_rate: f64) -> Self {
        Self {
            coefficients: [0.0; 7],
            intercept: 0.0,
            learning_rate,
            trials: 0,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        let model: Self =
            serde_json::from_str(json).map_err(|e| ConfigurationError::InvalidModel(e.to_string()))?;
        if !model.coefficients.iter().all(|c| c.is_finite()) || !model.intercept.is_finite() {
            return Err(ConfigurationError::InvalidModel(
                "coefficients must be finite".to_string(),
            ));
        }
        if !model.learning_rate.is_finite() || model.learning_rate <= 0.0 {
            return Err(ConfigurationError::InvalidModel(format!(
                "learning rate must be positive, got {}",
                model.learning_rate
            )));
        }
        Ok(model)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn trials(&self) -> usize {
        self.trials
    }

    fn features(fields: &FieldSimilarities) -> [f64; 7] {
        ComparedField::ALL.map(|field| fields.get(field).unwrap_or(0.0))
    }

    pub fn predict(&self, fields: &FieldSimilarities) -> f64 {
        let logit: f64 = self
            .coefficients
            .iter()
            .zip(Self::features(fields))
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept;
        sigmoid(logit)
    }

    /// One gradient step towards `label` (true = same patient).
    pub fn update(&mut self, fields: &FieldSimilarities, label: bool) {
        let target = if label { 1.0 } else { 0.0 };
        let error = target - self.predict(fields);
        for (w, x) in self.coefficients.iter_mut().zip(Self::features(fields)) {
            *w += self.learning_rate * error * x;
        }
        self.intercept += self.learning_rate * error;
        self.trials += 1;
    }

    /// Repeated passes of `update` over labelled examples, in order.
    pub fn fit(&mut self, examples: &[(FieldSimilarities, bool)], epochs: usize) {
        if examples.is_empty() {
            warn!("Logistic scorer fit called with no labelled pairs");
            return;
        }
        for _ in 0..epochs {
            for (fields, label) in examples {
                self.update(fields, *label);
            }
        }
    }
}

impl MatchScorer for LogisticScorer {
    fn name(&self) -> &'static str {
        "logistic"
    }

    fn combine(&self, fields: &FieldSimilarities) -> f64 {
        self.predict(fields)
    }
}
