//! Matching configuration, read from `DEDUPE_*` environment variables.

use log::info;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::blocking::BlockingStrategy;
use crate::errors::ConfigurationError;
use crate::matching::scorer::{FieldWeights, DEFAULT_MATCH_THRESHOLD};
use crate::models::matching::ComparedField;

pub const DEFAULT_WEAK_LINK_MARGIN: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub blocking_strategy: BlockingStrategy,
    pub weights: FieldWeights,
    pub match_threshold: f64,
    pub weak_link_margin: f64,
    /// Scoring batches in flight at once.
    pub parallelism: usize,
    /// JSON logistic model; the weighted scorer is used when unset.
    pub scorer_model_path: Option<PathBuf>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            blocking_strategy: BlockingStrategy::default(),
            weights: FieldWeights::default(),
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            weak_link_margin: DEFAULT_WEAK_LINK_MARGIN,
            parallelism: num_cpus::get().max(1),
            scorer_model_path: None,
        }
    }
}

fn parse_var<T: FromStr>(var: &str, value: String) -> Result<T, ConfigurationError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigurationError::InvalidEnvValue {
            var: var.to_string(),
            value,
        })
}

impl MatchingConfig {
    /// Builds the config from process environment variables.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Builds the config from any variable source. Unset variables keep
    /// their defaults; set but unparsable ones are an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("DEDUPE_MATCH_THRESHOLD") {
            config.match_threshold = parse_var("DEDUPE_MATCH_THRESHOLD", v)?;
        }
        if let Some(v) = lookup("DEDUPE_WEAK_LINK_MARGIN") {
            config.weak_link_margin = parse_var("DEDUPE_WEAK_LINK_MARGIN", v)?;
        }
        if let Some(v) = lookup("DEDUPE_PARALLELISM") {
            config.parallelism = parse_var("DEDUPE_PARALLELISM", v)?;
        }
        if let Some(v) = lookup("DEDUPE_BLOCKING_STRATEGY") {
            config.blocking_strategy = v.parse()?;
        }
        if let Some(v) = lookup("DEDUPE_SCORER_MODEL") {
            let v = v.trim();
            if !v.is_empty() {
                config.scorer_model_path = Some(PathBuf::from(v));
            }
        }
        for field in ComparedField::ALL {
            let var = format!("DEDUPE_WEIGHT_{}", field.as_str().to_uppercase());
            if let Some(v) = lookup(&var) {
                let weight = parse_var(&var, v)?;
                config.weights.set(field, weight);
            }
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.weights.validate()?;
        if !(0.0..=1.0).contains(&self.match_threshold) {
            return Err(ConfigurationError::ThresholdOutOfRange(self.match_threshold));
        }
        if !(0.0..=1.0).contains(&self.weak_link_margin) {
            return Err(ConfigurationError::MarginOutOfRange(self.weak_link_margin));
        }
        if self.parallelism == 0 {
            return Err(ConfigurationError::ZeroParallelism);
        }
        Ok(())
    }

    pub fn log_config(&self) {
        info!("⚙️  Matching configuration:");
        info!("   Blocking strategy: {}", self.blocking_strategy);
        info!(
            "   Match threshold: {:.3} (weak link margin {:.3})",
            self.match_threshold, self.weak_link_margin
        );
        info!("   Parallelism: {} scoring batches", self.parallelism);
        match &self.scorer_model_path {
            Some(path) => info!("   Scorer: logistic model from {}", path.display()),
            None => info!("   Scorer: weighted, weights {:?}", self.weights),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| map.get(var).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = MatchingConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.match_threshold, 0.7);
        assert_eq!(config.weak_link_margin, 0.05);
        assert_eq!(config.blocking_strategy, BlockingStrategy::SoundexBirthYear);
        assert_eq!(config.weights, FieldWeights::default());
        assert!(config.parallelism >= 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides_from_variables() {
        let config = MatchingConfig::from_lookup(lookup(&[
            ("DEDUPE_MATCH_THRESHOLD", "0.85"),
            ("DEDUPE_PARALLELISM", " 3 "),
            ("DEDUPE_BLOCKING_STRATEGY", "extended"),
            ("DEDUPE_WEIGHT_INSURANCE_ID", "0"),
            ("DEDUPE_SCORER_MODEL", "model.json"),
        ]))
        .unwrap();
        assert_eq!(config.match_threshold, 0.85);
        assert_eq!(config.parallelism, 3);
        assert_eq!(config.blocking_strategy, BlockingStrategy::Extended);
        assert_eq!(config.weights.insurance_id, 0.0);
        assert_eq!(config.scorer_model_path, Some(PathBuf::from("model.json")));
    }

    #[test]
    fn test_unparsable_value_is_a_configuration_error() {
        let err = MatchingConfig::from_lookup(lookup(&[("DEDUPE_WEIGHT_PHONE", "heavy")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::InvalidEnvValue {
                var: "DEDUPE_WEIGHT_PHONE".to_string(),
                value: "heavy".to_string()
            }
        );
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        let mut config = MatchingConfig::default();
        config.match_threshold = 1.2;
        assert_eq!(
            config.validate(),
            Err(ConfigurationError::ThresholdOutOfRange(1.2))
        );

        let mut config = MatchingConfig::default();
        config.parallelism = 0;
        assert_eq!(config.validate(), Err(ConfigurationError::ZeroParallelism));

        let mut config = MatchingConfig::default();
        config.weak_link_margin = -0.1;
        assert_eq!(
            config.validate(),
            Err(ConfigurationError::MarginOutOfRange(-0.1))
        );

        let mut config = MatchingConfig::default();
        config.weights.date_of_birth = -4.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidWeight { field: "date_of_birth", .. })
        ));
    }

    #[test]
    fn test_config_deserializes_with_partial_fields() {
        let config: MatchingConfig =
            serde_json::from_str(r#"{"match_threshold": 0.8, "weights": {"phone": 2.0}}"#).unwrap();
        assert_eq!(config.match_threshold, 0.8);
        assert_eq!(config.weights.phone, 2.0);
        assert_eq!(config.weights.first_name, 3.0);
    }
}
