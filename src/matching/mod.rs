pub mod comparators;
pub mod manager;
pub mod scorer;

pub use manager::{score_candidate_pairs, score_pairs};
pub use scorer::{FieldWeights, LogisticScorer, MatchScorer, WeightedScorer};
