// src/blocking/mod.rs
//! Candidate blocker: overlapping blocks of records likely to match, so that
//! only intra-block pairs are scored instead of the full cross product.

pub mod soundex;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::errors::ConfigurationError;
use crate::models::core::CanonicalRecord;
use crate::models::matching::CandidatePair;
pub use soundex::soundex;

/// Blocks above this size are reported; they dominate pair counts.
const LARGE_BLOCK_WARNING_SIZE: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockingStrategy {
    /// `(soundex(last_name), birth_year)`.
    #[default]
    SoundexBirthYear,
    /// The default key plus `(date_of_birth, first initial)`, phone and email keys.
    Extended,
    /// A single block holding every record.
    Exhaustive,
}

impl BlockingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockingStrategy::SoundexBirthYear => "soundex_birth_year",
            BlockingStrategy::Extended => "extended",
            BlockingStrategy::Exhaustive => "exhaustive",
        }
    }
}

impl fmt::Display for BlockingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockingStrategy {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "soundex_birth_year" | "default" => Ok(BlockingStrategy::SoundexBirthYear),
            "extended" => Ok(BlockingStrategy::Extended),
            "exhaustive" => Ok(BlockingStrategy::Exhaustive),
            other => Err(ConfigurationError::UnknownBlockingStrategy(other.to_string())),
        }
    }
}

/// Grouping key. A record may carry several.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BlockKey {
    SoundexBirthYear { soundex: String, birth_year: i32 },
    BirthDateInitial { date_of_birth: String, initial: char },
    Phone(String),
    Email(String),
    /// Records lacking last name or birth date, one block per source.
    Fallback { source: String },
    All,
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKey::SoundexBirthYear {
                soundex,
                birth_year,
            } => write!(f, "soundex:{}:{}", soundex, birth_year),
            BlockKey::BirthDateInitial {
                date_of_birth,
                initial,
            } => write!(f, "dob:{}:{}", date_of_birth, initial),
            BlockKey::Phone(phone) => write!(f, "phone:{}", phone),
            BlockKey::Email(email) => write!(f, "email:{}", email),
            BlockKey::Fallback { source } => write!(f, "fallback:{}", source),
            BlockKey::All => f.write_str("all"),
        }
    }
}

/// Block key to the indices of its member records.
pub type Blocks = BTreeMap<BlockKey, BTreeSet<usize>>;

fn default_key(record: &CanonicalRecord) -> BlockKey {
    let code = soundex(&record.last_name);
    match record.birth_year() {
        Some(birth_year) if !code.is_empty() && record.has_blocking_fields() => {
            BlockKey::SoundexBirthYear {
                soundex: code,
                birth_year,
            }
        }
        _ => BlockKey::Fallback {
            source: record.key.source.clone(),
        },
    }
}

/// Every block key `record` belongs to under `strategy`.
pub fn block_keys(record: &CanonicalRecord, strategy: BlockingStrategy) -> Vec<BlockKey> {
    match strategy {
        BlockingStrategy::Exhaustive => vec![BlockKey::All],
        BlockingStrategy::SoundexBirthYear => vec![default_key(record)],
        BlockingStrategy::Extended => {
            let mut keys = vec![default_key(record)];
            if let Some(initial) = record.first_name.chars().next() {
                if !record.date_of_birth.is_empty() {
                    keys.push(BlockKey::BirthDateInitial {
                        date_of_birth: record.date_of_birth.clone(),
                        initial,
                    });
                }
            }
            if !record.phone.is_empty() {
                keys.push(BlockKey::Phone(record.phone.clone()));
            }
            if !record.email.is_empty() {
                keys.push(BlockKey::Email(record.email.clone()));
            }
            keys
        }
    }
}

/// `block(records) → BlockKey → set of record ids`, ids being indices into `records`.
pub fn block(records: &[CanonicalRecord], strategy: BlockingStrategy) -> Blocks {
    let mut blocks = Blocks::new();
    for (idx, record) in records.iter().enumerate() {
        for key in block_keys(record, strategy) {
            blocks.entry(key).or_default().insert(idx);
        }
    }

    for (key, members) in &blocks {
        if members.len() > LARGE_BLOCK_WARNING_SIZE {
            warn!(
                "Block {} holds {} records ({} pairs to score)",
                key,
                members.len(),
                members.len() * (members.len() - 1) / 2
            );
        }
    }
    debug!(
        "Blocking ({}) placed {} records into {} blocks",
        strategy,
        records.len(),
        blocks.len()
    );
    blocks
}

/// Union of all intra-block pairs, deduplicated and sorted. Never a self-pair.
pub fn candidate_pairs(blocks: &Blocks) -> Vec<CandidatePair> {
    let mut pairs = BTreeSet::new();
    for members in blocks.values() {
        let members: Vec<usize> = members.iter().copied().collect();
        for (i, &a) in members.iter().enumerate() {
            for &b in &members[i + 1..] {
                if let Some(pair) = CandidatePair::new(a, b) {
                    pairs.insert(pair);
                }
            }
        }
    }
    pairs.into_iter().collect()
}

/// Shape of a blocking result, for logging and run statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockingSummary {
    pub total_blocks: usize,
    pub largest_block: usize,
    pub fallback_records: usize,
}

pub fn summarize_blocks(blocks: &Blocks) -> BlockingSummary {
    BlockingSummary {
        total_blocks: blocks.len(),
        largest_block: blocks.values().map(BTreeSet::len).max().unwrap_or(0),
        fallback_records: blocks
            .iter()
            .filter(|(key, _)| matches!(key, BlockKey::Fallback { .. }))
            .map(|(_, members)| members.len())
            .sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::core::RecordKey;

    fn record(source: &str, id: &str, first: &str, last: &str, dob: &str) -> CanonicalRecord {
        CanonicalRecord {
            key: RecordKey::new(source, id),
            first_name: first.to_string(),
            last_name: last.to_string(),
            middle_name: None,
            date_of_birth: dob.to_string(),
            phone: String::new(),
            email: String::new(),
            address_line: String::new(),
            city: None,
            state: None,
            zip: None,
            insurance_id: None,
        }
    }

    #[test]
    fn test_default_key_uses_soundex_and_birth_year() {
        let r = record("clinic", "1", "john", "smith", "1980-01-15");
        assert_eq!(
            block_keys(&r, BlockingStrategy::SoundexBirthYear),
            vec![BlockKey::SoundexBirthYear {
                soundex: "S530".to_string(),
                birth_year: 1980
            }]
        );
    }

    #[test]
    fn test_sparse_records_fall_back_to_source_block() {
        let no_dob = record("clinic", "1", "john", "smith", "");
        let no_last = record("clinic", "2", "john", "", "1980-01-15");
        let blocks = block(&[no_dob, no_last], BlockingStrategy::SoundexBirthYear);
        let fallback = BlockKey::Fallback {
            source: "clinic".to_string(),
        };
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[&fallback].len(), 2);
        assert_eq!(candidate_pairs(&blocks).len(), 1);
        assert_eq!(summarize_blocks(&blocks).fallback_records, 2);
    }

    #[test]
    fn test_spelling_variants_share_a_block() {
        let records = vec![
            record("clinic", "1", "john", "smith", "1980-01-15"),
            record("hospital", "1", "john", "smyth", "1980-01-15"),
            record("hospital", "2", "john", "smith", "1981-01-15"),
        ];
        let pairs = candidate_pairs(&block(&records, BlockingStrategy::SoundexBirthYear));
        assert_eq!(pairs, vec![CandidatePair::new(0, 1).unwrap()]);
    }

    #[test]
    fn test_pairs_are_deduplicated_across_blocks() {
        let mut a = record("clinic", "1", "john", "smith", "1980-01-15");
        let mut b = record("hospital", "1", "john", "smith", "1980-01-15");
        a.phone = "5551234567".to_string();
        b.phone = "5551234567".to_string();
        let blocks = block(&[a, b], BlockingStrategy::Extended);
        // soundex, dob+initial and phone blocks all co-locate the same two records
        assert_eq!(blocks.len(), 3);
        assert_eq!(candidate_pairs(&blocks), vec![CandidatePair::new(0, 1).unwrap()]);
    }

    #[test]
    fn test_extended_strategy_recovers_last_name_change() {
        let records = vec![
            record("clinic", "1", "mary", "jones", "1985-06-01"),
            record("hospital", "1", "mary", "carter", "1985-06-01"),
        ];
        assert!(candidate_pairs(&block(&records, BlockingStrategy::SoundexBirthYear)).is_empty());
        assert_eq!(
            candidate_pairs(&block(&records, BlockingStrategy::Extended)).len(),
            1
        );
    }

    #[test]
    fn test_exhaustive_strategy_pairs_everything_once() {
        let records: Vec<_> = (0..5)
            .map(|i| record("clinic", &i.to_string(), "a", "b", ""))
            .collect();
        let pairs = candidate_pairs(&block(&records, BlockingStrategy::Exhaustive));
        assert_eq!(pairs.len(), 10);
        assert!(pairs.iter().all(|p| p.left() < p.right()));
    }

    #[test]
    fn test_blocking_strategy_from_str() {
        assert_eq!(
            "Extended".parse::<BlockingStrategy>().unwrap(),
            BlockingStrategy::Extended
        );
        assert!(matches!(
            "phonetic".parse::<BlockingStrategy>(),
            Err(ConfigurationError::UnknownBlockingStrategy(_))
        ));
    }
}
