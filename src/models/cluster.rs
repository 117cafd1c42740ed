// src/models/cluster.rs
use serde::{Deserialize, Serialize};

use crate::models::core::RecordKey;

/// Confidence figures for one cluster, computed over its realized edges
/// (pairs that scored at or above the match threshold).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfidence {
    pub min_edge_score: f64,
    pub mean_edge_score: f64,
    pub edge_count: usize,
    /// Set when a cluster of three or more records hangs on an edge that
    /// barely clears the threshold.
    pub weak_chaining: bool,
    /// Scored pairs below threshold whose records still share this cluster.
    pub contradicting_pairs: usize,
}

impl ClusterConfidence {
    pub fn singleton() -> Self {
        Self {
            min_edge_score: 1.0,
            mean_edge_score: 1.0,
            edge_count: 0,
            weak_chaining: false,
            contradicting_pairs: 0,
        }
    }
}

/// Records resolved to the same patient in one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub cluster_id: u64,
    /// Sorted by key; the first member is the primary record.
    pub members: Vec<RecordKey>,
    pub confidence: ClusterConfidence,
    /// SHA-256 over the sorted member keys, hex encoded.
    pub fingerprint: String,
}

impl Cluster {
    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }

    pub fn primary(&self) -> Option<&RecordKey> {
        self.members.first()
    }
}
