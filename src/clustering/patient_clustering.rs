// src/clustering/patient_clustering.rs
use log::debug;
use petgraph::unionfind::UnionFind;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::models::cluster::{Cluster, ClusterConfidence};
use crate::models::core::{CanonicalRecord, RecordKey};
use crate::models::matching::PairScore;

#[derive(Debug, Default)]
struct EdgeStats {
    min: Option<f64>,
    sum: f64,
    count: usize,
    contradicting: usize,
}

impl EdgeStats {
    fn add_edge(&mut self, score: f64) {
        self.min = Some(self.min.map_or(score, |m| m.min(score)));
        self.sum += score;
        self.count += 1;
    }

    fn confidence(&self, size: usize, match_threshold: f64, weak_link_margin: f64) -> ClusterConfidence {
        let Some(min_edge_score) = self.min else {
            return ClusterConfidence::singleton();
        };
        ClusterConfidence {
            min_edge_score,
            mean_edge_score: self.sum / self.count as f64,
            edge_count: self.count,
            weak_chaining: size > 2 && min_edge_score < match_threshold + weak_link_margin,
            contradicting_pairs: self.contradicting,
        }
    }
}

/// SHA-256 over the sorted member keys.
pub fn cluster_fingerprint(members: &[RecordKey]) -> String {
    let mut hasher = Sha256::new();
    for key in members {
        hasher.update(key.source.as_bytes());
        hasher.update([0x1f_u8]);
        hasher.update(key.source_record_id.as_bytes());
        hasher.update([0x1e_u8]);
    }
    hex::encode(hasher.finalize())
}

/// Connected components over matching pairs. Every record lands in exactly
/// one cluster; records without a matching pair become singletons.
///
/// Ids are assigned from 0 in ascending order of each cluster's smallest
/// member key.
pub fn resolve_clusters(
    records: &[CanonicalRecord],
    scores: &[PairScore],
    match_threshold: f64,
    weak_link_margin: f64,
) -> Vec<Cluster> {
    let n = records.len();
    let in_range = |s: &&PairScore| s.pair.right() < n;

    let mut uf = UnionFind::<usize>::new(n);
    for score in scores.iter().filter(in_range).filter(|s| s.is_match) {
        uf.union(score.pair.left(), score.pair.right());
    }
    let labels = uf.into_labeling();

    let mut components: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (idx, &label) in labels.iter().enumerate() {
        components.entry(label).or_default().push(idx);
    }

    let mut edge_stats: BTreeMap<usize, EdgeStats> = BTreeMap::new();
    for score in scores.iter().filter(in_range) {
        let label = labels[score.pair.left()];
        if label != labels[score.pair.right()] {
            continue;
        }
        let stats = edge_stats.entry(label).or_default();
        if score.is_match {
            stats.add_edge(score.probability);
        } else {
            stats.contradicting += 1;
        }
    }

    let no_edges = EdgeStats::default();
    let mut clusters: Vec<Cluster> = components
        .into_iter()
        .map(|(label, indices)| {
            let mut members: Vec<RecordKey> =
                indices.iter().map(|&i| records[i].key.clone()).collect();
            members.sort();
            let confidence = edge_stats.get(&label).unwrap_or(&no_edges).confidence(
                members.len(),
                match_threshold,
                weak_link_margin,
            );
            Cluster {
                cluster_id: 0,
                fingerprint: cluster_fingerprint(&members),
                members,
                confidence,
            }
        })
        .collect();

    clusters.sort_by(|a, b| a.members.first().cmp(&b.members.first()));
    for (cluster_id, cluster) in clusters.iter_mut().enumerate() {
        cluster.cluster_id = cluster_id as u64;
    }

    debug!(
        "Resolved {} records into {} clusters ({} with 2+ members)",
        n,
        clusters.len(),
        clusters.iter().filter(|c| !c.is_singleton()).count()
    );
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::matching::{CandidatePair, FieldSimilarities};

    fn record(source: &str, id: &str) -> CanonicalRecord {
        CanonicalRecord {
            key: RecordKey::new(source, id),
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
        }
    }

    fn score(a: usize, b: usize, probability: f64) -> PairScore {
        PairScore {
            pair: CandidatePair::new(a, b).unwrap(),
            fields: FieldSimilarities::default(),
            probability,
            is_match: probability >= 0.7,
        }
    }

    #[test]
    fn test_chain_of_strong_edges_forms_one_cluster() {
        let records = vec![record("clinic", "a"), record("clinic", "b"), record("clinic", "c")];
        let scores = vec![score(0, 1, 0.9), score(1, 2, 0.9), score(0, 2, 0.1)];
        let clusters = resolve_clusters(&records, &scores, 0.7, 0.05);

        assert_eq!(clusters.len(), 1);
        let cluster = &clusters[0];
        assert_eq!(cluster.size(), 3);
        assert!((cluster.confidence.min_edge_score - 0.9).abs() < 1e-9);
        assert!((cluster.confidence.mean_edge_score - 0.9).abs() < 1e-9);
        assert!(!cluster.confidence.weak_chaining);
        assert_eq!(cluster.confidence.edge_count, 2);
        assert_eq!(cluster.confidence.contradicting_pairs, 1);
    }

    #[test]
    fn test_unmatched_records_become_singletons() {
        let records = vec![record("clinic", "a"), record("hospital", "b")];
        let clusters = resolve_clusters(&records, &[score(0, 1, 0.3)], 0.7, 0.05);
        assert_eq!(clusters.len(), 2);
        assert!(clusters.iter().all(Cluster::is_singleton));
        assert_eq!(clusters[0].confidence, ClusterConfidence::singleton());
        assert_eq!(clusters[0].members[0], RecordKey::new("clinic", "a"));
        assert_eq!(clusters[1].cluster_id, 1);
    }

    #[test]
    fn test_weak_link_flags_chained_cluster() {
        let records = vec![record("clinic", "a"), record("clinic", "b"), record("clinic", "c")];
        let scores = vec![score(0, 1, 0.95), score(1, 2, 0.72)];
        let clusters = resolve_clusters(&records, &scores, 0.7, 0.05);
        assert!(clusters[0].confidence.weak_chaining);

        // a weak edge between only two records is not chaining
        let clusters = resolve_clusters(&records[..2], &[score(0, 1, 0.72)], 0.7, 0.05);
        assert!(!clusters[0].confidence.weak_chaining);
    }

    #[test]
    fn test_every_record_in_exactly_one_cluster() {
        let records: Vec<_> = (0..6).map(|i| record("clinic", &i.to_string())).collect();
        let scores = vec![score(0, 3, 0.8), score(4, 5, 0.99), score(3, 4, 0.2)];
        let clusters = resolve_clusters(&records, &scores, 0.7, 0.05);

        let mut seen: Vec<RecordKey> = clusters.iter().flat_map(|c| c.members.clone()).collect();
        seen.sort();
        let mut expected: Vec<RecordKey> = records.iter().map(|r| r.key.clone()).collect();
        expected.sort();
        assert_eq!(seen, expected);
        assert_eq!(clusters.len(), 4);
    }

    #[test]
    fn test_ids_and_fingerprints_are_stable() {
        let records = vec![record("hospital", "1"), record("clinic", "9"), record("clinic", "2")];
        let scores = vec![score(0, 2, 0.9)];
        let first = resolve_clusters(&records, &scores, 0.7, 0.05);
        let second = resolve_clusters(&records, &scores, 0.7, 0.05);
        assert_eq!(first, second);

        // smallest member key decides the order
        assert_eq!(first[0].members, vec![RecordKey::new("clinic", "2"), RecordKey::new("hospital", "1")]);
        assert_eq!(first[1].members, vec![RecordKey::new("clinic", "9")]);
        assert_eq!(first[0].fingerprint.len(), 64);
        assert_ne!(first[0].fingerprint, first[1].fingerprint);
    }
}
