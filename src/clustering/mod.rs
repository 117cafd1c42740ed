pub mod patient_clustering;

pub use patient_clustering::{cluster_fingerprint, resolve_clusters};
