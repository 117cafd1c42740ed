pub mod cluster;
pub mod core;
pub mod matching;
pub mod stats_models;
