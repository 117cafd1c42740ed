pub mod blocking;
pub mod clustering;
pub mod errors;
pub mod ingestion;
pub mod matching;
pub mod models;
pub mod normalization;
pub mod output;
pub mod pipeline;
pub mod schema;
pub mod utils;
