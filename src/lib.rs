//! watchlens turns a personal watch-history export into quarterly behavioral
//! insight: tokenized titles, disambiguated location labels, per-quarter topic
//! discovery with fluke filtering, and activity statistics.

pub mod flukes;
pub mod ingest;
pub mod lda;
pub mod locations;
pub mod models;
pub mod orchestrator;
pub mod report;
pub mod stats;
pub mod tokenize;
pub mod topics;
