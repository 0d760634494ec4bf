//! This crate provides the Election Explorer, a read-only REST API over Indian general (Lok Sabha)
//! election results.
//!
//! Results are loaded once at startup from a directory of CSV files, one row per candidate per
//! constituency per election. Derived fields such as each contest's winner and every candidate's
//! vote share are computed during loading, and the resulting snapshot is shared immutably between
//! request handlers. Aggregate queries (party performance, state trends, turnout, winning margins)
//! are computed from the snapshot on each request.
//!
//! The Election Explorer is built on top of a number of open source components.
//!
//! * [Tokio](tokio), the most popular asynchronous Rust runtime.
//! * [Axum](axum) web framework, built by the Tokio team, on top of the [hyper] HTTP library.
//! * [Serde](serde) performs serialisation of JSON response data.
//! * [csv] parses the source data files, which are read in parallel using [rayon].

pub mod app;
pub mod app_state;
pub mod cli;
pub mod dataset;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod models;
pub mod queries;
pub mod server;
pub mod stats;
#[cfg(test)]
pub mod test_utils;
pub mod tracing;
pub mod validated_query;
