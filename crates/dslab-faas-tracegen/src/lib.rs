//! A library for synthesizing per-function FaaS workload traces from aggregated Azure Functions statistics.
//!
//! The generated traces follow the OpenDC serverless format: one CSV file per function with one row per minute.
//! The pipeline fits lognormal distributions to execution time and memory summaries, resamples invocation counts
//! from their empirical distribution and stitches daily segments into continuous multi-day traces.
//!
//! See [`generator::generate_shard`] for the per-shard entry point and [`parallel::generate_shards`] for running
//! many shards on a worker pool.

pub mod apps;
pub mod azure;
pub mod config;
pub mod ecdf;
pub mod error;
pub mod estimator;
pub mod generator;
pub mod parallel;
pub mod sampler;
pub mod stats;
pub mod stitcher;
pub mod trace;
