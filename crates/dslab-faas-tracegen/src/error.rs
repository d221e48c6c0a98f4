//! Error types.
use thiserror::Error;

/// Reasons why lognormal parameters could not be recovered from summary statistics.
///
/// A fit failure is never fatal: the caller falls back to constant values for the affected day.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("summary statistic {name} = {value} is not positive")]
    NonPositive { name: &'static str, value: f64 },

    #[error("degenerate range: min {min} >= max {max}")]
    DegenerateRange { min: f64, max: f64 },

    #[error("mean {mean} lies outside [{min}, {max}]")]
    MeanOutOfRange { min: f64, max: f64, mean: f64 },

    #[error("need at least 2 samples, got {0}")]
    TooFewSamples(f64),

    #[error("estimate produced non-finite parameters (mu = {mu}, sigma = {sigma})")]
    NonFinite { mu: f64, sigma: f64 },
}

#[derive(Error, Debug)]
pub enum TraceGenError {
    #[error("function {function}: column {column} has {actual} values, grid has {expected}")]
    SchemaMismatch {
        function: String,
        column: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("application {app} has no function count in the application table")]
    MissingLookup { app: String },

    #[error("worker for shard {shard} terminated abnormally")]
    WorkerFailure { shard: usize },

    #[error("malformed row at line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, TraceGenError>;
