//! Function-level rows of the merged Azure Functions 2019 tables (invocations, durations and memory of one day).
//! Trace description: https://github.com/Azure/AzurePublicDataset/blob/master/AzureFunctionsDataset2019.md
use std::convert::Infallible;
use std::path::Path;
use std::str::FromStr;

use csv::{ReaderBuilder, StringRecord};

use crate::error::{Result, TraceGenError};
use crate::estimator::SummaryStats;
use crate::trace::MINUTES_PER_DAY;

pub const OWNER_COLUMN: usize = 0;
pub const APP_COLUMN: usize = 1;
pub const FUNCTION_COLUMN: usize = 2;
pub const TRIGGER_COLUMN: usize = 3;
pub const INVOCATIONS_OFFSET: usize = 4;
pub const DURATION_OFFSET: usize = INVOCATIONS_OFFSET + MINUTES_PER_DAY;
pub const DURATION_PERCENTILES: usize = 7;
pub const MEMORY_OFFSET: usize = DURATION_OFFSET + 4 + DURATION_PERCENTILES;
pub const MEMORY_PERCENTILES: usize = 8;
/// Number of columns covered by the fixed layout.
pub const RECORD_WIDTH: usize = MEMORY_OFFSET + 2 + MEMORY_PERCENTILES;

/// Function trigger kind as reported by Azure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Trigger {
    Http,
    Timer,
    Event,
    Queue,
    Storage,
    Orchestration,
    Others(String),
}

impl Trigger {
    /// Timer-triggered invocations are scheduled, so their per-minute counts are never resampled.
    pub fn is_timer(&self) -> bool {
        *self == Trigger::Timer
    }
}

impl From<&str> for Trigger {
    fn from(s: &str) -> Self {
        match s {
            "http" => Trigger::Http,
            "timer" => Trigger::Timer,
            "event" => Trigger::Event,
            "queue" => Trigger::Queue,
            "storage" => Trigger::Storage,
            "orchestration" => Trigger::Orchestration,
            other => Trigger::Others(other.to_string()),
        }
    }
}

impl FromStr for Trigger {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

/// Execution time summary of one function for one day, in milliseconds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DurationStats {
    pub average: f64,
    pub count: f64,
    pub minimum: f64,
    pub maximum: f64,
    /// Percentiles 0, 1, 25, 50, 75, 99, 100 of per-minute average durations.
    pub percentiles: [f64; DURATION_PERCENTILES],
}

impl DurationStats {
    /// 50th percentile of per-minute average durations.
    pub fn median(&self) -> f64 {
        self.percentiles[3]
    }

    pub fn summary(&self) -> SummaryStats {
        SummaryStats::new(self.minimum, self.maximum, self.average, self.count)
    }
}

/// Allocated memory summary of the function's application for one day, in MB.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryStats {
    pub sample_count: f64,
    pub average: f64,
    /// Percentiles 1, 5, 25, 50, 75, 95, 99, 100.
    pub percentiles: [f64; MEMORY_PERCENTILES],
}

impl MemoryStats {
    pub fn summary(&self) -> SummaryStats {
        SummaryStats::new(
            self.percentiles[0],
            self.percentiles[MEMORY_PERCENTILES - 1],
            self.average,
            self.sample_count,
        )
    }
}

/// One (application, function) pair observed during one day.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionRecord {
    pub owner: String,
    pub app: String,
    pub function: String,
    pub trigger: Trigger,
    /// Exactly 1440 per-minute invocation counts.
    pub invocations: Vec<u64>,
    pub duration: DurationStats,
    pub memory: MemoryStats,
    /// 1-based observation day.
    pub day: usize,
    /// Identifier of the produced trace file.
    pub id: String,
}

impl FunctionRecord {
    pub fn invocation_samples(&self) -> Vec<f64> {
        self.invocations.iter().map(|x| *x as f64).collect()
    }
}

/// Positions of the optional columns appended after the fixed layout.
#[derive(Clone, Copy, Debug, Default)]
pub struct TrailingColumns {
    pub day: Option<usize>,
    pub id: Option<usize>,
}

impl TrailingColumns {
    pub fn from_headers(headers: &StringRecord) -> Self {
        let find = |name: &str| headers.iter().skip(RECORD_WIDTH).position(|h| h == name).map(|i| i + RECORD_WIDTH);
        Self {
            day: find("Day"),
            id: find("id"),
        }
    }
}

fn malformed(record: &StringRecord, reason: String) -> TraceGenError {
    TraceGenError::MalformedRow {
        line: record.position().map_or(0, |p| p.line()),
        reason,
    }
}

/// Parses a statistic; empty fields (missing memory data after a left join) become NaN.
fn parse_stat(record: &StringRecord, idx: usize) -> Result<f64> {
    let field = record[idx].trim();
    if field.is_empty() {
        return Ok(f64::NAN);
    }
    f64::from_str(field).map_err(|_| malformed(record, format!("column {}: bad number {:?}", idx, field)))
}

fn parse_count(record: &StringRecord, idx: usize) -> Result<u64> {
    let value = parse_stat(record, idx)?;
    if !(value >= 0.) || value.fract() != 0. {
        return Err(malformed(
            record,
            format!("column {}: {} is not a non-negative integer", idx, &record[idx]),
        ));
    }
    Ok(value as u64)
}

impl FunctionRecord {
    pub fn from_record(record: &StringRecord, trailing: TrailingColumns) -> Result<Self> {
        if record.len() < RECORD_WIDTH {
            return Err(malformed(
                record,
                format!("expected at least {} columns, got {}", RECORD_WIDTH, record.len()),
            ));
        }
        let mut invocations = Vec::with_capacity(MINUTES_PER_DAY);
        for i in 0..MINUTES_PER_DAY {
            invocations.push(parse_count(record, INVOCATIONS_OFFSET + i)?);
        }
        let mut duration_percentiles = [0.; DURATION_PERCENTILES];
        for (i, p) in duration_percentiles.iter_mut().enumerate() {
            *p = parse_stat(record, DURATION_OFFSET + 4 + i)?;
        }
        let mut memory_percentiles = [0.; MEMORY_PERCENTILES];
        for (i, p) in memory_percentiles.iter_mut().enumerate() {
            *p = parse_stat(record, MEMORY_OFFSET + 2 + i)?;
        }
        let day = match trailing.day {
            Some(idx) => {
                let day = parse_count(record, idx)? as usize;
                if day == 0 {
                    return Err(malformed(record, "days are numbered from 1".to_string()));
                }
                day
            }
            None => 1,
        };
        let function = record[FUNCTION_COLUMN].to_string();
        let id = match trailing.id {
            Some(idx) => record[idx].to_string(),
            None => function.clone(),
        };
        Ok(Self {
            owner: record[OWNER_COLUMN].to_string(),
            app: record[APP_COLUMN].to_string(),
            function,
            trigger: Trigger::from(&record[TRIGGER_COLUMN]),
            invocations,
            duration: DurationStats {
                average: parse_stat(record, DURATION_OFFSET)?,
                count: parse_stat(record, DURATION_OFFSET + 1)?,
                minimum: parse_stat(record, DURATION_OFFSET + 2)?,
                maximum: parse_stat(record, DURATION_OFFSET + 3)?,
                percentiles: duration_percentiles,
            },
            memory: MemoryStats {
                sample_count: parse_stat(record, MEMORY_OFFSET)?,
                average: parse_stat(record, MEMORY_OFFSET + 1)?,
                percentiles: memory_percentiles,
            },
            day,
            id,
        })
    }
}

/// Reads all rows of a shard task file.
pub fn read_function_records(path: &Path) -> Result<Vec<FunctionRecord>> {
    let mut file = ReaderBuilder::new().from_path(path)?;
    let trailing = TrailingColumns::from_headers(file.headers()?);
    let mut records = Vec::new();
    for rec in file.records() {
        records.push(FunctionRecord::from_record(&rec?, trailing)?);
    }
    Ok(records)
}
