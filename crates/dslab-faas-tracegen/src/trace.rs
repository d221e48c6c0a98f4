//! Per-function traces in the OpenDC serverless format: timestamp grid, column assembly and CSV I/O.
use std::path::Path;

use csv::{ReaderBuilder, Writer};
use itertools::izip;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TraceGenError};

pub const MINUTE_MS: u64 = 60_000;
pub const MINUTES_PER_DAY: usize = 1440;
pub const DAY_MS: u64 = MINUTE_MS * MINUTES_PER_DAY as u64;

/// Output header expected by the simulator's trace parser. Three labels carry a leading space.
pub const HEADER: [&str; 7] = [
    "Timestamp [ms]",
    "Invocations",
    " Avg Exec time per Invocation",
    "Provisioned CPU [Mhz]",
    "Provisioned Memory [mb]",
    " Avg cpu usage per Invocation [Mhz]",
    " Avg mem usage per Invocation [mb]",
];

/// One row of a function trace.
#[derive(Default, Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionSample {
    #[serde(rename = "Timestamp [ms]")]
    pub time: u64,
    #[serde(rename = "Invocations")]
    pub invocations: u64,
    #[serde(rename = " Avg Exec time per Invocation")]
    pub exec: u64,
    #[serde(rename = "Provisioned CPU [Mhz]")]
    pub cpu_provisioned: u64,
    #[serde(rename = "Provisioned Memory [mb]")]
    pub mem_provisioned: u64,
    #[serde(rename = " Avg cpu usage per Invocation [Mhz]")]
    pub cpu_used: f64,
    #[serde(rename = " Avg mem usage per Invocation [mb]")]
    pub mem_used: f64,
}

pub type FunctionTrace = Vec<FunctionSample>;

/// Static resource allocation written into every row.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Provisioning {
    /// CPU in MHz.
    pub cpu: u64,
    /// Memory in MB.
    pub memory: u64,
}

impl Default for Provisioning {
    fn default() -> Self {
        Self { cpu: 100, memory: 256 }
    }
}

/// Sampled per-minute columns of a trace.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TraceColumns {
    pub invocations: Vec<f64>,
    pub exec_times: Vec<f64>,
    pub memories: Vec<f64>,
}

impl TraceColumns {
    /// All-zero columns of the given length.
    pub fn zeros(len: usize) -> Self {
        Self {
            invocations: vec![0.; len],
            exec_times: vec![0.; len],
            memories: vec![0.; len],
        }
    }
}

/// Returns `ceil(duration_ms / interval_ms)` timestamps `interval_ms, 2 * interval_ms, ...`.
pub fn make_grid(duration_ms: u64, interval_ms: u64) -> Result<Vec<u64>> {
    if interval_ms == 0 {
        return Err(TraceGenError::InvalidConfig("trace interval must be positive".to_string()));
    }
    let rows = duration_ms.div_ceil(interval_ms);
    Ok((1..=rows).map(|i| i * interval_ms).collect())
}

/// Zips the grid with sampled columns and broadcasts provisioning constants to every row.
///
/// Sampled values are truncated to integers; memory stays a float column but carries whole megabytes.
pub fn assemble(
    function: &str,
    grid: &[u64],
    columns: &TraceColumns,
    provisioning: Provisioning,
) -> Result<FunctionTrace> {
    for (column, len) in [
        ("invocations", columns.invocations.len()),
        ("exec_times", columns.exec_times.len()),
        ("memories", columns.memories.len()),
    ] {
        if len != grid.len() {
            return Err(TraceGenError::SchemaMismatch {
                function: function.to_string(),
                column,
                expected: grid.len(),
                actual: len,
            });
        }
    }
    Ok(izip!(
        grid.iter(),
        columns.invocations.iter(),
        columns.exec_times.iter(),
        columns.memories.iter()
    )
    .map(|(time, invocations, exec, mem)| FunctionSample {
        time: *time,
        invocations: *invocations as u64,
        exec: *exec as u64,
        cpu_provisioned: provisioning.cpu,
        mem_provisioned: provisioning.memory,
        cpu_used: 0.,
        mem_used: mem.trunc(),
    })
    .collect())
}

pub fn write_function_trace(path: &Path, trace: &[FunctionSample]) -> Result<()> {
    let mut writer = Writer::from_path(path)?;
    if trace.is_empty() {
        writer.write_record(HEADER)?;
    }
    for sample in trace {
        writer.serialize(sample)?;
    }
    writer.flush()?;
    Ok(())
}

/// Parses a trace written by [`write_function_trace`], checking the header verbatim.
pub fn read_function_trace(path: &Path) -> Result<FunctionTrace> {
    let mut file = ReaderBuilder::new().from_path(path)?;
    let headers = file.headers()?.clone();
    if headers.iter().ne(HEADER.iter().copied()) {
        return Err(TraceGenError::MalformedRow {
            line: 1,
            reason: format!("unexpected trace header {:?}", headers),
        });
    }
    let mut trace = Vec::new();
    for rec in file.deserialize() {
        let sample: FunctionSample = rec?;
        trace.push(sample);
    }
    Ok(trace)
}

/// Time in seconds when the last invocation in the trace finishes.
pub fn simulation_end(trace: &[FunctionSample]) -> Option<f64> {
    let mut end = None;
    for sample in trace.iter() {
        let t = ((sample.time + sample.exec) as f64) / 1000.;
        if sample.invocations > 0 && end.map_or(true, |e| e < t) {
            end = Some(t);
        }
    }
    end
}
