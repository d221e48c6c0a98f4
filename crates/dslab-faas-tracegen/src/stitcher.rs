//! Synthesis of per-day columns and their stitching into multi-day traces.
use std::ops::Range;

use log::{debug, warn};
use rand::RngCore;

use crate::apps::AppTable;
use crate::azure::FunctionRecord;
use crate::ecdf::Ecdf;
use crate::error::{FitError, Result, TraceGenError};
use crate::estimator::{estimate, FittedLognormal};
use crate::sampler::ColumnGenerator;
use crate::trace::{TraceColumns, MINUTES_PER_DAY};

/// Columns synthesized for one observed day.
#[derive(Clone, Debug, PartialEq)]
pub struct DayColumns {
    pub invocations: Vec<f64>,
    pub exec_times: Vec<f64>,
    pub memories: Vec<f64>,
    /// Set when the lognormal fits failed and constant averages were used instead.
    pub fallback: Option<FitError>,
}

/// Result of stitching the observed days of one function.
#[derive(Clone, Debug, PartialEq)]
pub struct StitchedColumns {
    pub columns: TraceColumns,
    /// 1-based numbers of the days that contributed data, in increasing order.
    pub contributing_days: Vec<usize>,
    pub fit_failures: usize,
    pub missing_days: usize,
}

/// Per-minute invocation counts: timer functions keep the observed vector, others are resampled from its ECDF.
fn invocation_generator(record: &FunctionRecord) -> ColumnGenerator {
    let samples = record.invocation_samples();
    if record.trigger.is_timer() {
        return ColumnGenerator::Literal(samples);
    }
    match Ecdf::new(&samples) {
        Some(ecdf) => ColumnGenerator::empirical(ecdf),
        None => ColumnGenerator::Constant(0.),
    }
}

fn fit_both(record: &FunctionRecord) -> std::result::Result<(FittedLognormal, FittedLognormal), FitError> {
    let exec = estimate(&record.duration.summary().offset())?;
    let mem = estimate(&record.memory.summary().offset())?;
    Ok((exec, mem))
}

/// Synthesizes 1440 rows for one observed day.
///
/// Execution times and memory are drawn from lognormals fitted to the offset statistics. If either fit fails,
/// execution times fall back to the raw reported median and memory to the raw reported average. Memory is
/// reported per application and is divided by the application's function count.
pub fn synthesize_day(record: &FunctionRecord, function_count: u64, rng: &mut dyn RngCore) -> DayColumns {
    let invocations = invocation_generator(record).generate(MINUTES_PER_DAY, rng);
    let share = function_count as f64;
    let generators = fit_both(record)
        .and_then(|(exec, mem)| Ok((ColumnGenerator::lognormal(&exec)?, ColumnGenerator::lognormal(&mem)?)));
    match generators {
        Ok((exec, mem)) => DayColumns {
            invocations,
            exec_times: exec.generate(MINUTES_PER_DAY, rng),
            memories: mem.generate(MINUTES_PER_DAY, rng).iter().map(|m| m / share).collect(),
            fallback: None,
        },
        Err(e) => {
            warn!(
                "function {} day {}: lognormal fit failed ({}), using reported constants",
                record.id, record.day, e
            );
            DayColumns {
                invocations,
                exec_times: ColumnGenerator::Constant(record.duration.median()).generate(MINUTES_PER_DAY, rng),
                memories: ColumnGenerator::Constant(record.memory.average / share).generate(MINUTES_PER_DAY, rng),
                fallback: Some(e),
            }
        }
    }
}

fn day_range(day: usize) -> Range<usize> {
    day * MINUTES_PER_DAY..(day + 1) * MINUTES_PER_DAY
}

fn copy_day(function: &str, column: &'static str, dst: &mut [f64], src: &[f64]) -> Result<()> {
    if dst.len() != src.len() {
        return Err(TraceGenError::SchemaMismatch {
            function: function.to_string(),
            column,
            expected: dst.len(),
            actual: src.len(),
        });
    }
    dst.copy_from_slice(src);
    Ok(())
}

/// Picks the observation of each day `1..=days` from the records of one function.
///
/// If a day has several rows only the first one is used; rows outside the range are ignored.
pub fn arrange_days<'a>(
    records: impl IntoIterator<Item = &'a FunctionRecord>,
    days: usize,
) -> Vec<Option<&'a FunctionRecord>> {
    let mut arranged = vec![None; days];
    for record in records {
        match arranged.get_mut(record.day.wrapping_sub(1)) {
            Some(slot) if slot.is_none() => *slot = Some(record),
            Some(_) => debug!("function {}: duplicate row for day {}", record.id, record.day),
            None => debug!("function {}: day {} is outside of the trace", record.id, record.day),
        }
    }
    arranged
}

/// Builds `days.len() * 1440` rows where day `d` occupies rows `[d * 1440, (d + 1) * 1440)`.
///
/// Days without an observation stay all-zero. Fails with `MissingLookup` if an application has no function count
/// and with `SchemaMismatch` if an observed day does not yield exactly 1440 values.
pub fn stitch(
    days: &[Option<&FunctionRecord>],
    apps: &AppTable,
    rng: &mut dyn RngCore,
) -> Result<StitchedColumns> {
    let mut columns = TraceColumns::zeros(days.len() * MINUTES_PER_DAY);
    let mut contributing_days = Vec::new();
    let mut fit_failures = 0;
    let mut missing_days = 0;
    for (day, record) in days.iter().enumerate() {
        let Some(record) = record else {
            missing_days += 1;
            continue;
        };
        let function_count = apps.function_count(&record.app)?;
        let synthesized = synthesize_day(record, function_count, rng);
        if synthesized.fallback.is_some() {
            fit_failures += 1;
        }
        let range = day_range(day);
        copy_day(
            &record.id,
            "invocations",
            &mut columns.invocations[range.clone()],
            &synthesized.invocations,
        )?;
        copy_day(
            &record.id,
            "exec_times",
            &mut columns.exec_times[range.clone()],
            &synthesized.exec_times,
        )?;
        copy_day(&record.id, "memories", &mut columns.memories[range], &synthesized.memories)?;
        contributing_days.push(day + 1);
    }
    Ok(StitchedColumns {
        columns,
        contributing_days,
        fit_failures,
        missing_days,
    })
}
