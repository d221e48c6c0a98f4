//! Generation of all traces of one shard.
use std::fs::create_dir_all;
use std::path::Path;

use indexmap::IndexMap;
use log::{debug, info, warn};
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64;

use crate::apps::{AppTable, AuditIndex};
use crate::azure::{read_function_records, FunctionRecord};
use crate::config::{Config, TraceMode};
use crate::error::{Result, TraceGenError};
use crate::stats::ShardStats;
use crate::stitcher::{arrange_days, stitch};
use crate::trace::{assemble, make_grid, write_function_trace, FunctionTrace, Provisioning, MINUTE_MS};

/// Trace synthesized for one generation unit.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedTrace {
    /// File stem of the trace, also used as its identifier in the audit index.
    pub name: String,
    /// Application of the first observed day, if any day was observed.
    pub app: Option<String>,
    pub trace: FunctionTrace,
    pub contributing_days: Vec<usize>,
    pub fit_failures: usize,
    pub missing_days: usize,
}

/// Builds a trace of `duration_ms` on a one-minute grid from per-day observations.
///
/// Fails with `SchemaMismatch` unless `days` covers exactly the grid.
pub fn build_trace(
    name: &str,
    duration_ms: u64,
    days: &[Option<&FunctionRecord>],
    apps: &AppTable,
    provisioning: Provisioning,
    rng: &mut dyn RngCore,
) -> Result<GeneratedTrace> {
    let grid = make_grid(duration_ms, MINUTE_MS)?;
    let stitched = stitch(days, apps, rng)?;
    let trace = assemble(name, &grid, &stitched.columns, provisioning)?;
    Ok(GeneratedTrace {
        name: name.to_string(),
        app: days.iter().flatten().next().map(|r| r.app.clone()),
        trace,
        contributing_days: stitched.contributing_days,
        fit_failures: stitched.fit_failures,
        missing_days: stitched.missing_days,
    })
}

/// Groups rows by function, keeping the order in which functions first appear.
pub fn group_by_function(records: &[FunctionRecord]) -> IndexMap<&str, Vec<&FunctionRecord>> {
    let mut groups: IndexMap<&str, Vec<&FunctionRecord>> = IndexMap::new();
    for record in records {
        groups.entry(record.function.as_str()).or_default().push(record);
    }
    groups
}

/// Splits rows into generation units: (trace name, per-day observations).
pub fn generation_units<'a>(
    records: &'a [FunctionRecord],
    mode: TraceMode,
    days: usize,
) -> Vec<(String, Vec<Option<&'a FunctionRecord>>)> {
    match mode {
        TraceMode::Daily => records
            .iter()
            .map(|r| (format!("{}({})", r.function, r.id), vec![Some(r)]))
            .collect(),
        TraceMode::Continuous => group_by_function(records)
            .into_values()
            .map(|rows| (rows[0].id.clone(), arrange_days(rows, days)))
            .collect(),
    }
}

/// Generates traces for every unit of `records` and records contributing applications in `index`.
///
/// Traces are passed to `sink` as they are produced. Units with a schema mismatch are skipped, as are daily units
/// whose lognormal fit failed; any other error aborts the generation. Applications are expected to be checked
/// by the caller, an unknown one aborts at the first unit that needs it.
pub fn generate_traces<S>(
    records: &[FunctionRecord],
    apps: &AppTable,
    config: &Config,
    rng: &mut dyn RngCore,
    index: &mut AuditIndex,
    mut sink: S,
) -> Result<ShardStats>
where
    S: FnMut(&GeneratedTrace) -> Result<()>,
{
    let mut stats = ShardStats::default();
    let duration_ms = config.duration_ms();
    for (name, days) in generation_units(records, config.mode, config.days) {
        stats.functions += 1;
        let generated = match build_trace(&name, duration_ms, &days, apps, config.provisioning, rng) {
            Ok(generated) => generated,
            Err(e @ TraceGenError::SchemaMismatch { .. }) => {
                warn!("skipping {}: {}", name, e);
                stats.schema_mismatches += 1;
                continue;
            }
            Err(e) => return Err(e),
        };
        stats.fit_failures += generated.fit_failures as u64;
        if generated.fit_failures > 0 && !config.mode.keeps_fallback_days() {
            warn!("skipping {}: lognormal fit failed", name);
            continue;
        }
        stats.missing_days += generated.missing_days as u64;
        sink(&generated)?;
        stats.written += 1;
        if !generated.contributing_days.is_empty() {
            if let Some(app) = &generated.app {
                index.add(app, &generated.name);
            }
        }
        debug!("{}: days {:?}", generated.name, generated.contributing_days);
    }
    Ok(stats)
}

/// Generates all traces of one shard task file and writes the shard's audit index.
///
/// Fails without writing anything if some application of the task has no function count.
pub fn generate_shard(shard: usize, task: &Path, apps: &AppTable, config: &Config) -> Result<ShardStats> {
    info!("shard {}: reading {}", shard, task.display());
    let records = read_function_records(task)?;
    apps.check_apps(records.iter().map(|r| r.app.as_str()))?;
    create_dir_all(&config.output_dir)?;
    create_dir_all(&config.index_dir)?;
    let mut rng = Pcg64::seed_from_u64(config.random_seed.wrapping_add(shard as u64));
    let mut index = AuditIndex::new(apps);
    let stats = generate_traces(&records, apps, config, &mut rng, &mut index, |generated| {
        write_function_trace(
            &config.output_dir.join(format!("{}.csv", generated.name)),
            &generated.trace,
        )
    })?;
    index.write(&config.index_path(shard))?;
    info!(
        "shard {}: {} of {} traces written, {} fit fallbacks, {} schema mismatches",
        shard, stats.written, stats.functions, stats.fit_failures, stats.schema_mismatches
    );
    Ok(stats)
}
